use rust_decimal::Decimal;

use super::{money, Period, UnitId};
use crate::error::Result;

/// A unit-period line item. `cost` is computed once, from the rate in
/// effect when the item is built.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BillLineItem {
    pub unit_id: UnitId,
    pub period: Period,
    pub kwh: Decimal,
    pub rate: Decimal,
    pub cost: Decimal,
}

impl BillLineItem {
    pub fn new(unit_id: UnitId, period: Period, kwh: Decimal, rate: Decimal) -> Result<Self> {
        let cost = money::cost_of(kwh, rate)?;
        Ok(Self {
            unit_id,
            period,
            kwh,
            rate,
            cost,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AlertRecord {
    pub unit_id: UnitId,
    pub period: Period,
    pub kwh: Decimal,
    pub threshold: Decimal,
}

/// The alert rule: a positive threshold strictly exceeded. Absent usage
/// counts as zero; an absent or zero threshold never alerts.
pub fn exceeds_threshold(kwh: Option<Decimal>, threshold: Option<Decimal>) -> bool {
    let kwh = kwh.unwrap_or(Decimal::ZERO);
    let threshold = threshold.unwrap_or(Decimal::ZERO);
    threshold > Decimal::ZERO && kwh > threshold
}
