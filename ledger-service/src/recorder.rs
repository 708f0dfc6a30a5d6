use ledger_client::{
    db::LedgerStore,
    domain::{usage::validate_kwh, Period, Unit, UnitId},
    LedgerError,
};
use rust_decimal::Decimal;

/// Extra kWh recorded above a unit's threshold by the over-usage demo.
pub const OVER_USAGE_MARGIN_KWH: Decimal = Decimal::ONE_HUNDRED;

/// Pure validation of one usage fact.
///
/// Rules:
/// - month must be in 1..=12 (year is not constrained).
/// - kWh must be non-negative.
pub fn validate_usage(year: i32, month: u32, kwh: Decimal) -> Result<Period, LedgerError> {
    let period = Period::new(year, month)?;
    validate_kwh(kwh)?;
    Ok(period)
}

/// The one write path for usage facts, shared by CSV import and direct entry.
pub struct UsageRecorder<'a, S: ?Sized> {
    store: &'a S,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverUsage {
    pub unit: Unit,
    pub kwh: Decimal,
}

impl<'a, S> UsageRecorder<'a, S>
where
    S: LedgerStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        unit_id: UnitId,
        year: i32,
        month: u32,
        kwh: Decimal,
    ) -> Result<Period, LedgerError> {
        let period = match validate_usage(year, month, kwh) {
            Ok(p) => p,
            Err(e) => {
                metrics::counter!("ledger_usage_rejected_total").increment(1);
                return Err(e);
            }
        };

        self.store.record_usage(unit_id, period, kwh).await?;
        tracing::debug!(unit_id, %period, %kwh, "usage recorded");
        Ok(period)
    }

    /// Push the first unit (by id) that has a threshold over it for
    /// `period`, recording `threshold + 100` kWh. `None` when no unit has a
    /// threshold configured.
    pub async fn simulate_over_usage(&self, period: Period) -> Result<Option<OverUsage>, LedgerError> {
        let units = self.store.units().await?;
        let Some((unit, threshold)) = units
            .into_iter()
            .find_map(|u| u.threshold_kwh.map(|t| (u, t)))
        else {
            return Ok(None);
        };

        let kwh = threshold
            .checked_add(OVER_USAGE_MARGIN_KWH)
            .ok_or_else(|| LedgerError::InvalidArgument(format!("threshold {threshold} too large")))?;
        self.record(unit.id, period.year(), period.month(), kwh).await?;

        tracing::info!(unit_id = unit.id, unit_number = %unit.unit_number, %period, %kwh, "simulated over-usage");
        Ok(Some(OverUsage { unit, kwh }))
    }
}
