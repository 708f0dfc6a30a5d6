//! Fixed-point rounding for costs and averages.
//!
//! All monetary values round to two places with midpoint-nearest-even
//! (banker's) rounding, the convention of the decimal type the ledger's
//! numbers were first produced with. Stored kWh is never rounded.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{LedgerError, Result};

pub const MONEY_SCALE: u32 = 2;

/// Round to [`MONEY_SCALE`] places and pad to exactly that scale, so
/// `75` renders as `75.00`.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// `round(kwh * rate, 2)`, failing instead of panicking on overflow.
pub fn cost_of(kwh: Decimal, rate: Decimal) -> Result<Decimal> {
    kwh.checked_mul(rate)
        .map(round_money)
        .ok_or_else(|| LedgerError::InvalidArgument(format!("{kwh} kWh x {rate} overflows")))
}
