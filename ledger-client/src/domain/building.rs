use rust_decimal::Decimal;

use super::{BuildingId, UnitId};
use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Building {
    pub id: BuildingId,
    pub name: String,
    pub rate_per_kwh: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Unit {
    pub id: UnitId,
    pub building_id: BuildingId,
    pub unit_number: String,
    /// `None` disables alerting for the unit.
    pub threshold_kwh: Option<Decimal>,
}

/// Rejects blank natural keys (building names, unit numbers).
pub fn validate_key(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::InvalidArgument(format!("{field} must not be blank")));
    }
    Ok(())
}

pub fn validate_non_negative(field: &str, value: Decimal) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(LedgerError::InvalidArgument(format!(
            "{field} must be non-negative, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn blank_keys_are_rejected() {
        assert!(validate_key("name", "Oak Hall").is_ok());
        assert!(matches!(
            validate_key("name", "   "),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn negative_zero_counts_as_non_negative() {
        assert!(validate_non_negative("rate", dec!(0)).is_ok());
        assert!(validate_non_negative("rate", -dec!(0)).is_ok());
        assert!(validate_non_negative("rate", dec!(0.15)).is_ok());
        assert!(validate_non_negative("rate", dec!(-0.01)).is_err());
    }
}
