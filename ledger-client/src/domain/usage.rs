use std::{fmt, str::FromStr};

use rust_decimal::Decimal;

use super::UnitId;
use crate::error::{LedgerError, Result};

/// A billing month. The month is always in `1..=12`; the year is not
/// constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidArgument(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Parses `YYYY-MM`.
impl FromStr for Period {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || LedgerError::InvalidArgument(format!("invalid period '{s}', expected YYYY-MM"));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Period::new(year, month)
    }
}

/// One (unit, year, month) -> kWh fact.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UsageRecord {
    pub unit_id: UnitId,
    pub period: Period,
    pub kwh: Decimal,
}

pub fn validate_kwh(kwh: Decimal) -> Result<()> {
    if kwh.is_sign_negative() && !kwh.is_zero() {
        return Err(LedgerError::InvalidArgument(format!(
            "kwh must be non-negative, got {kwh}"
        )));
    }
    Ok(())
}

#[cfg(feature = "serde")]
impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
