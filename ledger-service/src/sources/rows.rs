//! Row shapes of the three import files.
//!
//! - Buildings: `Name,Rate`
//! - Units: `BuildingName,UnitNumber[,Threshold]`
//! - Usage: `UnitId,Year,Month,Kwh`

use std::{fmt::Display, ops::RangeInclusive, str::FromStr};

use csv::StringRecord;
use rust_decimal::Decimal;

use super::CsvRow;

#[derive(Debug, Clone, PartialEq)]
pub struct BuildingRow {
    pub name: String,
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitRow {
    pub building_name: String,
    pub unit_number: String,
    pub threshold: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageRow {
    pub unit_id: i64,
    pub year: i32,
    pub month: u32,
    pub kwh: Decimal,
}

fn field<'r>(record: &'r StringRecord, idx: usize, name: &str) -> Result<&'r str, String> {
    record
        .get(idx)
        .ok_or_else(|| format!("missing column '{name}'"))
}

/// Locale-invariant decimal: optional sign, digits and one `.`; no grouping.
fn parse_decimal(name: &str, raw: &str) -> Result<Decimal, String> {
    if let Some(c) = raw.chars().find(|c| !matches!(c, '0'..='9' | '+' | '-' | '.')) {
        return Err(format!("invalid {name} '{raw}': unexpected character '{c}'"));
    }
    Decimal::from_str(raw).map_err(|e| format!("invalid {name} '{raw}': {e}"))
}

fn parse_number<N>(name: &str, raw: &str) -> Result<N, String>
where
    N: FromStr,
    N::Err: Display,
{
    raw.parse().map_err(|e| format!("invalid {name} '{raw}': {e}"))
}

fn parse_optional_decimal(name: &str, raw: Option<&str>) -> Result<Option<Decimal>, String> {
    match raw {
        Some(s) if !s.is_empty() => parse_decimal(name, s).map(Some),
        _ => Ok(None),
    }
}

impl CsvRow for BuildingRow {
    const COLUMNS: RangeInclusive<usize> = 2..=2;

    fn from_record(record: &StringRecord) -> Result<Self, String> {
        Ok(Self {
            name: field(record, 0, "Name")?.to_string(),
            rate: parse_decimal("Rate", field(record, 1, "Rate")?)?,
        })
    }
}

impl CsvRow for UnitRow {
    const COLUMNS: RangeInclusive<usize> = 2..=3;

    fn from_record(record: &StringRecord) -> Result<Self, String> {
        Ok(Self {
            building_name: field(record, 0, "BuildingName")?.to_string(),
            unit_number: field(record, 1, "UnitNumber")?.to_string(),
            threshold: parse_optional_decimal("Threshold", record.get(2))?,
        })
    }
}

impl CsvRow for UsageRow {
    const COLUMNS: RangeInclusive<usize> = 4..=4;

    fn from_record(record: &StringRecord) -> Result<Self, String> {
        Ok(Self {
            unit_id: parse_number("UnitId", field(record, 0, "UnitId")?)?,
            year: parse_number("Year", field(record, 1, "Year")?)?,
            month: parse_number("Month", field(record, 2, "Month")?)?,
            kwh: parse_decimal("Kwh", field(record, 3, "Kwh")?)?,
        })
    }
}
