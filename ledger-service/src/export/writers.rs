use std::io::Write;

use csv::Writer;
use ledger_client::domain::{AlertRecord, Building};

use super::ExportError;
use crate::reports::{ChartRow, UnitDirectoryRow};

pub const ALERTS_HEADER: [&str; 5] = ["UnitId", "Year", "Month", "Kwh", "Threshold"];
pub const BUILDINGS_HEADER: [&str; 3] = ["BuildingId", "Name", "RatePerKwh"];
pub const UNITS_HEADER: [&str; 4] = ["UnitId", "BuildingName", "UnitNumber", "ThresholdKwh"];
pub const CHART_HEADER: [&str; 4] = ["BuildingName", "Year", "Month", "TotalKwh"];

fn write_all<W, R, I>(out: W, header: &[&str], rows: I) -> Result<usize, ExportError>
where
    W: Write,
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut wtr = Writer::from_writer(out);
    wtr.write_record(header)?;
    let mut count = 0usize;
    for row in rows {
        wtr.write_record(row)?;
        count += 1;
    }
    wtr.flush()?;
    Ok(count)
}

pub fn write_alerts<W: Write>(out: W, alerts: &[AlertRecord]) -> Result<usize, ExportError> {
    write_all(
        out,
        &ALERTS_HEADER,
        alerts.iter().map(|a| {
            [
                a.unit_id.to_string(),
                a.period.year().to_string(),
                a.period.month().to_string(),
                a.kwh.to_string(),
                a.threshold.to_string(),
            ]
        }),
    )
}

pub fn write_buildings<W: Write>(out: W, buildings: &[Building]) -> Result<usize, ExportError> {
    write_all(
        out,
        &BUILDINGS_HEADER,
        buildings
            .iter()
            .map(|b| [b.id.to_string(), b.name.clone(), b.rate_per_kwh.to_string()]),
    )
}

pub fn write_units<W: Write>(out: W, units: &[UnitDirectoryRow]) -> Result<usize, ExportError> {
    write_all(
        out,
        &UNITS_HEADER,
        units.iter().map(|u| {
            [
                u.unit_id.to_string(),
                u.building_name.clone(),
                u.unit_number.clone(),
                u.threshold_kwh.to_string(),
            ]
        }),
    )
}

pub fn write_chart<W: Write>(out: W, rows: &[ChartRow]) -> Result<usize, ExportError> {
    write_all(
        out,
        &CHART_HEADER,
        rows.iter().map(|r| {
            [
                r.building_name.clone(),
                r.period.year().to_string(),
                r.period.month().to_string(),
                r.total_kwh.to_string(),
            ]
        }),
    )
}
