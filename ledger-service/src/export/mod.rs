//! Delimited-text exports written into the configured output directory.

pub mod writers;

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use ledger_client::{
    db::LedgerStore,
    domain::{AlertRecord, Period},
    LedgerError,
};

use crate::{alerts::AlertEvaluator, reports::Reports};

pub const BUILDINGS_FILE: &str = "buildings_export.csv";
pub const UNITS_FILE: &str = "units_export.csv";
pub const CHART_FILE: &str = "usage_for_charts.csv";

/// `alerts_2025_10.csv` for October 2025.
pub fn alerts_file_name(period: Period) -> String {
    format!("alerts_{}_{:02}.csv", period.year(), period.month())
}

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// A written export file and how many data rows it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exported {
    pub path: PathBuf,
    pub rows: usize,
}

fn create(dir: &Path, name: &str) -> Result<(PathBuf, BufWriter<File>), ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    let file = File::create(&path)?;
    Ok((path, BufWriter::new(file)))
}

pub struct Exporter<'a, S: ?Sized> {
    store: &'a S,
    out_dir: PathBuf,
}

impl<'a, S> Exporter<'a, S>
where
    S: LedgerStore + ?Sized,
{
    pub fn new(store: &'a S, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            out_dir: out_dir.into(),
        }
    }

    /// Alerts of every building for `period`.
    pub async fn alerts(&self, period: Period) -> Result<Exported, ExportError> {
        let alerts = AlertEvaluator::new(self.store).check_all_buildings(period).await?;
        self.write_alerts(period, &alerts)
    }

    /// Write alerts that were already evaluated for `period`.
    pub fn write_alerts(&self, period: Period, alerts: &[AlertRecord]) -> Result<Exported, ExportError> {
        let (path, out) = create(&self.out_dir, &alerts_file_name(period))?;
        let rows = writers::write_alerts(out, alerts)?;
        Ok(self.done(path, rows))
    }

    pub async fn buildings(&self) -> Result<Exported, ExportError> {
        let buildings = self.store.buildings().await?;
        let (path, out) = create(&self.out_dir, BUILDINGS_FILE)?;
        let rows = writers::write_buildings(out, &buildings)?;
        Ok(self.done(path, rows))
    }

    pub async fn units(&self) -> Result<Exported, ExportError> {
        let units = Reports::new(self.store).unit_directory().await?;
        let (path, out) = create(&self.out_dir, UNITS_FILE)?;
        let rows = writers::write_units(out, &units)?;
        Ok(self.done(path, rows))
    }

    pub async fn chart(&self) -> Result<Exported, ExportError> {
        let chart = Reports::new(self.store).usage_chart().await?;
        let (path, out) = create(&self.out_dir, CHART_FILE)?;
        let rows = writers::write_chart(out, &chart)?;
        Ok(self.done(path, rows))
    }

    fn done(&self, path: PathBuf, rows: usize) -> Exported {
        tracing::info!(path = %path.display(), rows, "export written");
        Exported { path, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_client::db::MemoryLedgerStore;
    use rust_decimal_macros::dec;

    async fn seeded() -> MemoryLedgerStore {
        let store = MemoryLedgerStore::new();
        let oak = store.upsert_building("Oak Hall", dec!(0.15)).await.unwrap();
        let elm = store.upsert_building("Elm Court", dec!(0.12)).await.unwrap();
        let u1 = store.upsert_unit(oak, "101", Some(dec!(400))).await.unwrap();
        store.upsert_unit(oak, "102", None).await.unwrap();
        let u3 = store.upsert_unit(elm, "A", Some(dec!(100))).await.unwrap();

        let oct = Period::new(2025, 10).unwrap();
        store.record_usage(u1, oct, dec!(500)).await.unwrap();
        store.record_usage(u3, oct, dec!(50)).await.unwrap();
        store
            .record_usage(u1, Period::new(2025, 9).unwrap(), dec!(300))
            .await
            .unwrap();
        store
    }

    #[test]
    fn alerts_file_name_pads_the_month() {
        assert_eq!(alerts_file_name(Period::new(2025, 3).unwrap()), "alerts_2025_03.csv");
    }

    #[tokio::test]
    async fn exports_land_in_the_output_directory() {
        let store = seeded().await;
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let exporter = Exporter::new(&store, &out);

        let alerts = exporter.alerts(Period::new(2025, 10).unwrap()).await.unwrap();
        assert_eq!(alerts.path, out.join("alerts_2025_10.csv"));
        assert_eq!(alerts.rows, 1);
        assert_eq!(
            std::fs::read_to_string(&alerts.path).unwrap(),
            "UnitId,Year,Month,Kwh,Threshold\n1,2025,10,500,400\n"
        );

        let units = exporter.units().await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&units.path).unwrap(),
            "UnitId,BuildingName,UnitNumber,ThresholdKwh\n3,Elm Court,A,100\n1,Oak Hall,101,400\n2,Oak Hall,102,0\n"
        );

        let buildings = exporter.buildings().await.unwrap();
        assert_eq!(buildings.rows, 2);

        let chart = exporter.chart().await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&chart.path).unwrap(),
            "BuildingName,Year,Month,TotalKwh\nElm Court,2025,10,50\nOak Hall,2025,9,300\nOak Hall,2025,10,500\n"
        );
    }
}
