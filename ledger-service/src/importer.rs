//! Bulk import of buildings, units and usage from delimited text.

use std::{fmt, path::Path, str::FromStr};

use ledger_client::db::LedgerStore;

use crate::{
    pipeline::{ImportFailure, Pipeline},
    sinks::{BuildingSink, UnitSink, UsageSink},
    sources::{BuildingRow, CsvSource, UnitRow, UsageRow},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Buildings,
    Units,
    Usage,
}

impl ImportKind {
    /// Dependency order: units resolve buildings by name, usage refers to unit ids.
    pub const ALL: [ImportKind; 3] = [ImportKind::Buildings, ImportKind::Units, ImportKind::Usage];

    pub fn as_str(self) -> &'static str {
        match self {
            ImportKind::Buildings => "buildings",
            ImportKind::Units => "units",
            ImportKind::Usage => "usage",
        }
    }

    /// File looked up in a data directory.
    pub fn file_name(self) -> &'static str {
        match self {
            ImportKind::Buildings => "Buildings.csv",
            ImportKind::Units => "Units.csv",
            ImportKind::Usage => "Usage.csv",
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buildings" => Ok(ImportKind::Buildings),
            "units" => Ok(ImportKind::Units),
            "usage" => Ok(ImportKind::Usage),
            other => Err(format!("unknown import kind '{other}' (expected buildings, units or usage)")),
        }
    }
}

pub struct Importer<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> Importer<'a, S>
where
    S: LedgerStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// `Name,Rate`; existing buildings get their rate updated.
    pub async fn buildings(&self, source: CsvSource<BuildingRow>) -> Result<usize, ImportFailure> {
        let pipeline: Pipeline<_, BuildingRow, _> =
            Pipeline::new("buildings", source, BuildingSink::new(self.store));
        pipeline.run().await
    }

    /// `BuildingName,UnitNumber[,Threshold]`.
    pub async fn units(&self, source: CsvSource<UnitRow>) -> Result<usize, ImportFailure> {
        let pipeline: Pipeline<_, UnitRow, _> = Pipeline::new("units", source, UnitSink::new(self.store));
        pipeline.run().await
    }

    /// `UnitId,Year,Month,Kwh`; later rows for the same (unit, period) win.
    pub async fn usage(&self, source: CsvSource<UsageRow>) -> Result<usize, ImportFailure> {
        let pipeline: Pipeline<_, UsageRow, _> = Pipeline::new("usage", source, UsageSink::new(self.store));
        pipeline.run().await
    }

    pub async fn import_file(&self, kind: ImportKind, path: &Path) -> Result<usize, ImportFailure> {
        tracing::info!(%kind, path = %path.display(), "importing");
        match kind {
            ImportKind::Buildings => self.buildings(CsvSource::from_path(path)).await,
            ImportKind::Units => self.units(CsvSource::from_path(path)).await,
            ImportKind::Usage => self.usage(CsvSource::from_path(path)).await,
        }
    }

    /// Import whichever of `Buildings.csv`, `Units.csv` and `Usage.csv`
    /// exist in `dir`, in that order. A failed file is logged and the next
    /// one is still attempted.
    pub async fn import_directory(&self, dir: &Path) -> Vec<(ImportKind, Result<usize, ImportFailure>)> {
        let mut outcomes = Vec::new();
        for kind in ImportKind::ALL {
            let path = dir.join(kind.file_name());
            if !path.is_file() {
                tracing::debug!(%kind, path = %path.display(), "no import file, skipping");
                continue;
            }

            let outcome = self.import_file(kind, &path).await;
            if let Err(failure) = &outcome {
                tracing::warn!(%kind, path = %path.display(), error = %failure, "startup import failed, continuing");
            }
            outcomes.push((kind, outcome));
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ImportError;
    use ledger_client::{db::MemoryLedgerStore, domain::Period, LedgerError};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn reimporting_buildings_updates_rates_in_place() {
        let store = MemoryLedgerStore::new();
        let importer = Importer::new(&store);

        let first = importer
            .buildings(CsvSource::from_text("Name,Rate\nOak Hall,0.15\nElm Court,0.12\n"))
            .await
            .unwrap();
        let second = importer
            .buildings(CsvSource::from_text("Name,Rate\nOak Hall,0.18\nElm Court,0.12\n"))
            .await
            .unwrap();

        assert_eq!((first, second), (2, 2));
        let buildings = store.buildings().await.unwrap();
        assert_eq!(buildings.len(), 2);
        assert_eq!(buildings[0].name, "Oak Hall");
        assert_eq!(buildings[0].rate_per_kwh, dec!(0.18));
    }

    #[tokio::test]
    async fn unknown_building_fails_units_import_after_earlier_rows() {
        let store = MemoryLedgerStore::new();
        let importer = Importer::new(&store);
        importer
            .buildings(CsvSource::from_text("Name,Rate\nOak Hall,0.15\n"))
            .await
            .unwrap();

        let failure = importer
            .units(CsvSource::from_text(
                "BuildingName,UnitNumber,Threshold\nOak Hall,101,400\nNowhere,201,\nOak Hall,102,\n",
            ))
            .await
            .unwrap_err();

        assert_eq!(failure.processed, 1);
        assert!(matches!(
            failure.cause,
            ImportError::Ledger {
                line: 3,
                source: LedgerError::NotFound(_)
            }
        ));

        let units = store.units().await.unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].unit_number, "101");
    }

    #[tokio::test]
    async fn wrong_column_count_names_the_line() {
        let store = MemoryLedgerStore::new();
        let importer = Importer::new(&store);

        let failure = importer
            .buildings(CsvSource::from_text("Name,Rate\nOak Hall,0.15\nElm Court\n"))
            .await
            .unwrap_err();

        assert_eq!(failure.processed, 1);
        assert!(matches!(failure.cause, ImportError::Row { line: 3, .. }));
    }

    #[tokio::test]
    async fn underscored_rate_fails_the_import() {
        let store = MemoryLedgerStore::new();
        let importer = Importer::new(&store);

        let failure = importer
            .buildings(CsvSource::from_text("Name,Rate\nOak Hall,1_000.5\n"))
            .await
            .unwrap_err();

        assert_eq!(failure.processed, 0);
        assert!(matches!(failure.cause, ImportError::Row { line: 2, .. }));
        assert!(store.buildings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn usage_import_overwrites_and_validates() {
        let store = MemoryLedgerStore::new();
        let building = store.upsert_building("Oak Hall", dec!(0.15)).await.unwrap();
        let unit = store.upsert_unit(building, "101", None).await.unwrap();
        let importer = Importer::new(&store);

        let csv = format!("UnitId,Year,Month,Kwh\n{unit},2025,10,400\n{unit},2025,10,500\n{unit},2025,0,1\n");
        let failure = importer.usage(CsvSource::from_text(csv)).await.unwrap_err();

        assert_eq!(failure.processed, 2);
        assert!(matches!(
            failure.cause,
            ImportError::Ledger {
                source: LedgerError::InvalidArgument(_),
                ..
            }
        ));
        let oct = Period::new(2025, 10).unwrap();
        assert_eq!(store.usage_kwh(unit, oct).await.unwrap(), Some(dec!(500)));
    }

    #[tokio::test]
    async fn directory_import_runs_in_order_and_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Buildings.csv"), "Name,Rate\nOak Hall,0.15\n").unwrap();
        std::fs::write(
            dir.path().join("Units.csv"),
            "BuildingName,UnitNumber,Threshold\nOak Hall,101,400\nOak Hall,102\n",
        )
        .unwrap();

        let store = MemoryLedgerStore::new();
        let outcomes = Importer::new(&store).import_directory(dir.path()).await;

        let kinds: Vec<_> = outcomes.iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, vec![ImportKind::Buildings, ImportKind::Units]);
        assert!(outcomes.iter().all(|(_, r)| r.is_ok()));
        assert_eq!(store.units().await.unwrap().len(), 2);
    }

    #[test]
    fn import_kind_parses_case_insensitively() {
        assert_eq!("Units".parse::<ImportKind>(), Ok(ImportKind::Units));
        assert!("meters".parse::<ImportKind>().is_err());
    }
}
