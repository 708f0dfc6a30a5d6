//! Sinks that apply imported rows to a [`LedgerStore`].
//!
//! Each row is written on its own; there is no batching and no retry; a
//! failed row stops the pipeline with the rows before it already applied.

use ledger_client::{db::LedgerStore, LedgerError};

use crate::{
    pipeline::{Envelope, ImportError, Sink},
    recorder::UsageRecorder,
    sources::{BuildingRow, UnitRow, UsageRow},
};

fn at_line(line: u64) -> impl FnOnce(LedgerError) -> ImportError {
    move |source| ImportError::Ledger { line, source }
}

pub struct BuildingSink<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: ?Sized> BuildingSink<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl<'a, S> Sink<BuildingRow> for BuildingSink<'a, S>
where
    S: LedgerStore + ?Sized,
{
    async fn write(&self, row: Envelope<BuildingRow>) -> Result<(), ImportError> {
        let Envelope { payload, line } = row;
        let id = self
            .store
            .upsert_building(&payload.name, payload.rate)
            .await
            .map_err(at_line(line))?;
        tracing::debug!(line, building_id = id, name = %payload.name, "building imported");
        Ok(())
    }
}

/// Resolves the building by exact name; units never create buildings.
pub struct UnitSink<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: ?Sized> UnitSink<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl<'a, S> Sink<UnitRow> for UnitSink<'a, S>
where
    S: LedgerStore + ?Sized,
{
    async fn write(&self, row: Envelope<UnitRow>) -> Result<(), ImportError> {
        let Envelope { payload, line } = row;
        let building = self
            .store
            .building_by_name(&payload.building_name)
            .await
            .map_err(at_line(line))?
            .ok_or_else(|| ImportError::Ledger {
                line,
                source: LedgerError::NotFound(format!("building '{}'", payload.building_name)),
            })?;

        let id = self
            .store
            .upsert_unit(building.id, &payload.unit_number, payload.threshold)
            .await
            .map_err(at_line(line))?;
        tracing::debug!(line, unit_id = id, building = %building.name, "unit imported");
        Ok(())
    }
}

/// Goes through [`UsageRecorder`] so imported usage is validated exactly
/// like usage entered directly.
pub struct UsageSink<'a, S: ?Sized> {
    recorder: UsageRecorder<'a, S>,
}

impl<'a, S> UsageSink<'a, S>
where
    S: LedgerStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self {
            recorder: UsageRecorder::new(store),
        }
    }
}

#[async_trait::async_trait]
impl<'a, S> Sink<UsageRow> for UsageSink<'a, S>
where
    S: LedgerStore + ?Sized,
{
    async fn write(&self, row: Envelope<UsageRow>) -> Result<(), ImportError> {
        let Envelope { payload, line } = row;
        self.recorder
            .record(payload.unit_id, payload.year, payload.month, payload.kwh)
            .await
            .map_err(at_line(line))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_client::{db::MemoryLedgerStore, domain::Period};
    use rust_decimal_macros::dec;

    fn env<T>(payload: T, line: u64) -> Envelope<T> {
        Envelope { payload, line }
    }

    #[tokio::test]
    async fn unit_for_unknown_building_is_rejected_with_its_line() {
        let store = MemoryLedgerStore::new();
        let sink = UnitSink::new(&store);

        let err = sink
            .write(env(
                UnitRow {
                    building_name: "Nowhere".to_string(),
                    unit_number: "101".to_string(),
                    threshold: None,
                },
                4,
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ImportError::Ledger {
                line: 4,
                source: LedgerError::NotFound(_)
            }
        ));
        assert!(store.units().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn usage_sink_validates_like_direct_entry() {
        let store = MemoryLedgerStore::new();
        let building = store.upsert_building("Oak Hall", dec!(0.15)).await.unwrap();
        let unit = store.upsert_unit(building, "101", None).await.unwrap();
        let sink = UsageSink::new(&store);

        let bad_month = UsageRow {
            unit_id: unit,
            year: 2025,
            month: 13,
            kwh: dec!(10),
        };
        assert!(matches!(
            sink.write(env(bad_month, 2)).await,
            Err(ImportError::Ledger {
                line: 2,
                source: LedgerError::InvalidArgument(_)
            })
        ));

        let good = UsageRow {
            unit_id: unit,
            year: 2025,
            month: 10,
            kwh: dec!(500),
        };
        sink.write(env(good, 3)).await.unwrap();
        let period = Period::new(2025, 10).unwrap();
        assert_eq!(store.usage_kwh(unit, period).await.unwrap(), Some(dec!(500)));
    }
}
