use ledger_client::{
    db::{require_building, LedgerStore},
    domain::{exceeds_threshold, AlertRecord, BuildingId, Period},
    LedgerError,
};
use rust_decimal::Decimal;

/// Flags units whose usage strictly exceeds a positive threshold. Results
/// come back in ascending unit id order.
pub struct AlertEvaluator<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> AlertEvaluator<'a, S>
where
    S: LedgerStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn check_monthly_thresholds(
        &self,
        building_id: BuildingId,
        period: Period,
    ) -> Result<Vec<AlertRecord>, LedgerError> {
        require_building(self.store, building_id).await?;
        let mut units = self.store.units_for_building(building_id).await?;
        units.sort_by_key(|u| u.id);

        let mut alerts = Vec::new();
        for unit in units {
            let kwh = self.store.usage_kwh(unit.id, period).await?;
            if exceeds_threshold(kwh, unit.threshold_kwh) {
                alerts.push(AlertRecord {
                    unit_id: unit.id,
                    period,
                    kwh: kwh.unwrap_or(Decimal::ZERO),
                    threshold: unit.threshold_kwh.unwrap_or(Decimal::ZERO),
                });
            }
        }

        if !alerts.is_empty() {
            metrics::counter!("ledger_alerts_raised_total").increment(alerts.len() as u64);
            tracing::info!(building_id, %period, alerts = alerts.len(), "usage thresholds exceeded");
        }
        Ok(alerts)
    }

    /// Alerts for every building, buildings in ascending id order.
    pub async fn check_all_buildings(&self, period: Period) -> Result<Vec<AlertRecord>, LedgerError> {
        let mut all = Vec::new();
        for building in self.store.buildings().await? {
            all.extend(self.check_monthly_thresholds(building.id, period).await?);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_client::db::MemoryLedgerStore;
    use rust_decimal_macros::dec;

    fn oct_2025() -> Period {
        Period::new(2025, 10).unwrap()
    }

    #[tokio::test]
    async fn unit_over_threshold_alerts_and_unit_without_usage_does_not() {
        let store = MemoryLedgerStore::new();
        let oak = store.upsert_building("Oak Hall", dec!(0.15)).await.unwrap();
        let u101 = store.upsert_unit(oak, "101", Some(dec!(400))).await.unwrap();
        store.upsert_unit(oak, "102", Some(dec!(400))).await.unwrap();
        store.record_usage(u101, oct_2025(), dec!(500)).await.unwrap();

        let alerts = AlertEvaluator::new(&store)
            .check_monthly_thresholds(oak, oct_2025())
            .await
            .unwrap();

        assert_eq!(
            alerts,
            vec![AlertRecord {
                unit_id: u101,
                period: oct_2025(),
                kwh: dec!(500),
                threshold: dec!(400),
            }]
        );
    }

    #[tokio::test]
    async fn equal_zero_and_absent_thresholds_never_alert() {
        let store = MemoryLedgerStore::new();
        let oak = store.upsert_building("Oak Hall", dec!(0.15)).await.unwrap();
        let equal = store.upsert_unit(oak, "101", Some(dec!(400))).await.unwrap();
        let zero = store.upsert_unit(oak, "102", Some(dec!(0))).await.unwrap();
        let absent = store.upsert_unit(oak, "103", None).await.unwrap();
        store.record_usage(equal, oct_2025(), dec!(400)).await.unwrap();
        store.record_usage(zero, oct_2025(), dec!(900)).await.unwrap();
        store.record_usage(absent, oct_2025(), dec!(900)).await.unwrap();

        let alerts = AlertEvaluator::new(&store)
            .check_monthly_thresholds(oak, oct_2025())
            .await
            .unwrap();

        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn alerts_are_ordered_by_unit_id() {
        let store = MemoryLedgerStore::new();
        let oak = store.upsert_building("Oak Hall", dec!(0.15)).await.unwrap();
        let first = store.upsert_unit(oak, "B-2", Some(dec!(10))).await.unwrap();
        let second = store.upsert_unit(oak, "A-1", Some(dec!(10))).await.unwrap();
        store.record_usage(first, oct_2025(), dec!(11)).await.unwrap();
        store.record_usage(second, oct_2025(), dec!(12)).await.unwrap();

        let ids: Vec<_> = AlertEvaluator::new(&store)
            .check_monthly_thresholds(oak, oct_2025())
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.unit_id)
            .collect();

        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn other_periods_are_ignored() {
        let store = MemoryLedgerStore::new();
        let oak = store.upsert_building("Oak Hall", dec!(0.15)).await.unwrap();
        let unit = store.upsert_unit(oak, "101", Some(dec!(400))).await.unwrap();
        store
            .record_usage(unit, Period::new(2025, 9).unwrap(), dec!(900))
            .await
            .unwrap();

        let alerts = AlertEvaluator::new(&store)
            .check_monthly_thresholds(oak, oct_2025())
            .await
            .unwrap();

        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn all_buildings_are_checked_in_id_order() {
        let store = MemoryLedgerStore::new();
        let oak = store.upsert_building("Oak Hall", dec!(0.15)).await.unwrap();
        let elm = store.upsert_building("Elm Court", dec!(0.12)).await.unwrap();
        let oak_unit = store.upsert_unit(oak, "101", Some(dec!(100))).await.unwrap();
        let elm_unit = store.upsert_unit(elm, "1", Some(dec!(100))).await.unwrap();
        store.record_usage(elm_unit, oct_2025(), dec!(150)).await.unwrap();
        store.record_usage(oak_unit, oct_2025(), dec!(150)).await.unwrap();

        let ids: Vec<_> = AlertEvaluator::new(&store)
            .check_all_buildings(oct_2025())
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.unit_id)
            .collect();

        assert_eq!(ids, vec![oak_unit, elm_unit]);
    }

    #[tokio::test]
    async fn unknown_building_is_not_found() {
        let store = MemoryLedgerStore::new();
        let res = AlertEvaluator::new(&store).check_monthly_thresholds(3, oct_2025()).await;
        assert!(matches!(res, Err(LedgerError::NotFound(_))));
    }
}
