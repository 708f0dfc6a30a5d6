use ledger_client::{
    db::{require_building, require_unit, LedgerStore},
    domain::{BillLineItem, Period, UnitId},
    LedgerError,
};
use rust_decimal::Decimal;

/// Line items priced at the building's *current* rate: changing a rate
/// reprices every past period too.
pub struct BillingCalculator<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> BillingCalculator<'a, S>
where
    S: LedgerStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn bill_for_month(&self, unit_id: UnitId, period: Period) -> Result<BillLineItem, LedgerError> {
        let unit = require_unit(self.store, unit_id).await?;
        let building = require_building(self.store, unit.building_id).await?;
        let kwh = self
            .store
            .usage_kwh(unit_id, period)
            .await?
            .unwrap_or(Decimal::ZERO);

        BillLineItem::new(unit_id, period, kwh, building.rate_per_kwh)
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
    async fn bill_is_usage_times_rate() {
        let store = MemoryLedgerStore::new();
        let oak = store.upsert_building("Oak Hall", dec!(0.15)).await.unwrap();
        let unit = store.upsert_unit(oak, "101", Some(dec!(400))).await.unwrap();
        store.record_usage(unit, oct_2025(), dec!(500)).await.unwrap();

        let item = BillingCalculator::new(&store).bill_for_month(unit, oct_2025()).await.unwrap();

        assert_eq!(item.unit_id, unit);
        assert_eq!(item.kwh, dec!(500));
        assert_eq!(item.rate, dec!(0.15));
        assert_eq!(item.cost.to_string(), "75.00");
    }

    #[tokio::test]
    async fn missing_usage_bills_zero() {
        let store = MemoryLedgerStore::new();
        let oak = store.upsert_building("Oak Hall", dec!(0.15)).await.unwrap();
        let unit = store.upsert_unit(oak, "102", None).await.unwrap();

        let item = BillingCalculator::new(&store).bill_for_month(unit, oct_2025()).await.unwrap();

        assert_eq!(item.kwh, Decimal::ZERO);
        assert_eq!(item.cost, dec!(0.00));
    }

    #[tokio::test]
    async fn rate_changes_reprice_past_periods() {
        let store = MemoryLedgerStore::new();
        let oak = store.upsert_building("Oak Hall", dec!(0.15)).await.unwrap();
        let unit = store.upsert_unit(oak, "101", None).await.unwrap();
        store.record_usage(unit, oct_2025(), dec!(500)).await.unwrap();

        store.upsert_building("Oak Hall", dec!(0.20)).await.unwrap();
        let item = BillingCalculator::new(&store).bill_for_month(unit, oct_2025()).await.unwrap();

        assert_eq!(item.cost, dec!(100.00));
    }

    #[tokio::test]
    async fn unknown_unit_is_not_found() {
        let store = MemoryLedgerStore::new();
        let res = BillingCalculator::new(&store).bill_for_month(7, oct_2025()).await;
        assert!(matches!(res, Err(LedgerError::NotFound(_))));
    }
}
