use ledger_client::{
    db::{require_building, LedgerStore},
    domain::{money, Building, BuildingId, Period},
    LedgerError,
};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingTotals {
    pub total_kwh: Decimal,
    pub total_cost: Decimal,
}

/// Building-level rollups. Units without a usage fact for the period count
/// as zero kWh, and cost is priced once on the summed kWh, never per unit.
pub struct AggregationEngine<'a, S: ?Sized> {
    store: &'a S,
}

fn sum_kwh(values: &[Decimal]) -> Result<Decimal, LedgerError> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .ok_or_else(|| LedgerError::InvalidArgument("kWh total overflows".to_string()))
}

impl<'a, S> AggregationEngine<'a, S>
where
    S: LedgerStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The building plus one kWh value per unit, zero-filled.
    async fn zero_filled_usage(
        &self,
        building_id: BuildingId,
        period: Period,
    ) -> Result<(Building, Vec<Decimal>), LedgerError> {
        let building = require_building(self.store, building_id).await?;
        let units = self.store.units_for_building(building_id).await?;

        let mut kwh = Vec::with_capacity(units.len());
        for unit in &units {
            let value = self.store.usage_kwh(unit.id, period).await?;
            kwh.push(value.unwrap_or(Decimal::ZERO));
        }
        Ok((building, kwh))
    }

    pub async fn building_monthly_totals(
        &self,
        building_id: BuildingId,
        period: Period,
    ) -> Result<BuildingTotals, LedgerError> {
        let (building, kwh) = self.zero_filled_usage(building_id, period).await?;
        let total_kwh = sum_kwh(&kwh)?;
        let total_cost = money::cost_of(total_kwh, building.rate_per_kwh)?;

        Ok(BuildingTotals {
            total_kwh,
            total_cost,
        })
    }

    /// Mean zero-filled kWh per unit, rounded to two places; `0.00` for a
    /// building without units.
    pub async fn average_per_unit_kwh(
        &self,
        building_id: BuildingId,
        period: Period,
    ) -> Result<Decimal, LedgerError> {
        let (_, kwh) = self.zero_filled_usage(building_id, period).await?;
        if kwh.is_empty() {
            return Ok(money::round_money(Decimal::ZERO));
        }

        let total = sum_kwh(&kwh)?;
        let mean = total
            .checked_div(Decimal::from(kwh.len()))
            .ok_or_else(|| LedgerError::InvalidArgument("kWh average overflows".to_string()))?;
        Ok(money::round_money(mean))
    }
}
