//! Read models behind the presentation layer: overviews, per-unit listings
//! and the rows the export adapters emit.

use std::collections::{BTreeMap, HashMap};

use ledger_client::{
    db::{require_building, LedgerStore},
    domain::{exceeds_threshold, Building, BuildingId, Period, UnitId},
    LedgerError,
};
use rust_decimal::Decimal;

use crate::aggregation::{AggregationEngine, BuildingTotals};

#[derive(Debug, Clone, PartialEq)]
pub struct BuildingOverview {
    pub building: Building,
    pub unit_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildingSummary {
    pub building: Building,
    pub totals: BuildingTotals,
}

/// One unit's usage for a period. Missing usage and missing thresholds are
/// reported as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitUsageLine {
    pub unit_id: UnitId,
    pub unit_number: String,
    pub kwh: Decimal,
    pub threshold: Decimal,
    pub exceeds: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitDirectoryRow {
    pub unit_id: UnitId,
    pub building_name: String,
    pub unit_number: String,
    pub threshold_kwh: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub building_name: String,
    pub period: Period,
    pub total_kwh: Decimal,
}

/// One bar of the per-building usage view.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingUsage {
    pub building_name: String,
    pub total_kwh: Decimal,
}

pub struct Reports<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> Reports<'a, S>
where
    S: LedgerStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Every building (ascending id) with its unit count.
    pub async fn overview(&self) -> Result<Vec<BuildingOverview>, LedgerError> {
        let mut counts: HashMap<BuildingId, usize> = HashMap::new();
        for unit in self.store.units().await? {
            *counts.entry(unit.building_id).or_default() += 1;
        }

        Ok(self
            .store
            .buildings()
            .await?
            .into_iter()
            .map(|building| BuildingOverview {
                unit_count: counts.get(&building.id).copied().unwrap_or(0),
                building,
            })
            .collect())
    }

    /// Monthly totals for every building, ascending id.
    pub async fn monthly_summary(&self, period: Period) -> Result<Vec<BuildingSummary>, LedgerError> {
        let engine = AggregationEngine::new(self.store);
        let mut summary = Vec::new();
        for building in self.store.buildings().await? {
            let totals = engine.building_monthly_totals(building.id, period).await?;
            summary.push(BuildingSummary { building, totals });
        }
        Ok(summary)
    }

    /// Zero-filled kWh per building for `period`, ordered by building name.
    /// Buildings without units or usage still appear with `0`.
    pub async fn usage_by_building(&self, period: Period) -> Result<Vec<BuildingUsage>, LedgerError> {
        let engine = AggregationEngine::new(self.store);
        let mut rows = Vec::new();
        for building in self.store.buildings().await? {
            let totals = engine.building_monthly_totals(building.id, period).await?;
            rows.push(BuildingUsage {
                building_name: building.name,
                total_kwh: totals.total_kwh,
            });
        }
        rows.sort_by(|a, b| a.building_name.cmp(&b.building_name));
        Ok(rows)
    }

    /// Units of one building in unit-number order.
    pub async fn unit_usage(
        &self,
        building_id: BuildingId,
        period: Period,
    ) -> Result<Vec<UnitUsageLine>, LedgerError> {
        require_building(self.store, building_id).await?;

        let mut lines = Vec::new();
        for unit in self.store.units_for_building(building_id).await? {
            let kwh = self.store.usage_kwh(unit.id, period).await?;
            lines.push(UnitUsageLine {
                exceeds: exceeds_threshold(kwh, unit.threshold_kwh),
                unit_id: unit.id,
                unit_number: unit.unit_number,
                kwh: kwh.unwrap_or(Decimal::ZERO),
                threshold: unit.threshold_kwh.unwrap_or(Decimal::ZERO),
            });
        }
        Ok(lines)
    }

    /// All units ordered by building name, then unit number.
    pub async fn unit_directory(&self) -> Result<Vec<UnitDirectoryRow>, LedgerError> {
        let names = self.building_names().await?;

        let mut rows = Vec::new();
        for unit in self.store.units().await? {
            let building_name = names
                .get(&unit.building_id)
                .cloned()
                .ok_or_else(|| LedgerError::NotFound(format!("building {}", unit.building_id)))?;
            rows.push(UnitDirectoryRow {
                unit_id: unit.id,
                building_name,
                unit_number: unit.unit_number,
                threshold_kwh: unit.threshold_kwh.unwrap_or(Decimal::ZERO),
            });
        }
        rows.sort_by(|a, b| {
            a.building_name
                .cmp(&b.building_name)
                .then_with(|| a.unit_number.cmp(&b.unit_number))
        });
        Ok(rows)
    }

    /// Recorded usage summed per (building, period), ordered by building
    /// name then period. Periods with no recorded usage produce no row.
    pub async fn usage_chart(&self) -> Result<Vec<ChartRow>, LedgerError> {
        let names = self.building_names().await?;
        let unit_buildings: HashMap<UnitId, BuildingId> = self
            .store
            .units()
            .await?
            .into_iter()
            .map(|u| (u.id, u.building_id))
            .collect();

        let mut totals: BTreeMap<(String, Period), Decimal> = BTreeMap::new();
        for record in self.store.usage_records().await? {
            let name = unit_buildings
                .get(&record.unit_id)
                .and_then(|building_id| names.get(building_id))
                .ok_or_else(|| LedgerError::NotFound(format!("unit {}", record.unit_id)))?;

            let total = totals.entry((name.clone(), record.period)).or_insert(Decimal::ZERO);
            *total = total
                .checked_add(record.kwh)
                .ok_or_else(|| LedgerError::InvalidArgument(format!("kWh total for {name} overflows")))?;
        }

        Ok(totals
            .into_iter()
            .map(|((building_name, period), total_kwh)| ChartRow {
                building_name,
                period,
                total_kwh,
            })
            .collect())
    }

    async fn building_names(&self) -> Result<HashMap<BuildingId, String>, LedgerError> {
        Ok(self
            .store
            .buildings()
            .await?
            .into_iter()
            .map(|b| (b.id, b.name))
            .collect())
    }
}
