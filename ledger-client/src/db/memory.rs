use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use rust_decimal::Decimal;

use super::{LedgerStore, UserDirectory};
use crate::{
    domain::{
        building::{validate_key, validate_non_negative},
        usage::validate_kwh,
        Building, BuildingId, Period, Role, Unit, UnitId, UsageRecord, UserRecord,
    },
    error::{LedgerError, Result},
};

#[derive(Default)]
struct State {
    buildings: BTreeMap<BuildingId, Building>,
    units: BTreeMap<UnitId, Unit>,
    usage: BTreeMap<(UnitId, Period), Decimal>,
    users: BTreeMap<String, UserRecord>,
    next_building_id: BuildingId,
    next_unit_id: UnitId,
    next_user_id: i64,
}

/// In-process ledger with the same keys and checks as the SQLite store.
/// Ids start at 1 and are never reused.
#[derive(Default)]
pub struct MemoryLedgerStore {
    state: Mutex<State>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| LedgerError::Storage("memory ledger lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn upsert_building(&self, name: &str, rate_per_kwh: Decimal) -> Result<BuildingId> {
        validate_key("building name", name)?;
        validate_non_negative("rate", rate_per_kwh)?;

        let mut state = self.lock()?;
        if let Some(existing) = state.buildings.values_mut().find(|b| b.name == name) {
            existing.rate_per_kwh = rate_per_kwh;
            return Ok(existing.id);
        }

        state.next_building_id += 1;
        let id = state.next_building_id;
        state.buildings.insert(
            id,
            Building {
                id,
                name: name.to_string(),
                rate_per_kwh,
            },
        );
        Ok(id)
    }

    async fn upsert_unit(
        &self,
        building_id: BuildingId,
        unit_number: &str,
        threshold_kwh: Option<Decimal>,
    ) -> Result<UnitId> {
        validate_key("unit number", unit_number)?;
        if let Some(threshold) = threshold_kwh {
            validate_non_negative("threshold", threshold)?;
        }

        let mut state = self.lock()?;
        if !state.buildings.contains_key(&building_id) {
            return Err(LedgerError::NotFound(format!("building {building_id}")));
        }
        if let Some(existing) = state
            .units
            .values_mut()
            .find(|u| u.building_id == building_id && u.unit_number == unit_number)
        {
            existing.threshold_kwh = threshold_kwh;
            return Ok(existing.id);
        }

        state.next_unit_id += 1;
        let id = state.next_unit_id;
        state.units.insert(
            id,
            Unit {
                id,
                building_id,
                unit_number: unit_number.to_string(),
                threshold_kwh,
            },
        );
        Ok(id)
    }

    async fn record_usage(&self, unit_id: UnitId, period: Period, kwh: Decimal) -> Result<()> {
        validate_kwh(kwh)?;

        let mut state = self.lock()?;
        if !state.units.contains_key(&unit_id) {
            return Err(LedgerError::NotFound(format!("unit {unit_id}")));
        }
        state.usage.insert((unit_id, period), kwh);
        Ok(())
    }

    async fn buildings(&self) -> Result<Vec<Building>> {
        Ok(self.lock()?.buildings.values().cloned().collect())
    }

    async fn building(&self, id: BuildingId) -> Result<Option<Building>> {
        Ok(self.lock()?.buildings.get(&id).cloned())
    }

    async fn building_by_name(&self, name: &str) -> Result<Option<Building>> {
        Ok(self
            .lock()?
            .buildings
            .values()
            .find(|b| b.name == name)
            .cloned())
    }

    async fn unit(&self, id: UnitId) -> Result<Option<Unit>> {
        Ok(self.lock()?.units.get(&id).cloned())
    }

    async fn units_for_building(&self, building_id: BuildingId) -> Result<Vec<Unit>> {
        let mut units: Vec<Unit> = self
            .lock()?
            .units
            .values()
            .filter(|u| u.building_id == building_id)
            .cloned()
            .collect();
        units.sort_by(|a, b| a.unit_number.cmp(&b.unit_number).then(a.id.cmp(&b.id)));
        Ok(units)
    }

    async fn units(&self) -> Result<Vec<Unit>> {
        Ok(self.lock()?.units.values().cloned().collect())
    }

    async fn usage_kwh(&self, unit_id: UnitId, period: Period) -> Result<Option<Decimal>> {
        Ok(self.lock()?.usage.get(&(unit_id, period)).copied())
    }

    async fn usage_records(&self) -> Result<Vec<UsageRecord>> {
        Ok(self
            .lock()?
            .usage
            .iter()
            .map(|(&(unit_id, period), &kwh)| UsageRecord { unit_id, period, kwh })
            .collect())
    }
}

#[async_trait::async_trait]
impl UserDirectory for MemoryLedgerStore {
    async fn upsert_user(&self, username: &str, password_hash: &str, role: Role) -> Result<i64> {
        validate_key("username", username)?;

        let mut state = self.lock()?;
        if let Some(existing) = state.users.get_mut(username) {
            existing.password_hash = password_hash.to_string();
            existing.role = role;
            return Ok(existing.id);
        }

        state.next_user_id += 1;
        let id = state.next_user_id;
        state.users.insert(
            username.to_string(),
            UserRecord {
                id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                role,
            },
        );
        Ok(id)
    }

    async fn user(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self.lock()?.users.get(username).cloned())
    }
}
