//! Storage seam for the ledger.
//!
//! Every component takes a store handle explicitly; there is no process-wide
//! connection. [`SqliteLedgerStore`] is the durable implementation and
//! [`MemoryLedgerStore`] backs tests.

pub mod memory;
pub mod schema;
pub mod sqlite;

pub use memory::MemoryLedgerStore;
pub use sqlite::SqliteLedgerStore;

use rust_decimal::Decimal;

use crate::{
    domain::{Building, BuildingId, Period, Role, Unit, UnitId, UsageRecord, UserRecord},
    error::{LedgerError, Result},
};

#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a building, or update the rate of the building with exactly
    /// this name. Returns the stable id either way.
    async fn upsert_building(&self, name: &str, rate_per_kwh: Decimal) -> Result<BuildingId>;

    /// Insert a unit, or update the threshold of the existing
    /// (building, unit number) pair. `NotFound` if the building is missing.
    async fn upsert_unit(
        &self,
        building_id: BuildingId,
        unit_number: &str,
        threshold_kwh: Option<Decimal>,
    ) -> Result<UnitId>;

    /// Insert or overwrite the usage fact for (unit, period).
    async fn record_usage(&self, unit_id: UnitId, period: Period, kwh: Decimal) -> Result<()>;

    /// All buildings, ascending id.
    async fn buildings(&self) -> Result<Vec<Building>>;

    async fn building(&self, id: BuildingId) -> Result<Option<Building>>;

    async fn building_by_name(&self, name: &str) -> Result<Option<Building>>;

    async fn unit(&self, id: UnitId) -> Result<Option<Unit>>;

    /// Units of one building, ascending unit number.
    async fn units_for_building(&self, building_id: BuildingId) -> Result<Vec<Unit>>;

    /// All units, ascending id.
    async fn units(&self) -> Result<Vec<Unit>>;

    /// `None` when nothing was recorded for the period.
    async fn usage_kwh(&self, unit_id: UnitId, period: Period) -> Result<Option<Decimal>>;

    /// All usage facts, ordered by unit id then period.
    async fn usage_records(&self) -> Result<Vec<UsageRecord>>;
}

/// Credentials backing the authentication collaborator.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn upsert_user(&self, username: &str, password_hash: &str, role: Role) -> Result<i64>;

    async fn user(&self, username: &str) -> Result<Option<UserRecord>>;
}

pub async fn require_building<S>(store: &S, id: BuildingId) -> Result<Building>
where
    S: LedgerStore + ?Sized,
{
    store
        .building(id)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("building {id}")))
}

pub async fn require_unit<S>(store: &S, id: UnitId) -> Result<Unit>
where
    S: LedgerStore + ?Sized,
{
    store
        .unit(id)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("unit {id}")))
}
