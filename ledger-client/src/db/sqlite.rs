use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use super::{schema, LedgerStore, UserDirectory};
use crate::{
    domain::{
        building::{validate_key, validate_non_negative},
        usage::validate_kwh,
        Building, BuildingId, Period, Role, Unit, UnitId, UsageRecord, UserRecord,
    },
    error::{LedgerError, Result},
};

/// SQLite-backed ledger. Each call checks a connection out of the pool,
/// runs its statements, and returns it.
#[derive(Debug, Clone)]
pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct BuildingRow {
    id: i64,
    name: String,
    rate_per_kwh: String,
}

#[derive(sqlx::FromRow)]
struct UnitRow {
    id: i64,
    building_id: i64,
    unit_number: String,
    threshold_kwh: Option<String>,
}

#[derive(sqlx::FromRow)]
struct UsageRow {
    unit_id: i64,
    year: i64,
    month: i64,
    kwh: String,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    role: String,
}

fn parse_stored_decimal(column: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw)
        .map_err(|e| LedgerError::Storage(format!("corrupt decimal in {column} '{raw}': {e}")))
}

impl TryFrom<BuildingRow> for Building {
    type Error = LedgerError;

    fn try_from(row: BuildingRow) -> Result<Self> {
        Ok(Building {
            rate_per_kwh: parse_stored_decimal("buildings.rate_per_kwh", &row.rate_per_kwh)?,
            id: row.id,
            name: row.name,
        })
    }
}

impl TryFrom<UnitRow> for Unit {
    type Error = LedgerError;

    fn try_from(row: UnitRow) -> Result<Self> {
        let threshold_kwh = row
            .threshold_kwh
            .as_deref()
            .map(|raw| parse_stored_decimal("units.threshold_kwh", raw))
            .transpose()?;
        Ok(Unit {
            id: row.id,
            building_id: row.building_id,
            unit_number: row.unit_number,
            threshold_kwh,
        })
    }
}

impl TryFrom<UsageRow> for UsageRecord {
    type Error = LedgerError;

    fn try_from(row: UsageRow) -> Result<Self> {
        let year = i32::try_from(row.year)
            .map_err(|_| LedgerError::Storage(format!("stored year {} out of range", row.year)))?;
        let month = u32::try_from(row.month)
            .map_err(|_| LedgerError::Storage(format!("stored month {} out of range", row.month)))?;
        Ok(UsageRecord {
            unit_id: row.unit_id,
            period: Period::new(year, month)?,
            kwh: parse_stored_decimal("energy_usage.kwh", &row.kwh)?,
        })
    }
}

impl TryFrom<UserRow> for UserRecord {
    type Error = LedgerError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(UserRecord {
            role: row.role.parse()?,
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
        })
    }
}

fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = LedgerError>,
{
    rows.into_iter().map(T::try_from).collect()
}

impl SqliteLedgerStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `uri` and ensure the schema.
    pub async fn connect(uri: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(uri)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self::new(pool);
        store.ensure_schema().await?;
        tracing::info!(uri, "ledger store opened");
        Ok(store)
    }

    /// A private in-memory database. The pool holds exactly one connection
    /// that never expires, since each SQLite memory connection is its own
    /// database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        schema::ensure_schema(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn upsert_building(&self, name: &str, rate_per_kwh: Decimal) -> Result<BuildingId> {
        validate_key("building name", name)?;
        validate_non_negative("rate", rate_per_kwh)?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO buildings (name, rate_per_kwh) VALUES (?, ?)
            ON CONFLICT (name) DO UPDATE SET rate_per_kwh = excluded.rate_per_kwh
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(rate_per_kwh.to_string())
        .fetch_one(&self.pool)
        .await?;

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
        if self.building(building_id).await?.is_none() {
            return Err(LedgerError::NotFound(format!("building {building_id}")));
        }

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO units (building_id, unit_number, threshold_kwh) VALUES (?, ?, ?)
            ON CONFLICT (building_id, unit_number) DO UPDATE SET threshold_kwh = excluded.threshold_kwh
            RETURNING id
            "#,
        )
        .bind(building_id)
        .bind(unit_number)
        .bind(threshold_kwh.map(|t| t.to_string()))
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn record_usage(&self, unit_id: UnitId, period: Period, kwh: Decimal) -> Result<()> {
        validate_kwh(kwh)?;
        if self.unit(unit_id).await?.is_none() {
            return Err(LedgerError::NotFound(format!("unit {unit_id}")));
        }

        sqlx::query(
            r#"
            INSERT INTO energy_usage (unit_id, year, month, kwh) VALUES (?, ?, ?, ?)
            ON CONFLICT (unit_id, year, month) DO UPDATE SET kwh = excluded.kwh
            "#,
        )
        .bind(unit_id)
        .bind(period.year())
        .bind(i64::from(period.month()))
        .bind(kwh.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn buildings(&self) -> Result<Vec<Building>> {
        let rows = sqlx::query_as::<_, BuildingRow>(
            "SELECT id, name, rate_per_kwh FROM buildings ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn building(&self, id: BuildingId) -> Result<Option<Building>> {
        sqlx::query_as::<_, BuildingRow>("SELECT id, name, rate_per_kwh FROM buildings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Building::try_from)
            .transpose()
    }

    async fn building_by_name(&self, name: &str) -> Result<Option<Building>> {
        sqlx::query_as::<_, BuildingRow>("SELECT id, name, rate_per_kwh FROM buildings WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .map(Building::try_from)
            .transpose()
    }

    async fn unit(&self, id: UnitId) -> Result<Option<Unit>> {
        sqlx::query_as::<_, UnitRow>(
            "SELECT id, building_id, unit_number, threshold_kwh FROM units WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Unit::try_from)
        .transpose()
    }

    async fn units_for_building(&self, building_id: BuildingId) -> Result<Vec<Unit>> {
        let rows = sqlx::query_as::<_, UnitRow>(
            r#"
            SELECT id, building_id, unit_number, threshold_kwh
            FROM units
            WHERE building_id = ?
            ORDER BY unit_number, id
            "#,
        )
        .bind(building_id)
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn units(&self) -> Result<Vec<Unit>> {
        let rows = sqlx::query_as::<_, UnitRow>(
            "SELECT id, building_id, unit_number, threshold_kwh FROM units ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn usage_kwh(&self, unit_id: UnitId, period: Period) -> Result<Option<Decimal>> {
        sqlx::query_scalar::<_, String>(
            "SELECT kwh FROM energy_usage WHERE unit_id = ? AND year = ? AND month = ?",
        )
        .bind(unit_id)
        .bind(period.year())
        .bind(i64::from(period.month()))
        .fetch_optional(&self.pool)
        .await?
        .map(|raw| parse_stored_decimal("energy_usage.kwh", &raw))
        .transpose()
    }

    async fn usage_records(&self) -> Result<Vec<UsageRecord>> {
        let rows = sqlx::query_as::<_, UsageRow>(
            "SELECT unit_id, year, month, kwh FROM energy_usage ORDER BY unit_id, year, month",
        )
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }
}

#[async_trait::async_trait]
impl UserDirectory for SqliteLedgerStore {
    async fn upsert_user(&self, username: &str, password_hash: &str, role: Role) -> Result<i64> {
        validate_key("username", username)?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (username, password_hash, role) VALUES (?, ?, ?)
            ON CONFLICT (username) DO UPDATE
                SET password_hash = excluded.password_hash,
                    role = excluded.role
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn user(&self, username: &str) -> Result<Option<UserRecord>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, role FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(UserRecord::try_from)
        .transpose()
    }
}
