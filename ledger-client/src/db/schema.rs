use sqlx::SqlitePool;

use crate::error::Result;

/// Decimal columns are TEXT so rates and kWh round-trip exactly.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS buildings (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT    NOT NULL UNIQUE,
    rate_per_kwh  TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS units (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    building_id   INTEGER NOT NULL REFERENCES buildings(id) ON DELETE CASCADE,
    unit_number   TEXT    NOT NULL,
    threshold_kwh TEXT,
    UNIQUE (building_id, unit_number)
);

CREATE TABLE IF NOT EXISTS energy_usage (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    unit_id       INTEGER NOT NULL REFERENCES units(id) ON DELETE CASCADE,
    year          INTEGER NOT NULL,
    month         INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    kwh           TEXT    NOT NULL,
    UNIQUE (unit_id, year, month)
);

CREATE INDEX IF NOT EXISTS ix_usage_unit_period ON energy_usage (unit_id, year, month);

CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT    NOT NULL UNIQUE,
    password_hash TEXT    NOT NULL,
    role          TEXT    NOT NULL
);
"#;

/// Create the ledger tables if they do not exist yet.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    tracing::debug!("ledger schema ensured");
    Ok(())
}
