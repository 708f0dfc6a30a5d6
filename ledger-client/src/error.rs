/// Failure kinds surfaced by every ledger operation.
#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                LedgerError::Conflict(db.message().to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                LedgerError::NotFound(db.message().to_string())
            }
            _ => LedgerError::Storage(e.to_string()),
        }
    }
}
