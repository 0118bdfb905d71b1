//! Error types for st-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table or view not found: {0}")]
    TableNotFound(String),

    /// Object already exists (D004)
    #[error("[D004] Object already exists: {0}")]
    AlreadyExists(String),

    /// Transaction control failed (D005)
    #[error("[D005] Transaction failed: {0}")]
    TransactionError(String),

    /// Mutex poisoned (D006)
    #[error("[D006] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// True when the error reports that the object being created already exists.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, DbError::AlreadyExists(_))
    }
}

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        classify(err.to_string())
    }
}

/// Classify a DuckDB error message.
///
/// duckdb::Error does not expose structured variants, so string matching is
/// the only reliable approach. Patterns are kept narrow.
pub(crate) fn classify(msg: String) -> DbError {
    if (msg.contains("Table with name")
        && (msg.contains("does not exist") || msg.contains("not found")))
        || msg.contains("Table or view with name")
        || (msg.contains("Catalog Error") && msg.contains("Table") && msg.contains("not found"))
    {
        DbError::TableNotFound(msg)
    } else if msg.contains("already exists") {
        DbError::AlreadyExists(msg)
    } else {
        DbError::ExecutionError(msg)
    }
}
