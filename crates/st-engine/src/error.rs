//! Error types for st-engine

use crate::migration::{Direction, ScriptError};
use st_core::{CoreError, VersionKey};
use st_db::DbError;
use thiserror::Error;

/// Migration engine errors
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Discovery, version parsing or config failure from st-core
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The ledger table could not be created (M001)
    #[error("[M001] Failed to create ledger table '{table}': {source}")]
    Schema { table: String, source: DbError },

    /// Applied versions could not be read (M002)
    #[error("[M002] Failed to read applied migration versions: {0}")]
    LedgerRead(#[source] DbError),

    /// A ledger row could not be inserted or deleted (M003)
    #[error("[M003] Failed to record version {version} in the ledger: {source}")]
    LedgerWrite { version: VersionKey, source: DbError },

    /// The migration does not provide the requested direction (M004)
    #[error("[M004] Migration {version} {name} cannot run {direction}: {reason}")]
    Contract {
        version: VersionKey,
        name: String,
        direction: Direction,
        reason: String,
    },

    /// The migration's own logic failed (M005)
    #[error("[M005] Migration {version} failed while running {direction}: {source}")]
    Execution {
        version: VersionKey,
        direction: Direction,
        source: ScriptError,
    },

    /// A scaffold file could not be written (M006)
    #[error("[M006] Could not generate migration '{target}': {message}")]
    Generation { target: String, message: String },

    /// The migration's executable unit could not be loaded (M007)
    #[error("[M007] Failed to load migration {version}: {message}")]
    ScriptLoad { version: VersionKey, message: String },

    /// No available migration carries the requested version (M008)
    #[error("[M008] There is no migration at all for the given key {version}")]
    NoMigration { version: VersionKey },

    /// BEGIN/COMMIT failed (M009)
    #[error("[M009] Migration transaction failed: {0}")]
    Transaction(#[source] DbError),

    /// A table could not be dropped while resetting the database (M010)
    #[error("[M010] Failed to drop table '{table}': {source}")]
    Drop { table: String, source: DbError },

    /// Any other database failure (M011)
    #[error("[M011] Database error: {0}")]
    Db(#[from] DbError),
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;
