//! Installed-version ledger.
//!
//! Tracks applied versions in a single-column table. A row means "the up path
//! of this version has run and has not been reverted"; there is no history.
//! Every call runs on the caller's connection and joins whatever transaction
//! the caller has open.

use crate::error::{MigrateError, MigrateResult};
use st_core::VersionKey;
use st_db::Database;
use std::collections::BTreeSet;

/// Name of the ledger table. Never dropped by a reset.
pub const LEDGER_TABLE: &str = "_schema_versions";

const CREATE_LEDGER_SQL: &str =
    "CREATE TABLE _schema_versions (version CHAR(14) NOT NULL PRIMARY KEY)";

const SELECT_VERSIONS_SQL: &str = "SELECT version FROM _schema_versions ORDER BY version ASC";

const INSERT_IF_ABSENT_SQL: &str = "INSERT INTO _schema_versions (version) \
     SELECT CAST(? AS VARCHAR) \
     WHERE NOT EXISTS (SELECT 1 FROM _schema_versions WHERE version = CAST(? AS VARCHAR))";

const DELETE_SQL: &str = "DELETE FROM _schema_versions WHERE version = CAST(? AS VARCHAR)";

/// Read/write access to the ledger table.
pub struct Ledger<'a> {
    db: &'a dyn Database,
}

impl<'a> Ledger<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Create the ledger table unless the catalog already lists it.
    ///
    /// Losing a creation race to another runner counts as success.
    pub fn ensure_schema(&self) -> MigrateResult<()> {
        let schema_error = |source| MigrateError::Schema {
            table: LEDGER_TABLE.to_string(),
            source,
        };

        if self.db.relation_exists(LEDGER_TABLE).map_err(schema_error)? {
            return Ok(());
        }

        match self.db.execute(CREATE_LEDGER_SQL) {
            Ok(_) => {
                log::debug!("Created ledger table {LEDGER_TABLE}");
                Ok(())
            }
            Err(e) if e.is_already_exists() => Ok(()),
            Err(e) => Err(schema_error(e)),
        }
    }

    /// All applied versions, ascending. Empty when the table does not exist yet.
    pub fn installed(&self) -> MigrateResult<BTreeSet<VersionKey>> {
        if !self
            .db
            .relation_exists(LEDGER_TABLE)
            .map_err(MigrateError::LedgerRead)?
        {
            return Ok(BTreeSet::new());
        }

        let rows = self
            .db
            .query_strings(SELECT_VERSIONS_SQL)
            .map_err(MigrateError::LedgerRead)?;

        let mut installed = BTreeSet::new();
        for row in rows {
            // CHAR columns may come back space-padded on some engines
            match VersionKey::parse(row.trim()) {
                Ok(version) => {
                    installed.insert(version);
                }
                Err(_) => log::warn!("Ignoring malformed ledger row '{row}' in {LEDGER_TABLE}"),
            }
        }
        Ok(installed)
    }

    /// Record `version` as applied. Returns false if it already was.
    pub fn mark_applied(&self, version: &VersionKey) -> MigrateResult<bool> {
        let inserted = self
            .db
            .execute_with_params(INSERT_IF_ABSENT_SQL, &[version.as_str(), version.as_str()])
            .map_err(|source| MigrateError::LedgerWrite {
                version: version.clone(),
                source,
            })?;
        Ok(inserted > 0)
    }

    /// Remove `version` from the ledger. Returns false if it was not present.
    pub fn mark_reverted(&self, version: &VersionKey) -> MigrateResult<bool> {
        let deleted = self
            .db
            .execute_with_params(DELETE_SQL, &[version.as_str()])
            .map_err(|source| MigrateError::LedgerWrite {
                version: version.clone(),
                source,
            })?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
