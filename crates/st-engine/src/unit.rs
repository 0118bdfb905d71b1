//! Single-migration lifecycle: load, validate, announce, execute, record.
//!
//! A run moves through `Announced → Executing → Recorded`, or stops at
//! `Failed` with the error handed back untouched to the caller. The ledger is
//! written exactly once, and only after the migration's logic succeeded, so a
//! failure leaves the ledger at its pre-run state.

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::{Ledger, LEDGER_TABLE};
use crate::migration::{
    Direction, Migration, MigrationContext, MigrationRegistry, ScriptResult, SqlMigration,
};
use crate::progress::Reporter;
use st_core::{MigrationDescriptor, ScriptLocation, SqlScript, VersionKey};
use st_db::Database;
use std::time::Instant;

/// Name shown in announcements that are not tied to one migration.
const ENGINE_NAME: &str = "Strata";

/// Runs one migration (or the drop-everything reset) against a database.
pub struct MigrationUnit<'a> {
    db: &'a dyn Database,
    registry: &'a MigrationRegistry,
    reporter: &'a Reporter,
}

impl<'a> MigrationUnit<'a> {
    pub fn new(
        db: &'a dyn Database,
        registry: &'a MigrationRegistry,
        reporter: &'a Reporter,
    ) -> Self {
        Self {
            db,
            registry,
            reporter,
        }
    }

    /// Run `descriptor` in `direction`.
    ///
    /// `Direction::Drop` ignores the descriptor and resets the schema.
    pub fn run(&self, descriptor: &MigrationDescriptor, direction: Direction) -> MigrateResult<()> {
        match direction {
            Direction::Up => self.run_script(descriptor, direction, |m, ctx| m.up(ctx)),
            Direction::Down => self.run_script(descriptor, direction, |m, ctx| m.down(ctx)),
            Direction::Drop => self.drop_all(),
        }
    }

    /// Drop every table of the current schema except the ledger.
    pub fn drop_all(&self) -> MigrateResult<()> {
        self.reporter.announce(None, ENGINE_NAME, Direction::Drop.starting());
        let start = Instant::now();

        let mut remaining: Vec<String> = self
            .db
            .list_tables()?
            .into_iter()
            .filter(|table| table != LEDGER_TABLE)
            .collect();

        // Referenced tables only drop after their referrers; retry until a
        // pass makes no progress.
        while !remaining.is_empty() {
            let attempted = remaining.len();
            let mut blocked = Vec::new();
            let mut first_error = None;
            for table in remaining {
                let sql = format!("DROP TABLE {}", self.db.quote_identifier(&table));
                match self.db.execute(&sql) {
                    Ok(_) => self.reporter.say(&format!("Dropping {table}")),
                    Err(source) => {
                        log::debug!("Deferring drop of {table}: {source}");
                        if first_error.is_none() {
                            first_error = Some((table.clone(), source));
                        }
                        blocked.push(table);
                    }
                }
            }
            if blocked.len() == attempted {
                if let Some((table, source)) = first_error {
                    return Err(MigrateError::Drop { table, source });
                }
            }
            remaining = blocked;
        }

        self.finish(None, ENGINE_NAME, Direction::Drop, start);
        Ok(())
    }

    fn run_script<F>(
        &self,
        descriptor: &MigrationDescriptor,
        direction: Direction,
        invoke: F,
    ) -> MigrateResult<()>
    where
        F: FnOnce(&dyn Migration, &MigrationContext<'_>) -> ScriptResult<()>,
    {
        let version = &descriptor.version;
        let migration = self.load(descriptor)?;

        if !migration.provides(direction) {
            return Err(MigrateError::Contract {
                version: version.clone(),
                name: descriptor.name.clone(),
                direction,
                reason: format!("the migration does not implement {direction}"),
            });
        }

        let ctx = MigrationContext::new(version, &descriptor.name, self.db, self.reporter);
        self.reporter
            .announce(Some(version), &descriptor.name, direction.starting());
        log::debug!("Running {direction} for migration {descriptor}");

        let start = Instant::now();
        invoke(migration.as_ref(), &ctx).map_err(|source| MigrateError::Execution {
            version: version.clone(),
            direction,
            source,
        })?;

        let ledger = Ledger::new(self.db);
        match direction {
            Direction::Up => {
                ledger.mark_applied(version)?;
            }
            Direction::Down => {
                ledger.mark_reverted(version)?;
            }
            Direction::Drop => {}
        }

        self.finish(Some(version), &descriptor.name, direction, start);
        Ok(())
    }

    fn load(&self, descriptor: &MigrationDescriptor) -> MigrateResult<Box<dyn Migration>> {
        match &descriptor.script {
            ScriptLocation::File(path) => {
                let script = SqlScript::load(path).map_err(|e| MigrateError::ScriptLoad {
                    version: descriptor.version.clone(),
                    message: e.to_string(),
                })?;
                Ok(Box::new(SqlMigration::new(script)))
            }
            ScriptLocation::Registered => self
                .registry
                .instantiate(&descriptor.version)
                .ok_or_else(|| MigrateError::ScriptLoad {
                    version: descriptor.version.clone(),
                    message: format!("no migration named '{}' is registered", descriptor.name),
                }),
        }
    }

    fn finish(
        &self,
        version: Option<&VersionKey>,
        name: &str,
        direction: Direction,
        start: Instant,
    ) {
        let text = format!(
            "{} ({:.4} s.)",
            direction.finished(),
            start.elapsed().as_secs_f64()
        );
        self.reporter.announce(version, name, &text);
        self.reporter.write("");
    }
}

#[cfg(test)]
#[path = "unit_test.rs"]
mod tests;
