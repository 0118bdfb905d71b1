//! The migration contract.
//!
//! A migration is anything implementing [`Migration`]. File-based migrations
//! are parsed into [`SqlMigration`]; migrations compiled into the binary are
//! registered by version in a [`MigrationRegistry`] and built on demand by
//! their factory. Either way the engine only ever sees `Box<dyn Migration>`.

use crate::progress::Reporter;
use serde::Serialize;
use st_core::{MigrationDescriptor, ScriptStep, SqlScript, VersionKey};
use st_db::{Database, DbError};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use thiserror::Error;

/// Which way a migration is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Apply the migration
    Up,
    /// Revert the migration
    Down,
    /// Drop every application table (not tied to a migration)
    Drop,
}

impl Direction {
    /// Word used in the opening announcement.
    pub fn starting(self) -> &'static str {
        match self {
            Direction::Up => "migrating",
            Direction::Down => "reverting",
            Direction::Drop => "dropping tables",
        }
    }

    /// Word used in the completion announcement.
    pub fn finished(self) -> &'static str {
        match self {
            Direction::Up => "migrated",
            Direction::Down => "reverted",
            Direction::Drop => "dropped tables",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
            Direction::Drop => f.write_str("drop"),
        }
    }
}

/// Failure raised by a migration's own logic.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// A statement issued through [`MigrationContext::exec`] failed
    #[error("{source} (statement: {statement})")]
    Sql { statement: String, source: DbError },

    /// Direct database failure from a registered migration
    #[error(transparent)]
    Db(#[from] DbError),

    /// Any other failure reported by the migration
    #[error("{0}")]
    Failed(String),
}

/// Result type for migration logic
pub type ScriptResult<T> = Result<T, ScriptError>;

/// What a running migration can see: its identity, the database handle, and
/// the progress helpers.
pub struct MigrationContext<'a> {
    version: &'a VersionKey,
    name: &'a str,
    db: &'a dyn Database,
    reporter: &'a Reporter,
}

impl<'a> MigrationContext<'a> {
    pub(crate) fn new(
        version: &'a VersionKey,
        name: &'a str,
        db: &'a dyn Database,
        reporter: &'a Reporter,
    ) -> Self {
        Self {
            version,
            name,
            db,
            reporter,
        }
    }

    pub fn version(&self) -> &VersionKey {
        self.version
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn verbose(&self) -> bool {
        self.reporter.verbose()
    }

    pub fn db(&self) -> &dyn Database {
        self.db
    }

    /// Print `-- message`.
    pub fn say(&self, message: &str) {
        self.reporter.say(message);
    }

    /// Print `   -> message`.
    pub fn say_sub(&self, message: &str) {
        self.reporter.say_sub(message);
    }

    /// Print a message followed by the time elapsed since `start` and an
    /// optional row count.
    pub fn say_with_time(&self, message: &str, start: Instant, rows: Option<usize>) {
        self.say(message);
        self.say_sub(&format!("{:.4} s.", start.elapsed().as_secs_f64()));
        if let Some(rows) = rows.filter(|r| *r > 0) {
            self.say_sub(&format!("{rows} rows"));
        }
    }

    /// Execute SQL, echoing the error and the failing statement when verbose.
    pub fn exec(&self, sql: &str) -> ScriptResult<()> {
        self.db.execute_batch(sql).map_err(|source| {
            self.reporter.write(&format!("SQL Error: {source}"));
            self.reporter.write(&format!("When executing query\n{sql}"));
            ScriptError::Sql {
                statement: sql.to_string(),
                source,
            }
        })
    }

    /// Execute a single statement and report it with its timing and affected rows.
    pub fn exec_with_message(&self, message: &str, sql: &str) -> ScriptResult<usize> {
        let start = Instant::now();
        let rows = self.db.execute(sql).map_err(|source| {
            self.reporter.write(&format!("SQL Error: {source}"));
            self.reporter.write(&format!("When executing query\n{sql}"));
            ScriptError::Sql {
                statement: sql.to_string(),
                source,
            }
        })?;
        self.say_with_time(message, start, Some(rows));
        Ok(rows)
    }
}

/// A single reversible schema change.
pub trait Migration {
    /// Apply the change.
    fn up(&self, ctx: &MigrationContext<'_>) -> ScriptResult<()>;

    /// Revert the change.
    fn down(&self, ctx: &MigrationContext<'_>) -> ScriptResult<()>;

    /// Whether this migration implements `direction`.
    ///
    /// Checked before anything is announced or executed.
    fn provides(&self, direction: Direction) -> bool {
        matches!(direction, Direction::Up | Direction::Down)
    }
}

/// Migration backed by a parsed SQL script file.
pub struct SqlMigration {
    script: SqlScript,
}

impl SqlMigration {
    pub fn new(script: SqlScript) -> Self {
        Self { script }
    }

    fn run_steps(ctx: &MigrationContext<'_>, steps: Option<&[ScriptStep]>) -> ScriptResult<()> {
        let steps = steps.ok_or_else(|| ScriptError::Failed("section is missing".to_string()))?;
        for step in steps {
            match step {
                ScriptStep::Say(message) => ctx.say(message),
                ScriptStep::Sql(sql) => ctx.exec(sql)?,
            }
        }
        Ok(())
    }
}

impl Migration for SqlMigration {
    fn up(&self, ctx: &MigrationContext<'_>) -> ScriptResult<()> {
        Self::run_steps(ctx, self.script.up.as_deref())
    }

    fn down(&self, ctx: &MigrationContext<'_>) -> ScriptResult<()> {
        Self::run_steps(ctx, self.script.down.as_deref())
    }

    fn provides(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.script.up.is_some(),
            Direction::Down => self.script.down.is_some(),
            Direction::Drop => false,
        }
    }
}

type MigrationFactory = Box<dyn Fn() -> Box<dyn Migration>>;

struct RegisteredMigration {
    name: String,
    factory: MigrationFactory,
}

/// Migrations compiled into the binary, keyed by version.
#[derive(Default)]
pub struct MigrationRegistry {
    entries: BTreeMap<VersionKey, RegisteredMigration>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration factory. A later registration for the same
    /// version replaces the earlier one.
    pub fn register<F>(&mut self, version: VersionKey, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Migration> + 'static,
    {
        self.entries.insert(
            version,
            RegisteredMigration {
                name: name.into(),
                factory: Box::new(factory),
            },
        );
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Descriptors for every registered migration, ascending.
    pub fn descriptors(&self) -> impl Iterator<Item = MigrationDescriptor> + '_ {
        self.entries
            .iter()
            .map(|(version, entry)| MigrationDescriptor::registered(version.clone(), &entry.name))
    }

    /// Build the migration registered for `version`.
    pub fn instantiate(&self, version: &VersionKey) -> Option<Box<dyn Migration>> {
        self.entries.get(version).map(|entry| (entry.factory)())
    }
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
