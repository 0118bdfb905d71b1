//! st-engine - Migration engine for Strata
//!
//! This crate provides the installed-version ledger, the migration contract
//! and registry, the single-migration lifecycle, planning, and the
//! [`Migrator`] that orchestrates them against a [`st_db::Database`].

pub mod error;
pub mod ledger;
pub mod migration;
pub mod migrator;
pub mod plan;
pub mod progress;
pub mod unit;

pub use error::{MigrateError, MigrateResult};
pub use ledger::{Ledger, LEDGER_TABLE};
pub use migration::{
    Direction, Migration, MigrationContext, MigrationRegistry, ScriptError, ScriptResult,
    SqlMigration,
};
pub use migrator::{
    MigrationReport, MigrationState, Migrator, MigratorOptions, StatusLine, VersionOp,
};
pub use plan::{plan, PlannedStep, Target};
pub use progress::{CapturedOutput, Reporter};
pub use unit::MigrationUnit;
