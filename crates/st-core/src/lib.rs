//! st-core - Core library for Strata
//!
//! This crate provides the migration version model, filesystem discovery of
//! migration scripts, the SQL script format, and project configuration shared
//! by the engine and the CLI.

pub mod config;
pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod script;
pub mod version;

pub use config::{AbortPolicy, Config, DatabaseConfig, DbType};
pub use descriptor::{AvailableSet, MigrationDescriptor, ScriptLocation};
pub use discovery::{discover_migrations, Discovery};
pub use error::{CoreError, CoreResult};
pub use script::{ScriptStep, SqlScript};
pub use version::VersionKey;
