//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use st_core::{Config, DbType, VersionKey};
use st_db::{Database, DuckDbBackend};
use st_engine::{Migrator, MigratorOptions};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalArgs;

const IN_MEMORY_PATH: &str = ":memory:";

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Empty: the command already printed what went wrong.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// A loaded project: its root directory and configuration.
pub(crate) struct Project {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
}

/// Load the project configuration from `--config` or the project directory.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(&root),
    }
    .context("Failed to load project configuration")?;
    Ok(Project { root, config })
}

/// Open the database configured for the resolved target.
pub(crate) fn create_database_connection(
    config: &Config,
    target: Option<&str>,
) -> Result<Arc<dyn Database>> {
    let resolved_target = Config::resolve_target(target);
    let db_config = config
        .get_database_config(resolved_target.as_deref())
        .context("Failed to get database configuration")?;
    log::debug!(
        "Connecting to {} database at {}",
        db_config.db_type,
        db_config.path
    );
    if db_config.path == IN_MEMORY_PATH {
        log::warn!(
            "Using an in-memory {} database: applied versions are lost when strata exits, \
             set database.path in strata.yml to keep them",
            db_config.db_type
        );
    }
    let db: Arc<dyn Database> = match db_config.db_type {
        DbType::DuckDb => Arc::new(
            DuckDbBackend::new(&db_config.path).context("Failed to connect to database")?,
        ),
    };
    Ok(db)
}

/// Build a migrator for the project, applying command-line verbosity.
pub(crate) fn build_migrator(global: &GlobalArgs) -> Result<Migrator> {
    let project = load_project(global)?;
    let db = create_database_connection(&project.config, global.target.as_deref())?;
    let mut options = MigratorOptions::from_config(&project.config, &project.root);
    if let Some(verbose) = global.verbosity_override() {
        options.verbose = verbose;
    }
    Ok(Migrator::new(db, options))
}

/// Parse a version argument.
pub(crate) fn parse_version(value: &str) -> Result<VersionKey> {
    VersionKey::parse(value).with_context(|| format!("Invalid version argument '{value}'"))
}
