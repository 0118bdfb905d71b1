//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Strata - versioned database schema migrations
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Print migration progress (overrides `verbose` in strata.yml)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress migration progress (overrides `verbose` in strata.yml)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override target (database connection, falls back to STRATA_TARGET)
    #[arg(short, long, global = true)]
    pub target: Option<String>,
}

impl GlobalArgs {
    /// Verbosity requested on the command line, if any.
    pub fn verbosity_override(&self) -> Option<bool> {
        if self.verbose {
            Some(true)
        } else if self.quiet {
            Some(false)
        } else {
            None
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Migrate to the latest version, a specific version, or 0 to drop all tables
    Migrate(MigrateArgs),

    /// Run a single migration up or down
    Execute(ExecuteArgs),

    /// Show which migrations are applied
    Status(StatusArgs),

    /// Add or delete a ledger entry without running a migration
    Version(VersionArgs),

    /// Create an empty migration script
    Generate(GenerateArgs),
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Target version: `latest`, a 14-digit version, or `0` to drop all tables
    #[arg(id = "migrate_target", value_name = "TARGET", default_value = "latest")]
    pub target: String,

    /// Print what would run without touching the database
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the execute command
#[derive(Args, Debug)]
pub struct ExecuteArgs {
    /// Version of the migration to run
    pub version: String,

    /// Direction to run the migration in
    #[arg(value_enum, default_value = "up")]
    pub direction: DirectionArg,

    /// Run even if the ledger says the migration is already in that state
    #[arg(short, long)]
    pub force: bool,

    /// Print what would run without touching the database
    #[arg(long)]
    pub dry_run: bool,
}

/// Direction accepted by the execute command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionArg {
    /// Apply the migration
    Up,
    /// Revert the migration
    Down,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only report this version
    pub version: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: StatusOutput,
}

/// Status output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutput {
    /// One line per migration
    Table,
    /// JSON output
    Json,
}

/// Arguments for the version command
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Version to record or remove
    pub version: String,

    /// Ledger operation
    #[arg(value_enum)]
    pub op: VersionOpArg,
}

/// Ledger operations accepted by the version command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOpArg {
    /// Mark the version as applied
    Add,
    /// Mark the version as not applied
    Delete,
}

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Migration name, optionally prefixed with a 14-digit version
    /// (`create_users` or `20240101120000_create_users`)
    pub name: String,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
