//! Migrate command implementation

use anyhow::{Context, Result};
use st_engine::{MigrationReport, Target};

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::commands::common::{build_migrator, ExitCode};

/// Execute the migrate command
pub(crate) fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let target: Target = args
        .target
        .parse()
        .with_context(|| format!("Invalid migrate target '{}'", args.target))?;
    let migrator = build_migrator(global)?;

    let report = migrator
        .migrate(&target, args.dry_run)
        .context("Migration failed")?;
    finish(&report)
}

/// Turn an aborted report into a non-zero exit.
pub(crate) fn finish(report: &MigrationReport) -> Result<()> {
    log::info!(
        "{} applied, {} reverted, {} planned",
        report.applied.len(),
        report.reverted.len(),
        report.planned.len()
    );
    if report.succeeded() {
        Ok(())
    } else {
        Err(ExitCode(1).into())
    }
}
