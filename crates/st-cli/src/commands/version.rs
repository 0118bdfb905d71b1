//! Version command implementation

use anyhow::{Context, Result};
use st_engine::VersionOp;

use crate::cli::{GlobalArgs, VersionArgs, VersionOpArg};
use crate::commands::common::build_migrator;

/// Execute the version command
pub(crate) fn execute(args: &VersionArgs, global: &GlobalArgs) -> Result<()> {
    let op = match args.op {
        VersionOpArg::Add => VersionOp::Add,
        VersionOpArg::Delete => VersionOp::Delete,
    };
    let migrator = build_migrator(global)?;

    let changed = migrator
        .record_version(&args.version, op)
        .with_context(|| format!("Failed to {op} version {}", args.version))?;

    match (op, changed) {
        (VersionOp::Add, true) => println!("Version {} added to the ledger", args.version),
        (VersionOp::Add, false) => println!("Version {} was already applied", args.version),
        (VersionOp::Delete, true) => println!("Version {} deleted from the ledger", args.version),
        (VersionOp::Delete, false) => println!("Version {} was not applied", args.version),
    }
    Ok(())
}
