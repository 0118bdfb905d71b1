//! Execute command implementation

use anyhow::{Context, Result};
use st_engine::Direction;

use crate::cli::{DirectionArg, ExecuteArgs, GlobalArgs};
use crate::commands::common::{build_migrator, parse_version};
use crate::commands::migrate::finish;

/// Execute the execute command
pub(crate) fn execute(args: &ExecuteArgs, global: &GlobalArgs) -> Result<()> {
    let version = parse_version(&args.version)?;
    let direction = match args.direction {
        DirectionArg::Up => Direction::Up,
        DirectionArg::Down => Direction::Down,
    };
    let migrator = build_migrator(global)?;

    let report = migrator
        .execute(&version, direction, args.force, args.dry_run)
        .with_context(|| format!("Failed to run {direction} for {version}"))?;
    finish(&report)
}
