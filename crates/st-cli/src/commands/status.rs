//! Status command implementation

use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::{build_migrator, parse_version};

/// Execute the status command
pub(crate) fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let version = args.version.as_deref().map(parse_version).transpose()?;
    let migrator = build_migrator(global)?;

    let lines = migrator
        .status(version.as_ref())
        .context("Failed to read migration status")?;

    match args.output {
        StatusOutput::Json => {
            println!("{}", serde_json::to_string_pretty(&lines)?);
        }
        StatusOutput::Table => {
            println!("Listing statuses for all migrations:");
            for line in &lines {
                println!("{line}");
            }
        }
    }
    Ok(())
}
