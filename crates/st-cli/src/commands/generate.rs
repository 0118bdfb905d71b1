//! Generate command implementation

use anyhow::{Context, Result};

use crate::cli::{GenerateArgs, GlobalArgs};
use crate::commands::common::build_migrator;

/// Execute the generate command
pub(crate) fn execute(args: &GenerateArgs, global: &GlobalArgs) -> Result<()> {
    let migrator = build_migrator(global)?;
    let path = migrator
        .generate(&args.name)
        .with_context(|| format!("Failed to generate migration '{}'", args.name))?;
    log::debug!("Generated {}", path.display());
    Ok(())
}
