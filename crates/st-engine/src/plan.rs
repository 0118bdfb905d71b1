//! Migration planning.
//!
//! Turns the available set, the installed set and a target into the ordered
//! list of steps a `migrate` call will run. Pure: no database access, no output.

use crate::migration::Direction;
use serde::Serialize;
use st_core::{AvailableSet, CoreError, MigrationDescriptor, ScriptLocation, VersionKey};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Where a `migrate` call should leave the schema.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Target {
    /// Apply every pending migration
    #[default]
    Latest,
    /// Drop every application table (`0` on the command line)
    Reset,
    /// Revert everything newer than the version and apply everything up to it
    Version(VersionKey),
}

impl FromStr for Target {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "latest" => Ok(Target::Latest),
            "0" => Ok(Target::Reset),
            other => VersionKey::parse(other).map(Target::Version),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Latest => f.write_str("latest"),
            Target::Reset => f.write_str("0"),
            Target::Version(version) => write!(f, "{version}"),
        }
    }
}

/// One migration the planner decided to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    pub version: VersionKey,
    pub name: String,
    pub direction: Direction,
    pub script: ScriptLocation,
}

impl PlannedStep {
    pub fn new(descriptor: &MigrationDescriptor, direction: Direction) -> Self {
        Self {
            version: descriptor.version.clone(),
            name: descriptor.name.clone(),
            direction,
            script: descriptor.script.clone(),
        }
    }

    /// The descriptor this step runs.
    pub fn descriptor(&self) -> MigrationDescriptor {
        MigrationDescriptor {
            version: self.version.clone(),
            name: self.name.clone(),
            script: self.script.clone(),
        }
    }
}

/// Compute the down phase followed by the up phase for `target`.
///
/// `Target::Reset` yields no steps; the drop is not version-driven.
pub fn plan(
    available: &AvailableSet,
    installed: &BTreeSet<VersionKey>,
    target: &Target,
) -> Vec<PlannedStep> {
    let limit = match target {
        Target::Reset => return Vec::new(),
        Target::Latest => None,
        Target::Version(version) => Some(version),
    };

    let mut steps = Vec::new();

    if let Some(limit) = limit {
        let downs = available
            .values()
            .rev()
            .take_while(|d| d.version > *limit)
            .filter(|d| installed.contains(&d.version))
            .map(|d| PlannedStep::new(d, Direction::Down));
        steps.extend(downs);
    }

    let ups = available
        .values()
        .take_while(|d| limit.map_or(true, |limit| d.version <= *limit))
        .filter(|d| !installed.contains(&d.version))
        .map(|d| PlannedStep::new(d, Direction::Up));
    steps.extend(ups);

    steps
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
