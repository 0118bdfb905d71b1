//! Migration descriptors and the ordered set of available migrations

use crate::version::{type_name, VersionKey};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Where a migration's executable logic comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum ScriptLocation {
    /// A script file found by discovery
    File(PathBuf),
    /// A migration compiled into the binary and registered by version
    Registered,
}

impl fmt::Display for ScriptLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptLocation::File(path) => write!(f, "{}", path.display()),
            ScriptLocation::Registered => f.write_str("<registered>"),
        }
    }
}

/// A discovered migration: its version, derived name, and script location.
///
/// Descriptors are recomputed on every run and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationDescriptor {
    /// Version key from the filename prefix
    pub version: VersionKey,

    /// Type-like name derived from the filename identifier
    pub name: String,

    /// Script location
    pub script: ScriptLocation,
}

impl MigrationDescriptor {
    /// Build a descriptor for a script file, deriving the name from `identifier`.
    pub fn from_file(version: VersionKey, identifier: &str, path: PathBuf) -> Self {
        Self {
            version,
            name: type_name(identifier),
            script: ScriptLocation::File(path),
        }
    }

    /// Build a descriptor for a registered (compiled-in) migration.
    pub fn registered(version: VersionKey, name: impl Into<String>) -> Self {
        Self {
            version,
            name: name.into(),
            script: ScriptLocation::Registered,
        }
    }
}

impl fmt::Display for MigrationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.version, self.name, self.script)
    }
}

/// Ordered mapping of every available migration, ascending by version.
pub type AvailableSet = BTreeMap<VersionKey, MigrationDescriptor>;
