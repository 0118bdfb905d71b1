//! Migration discovery
//!
//! Scans the configured migration-source locations and translates qualifying
//! file names into [`MigrationDescriptor`]s. Locations are visited in the
//! order given; when two locations carry the same version the first one wins
//! and the later file is reported as overridden.

use crate::descriptor::{AvailableSet, MigrationDescriptor};
use crate::error::{CoreError, CoreResult};
use crate::version::parse_script_file_name;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};

/// Result of scanning the migration locations.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Available migrations, ascending by version
    pub available: AvailableSet,

    /// Files skipped because an earlier location already provided their version
    pub overridden: Vec<PathBuf>,
}

/// Scan `locations` for `<version>_<identifier>.<extension>` files.
///
/// Fails on the first location that cannot be listed; no partial result is
/// returned. Finding no migrations at all is not an error.
pub fn discover_migrations(locations: &[PathBuf], extension: &str) -> CoreResult<Discovery> {
    let mut discovery = Discovery::default();

    for location in locations {
        for path in list_location(location)? {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((version, identifier)) = parse_script_file_name(file_name, extension)
            else {
                continue;
            };

            match discovery.available.entry(version) {
                Entry::Occupied(existing) => {
                    log::warn!(
                        "Overridden migration {} (version {} already provided by {})",
                        path.display(),
                        existing.key(),
                        existing.get().script
                    );
                    discovery.overridden.push(path);
                }
                Entry::Vacant(slot) => {
                    let descriptor =
                        MigrationDescriptor::from_file(slot.key().clone(), identifier, path.clone());
                    log::debug!("Discovered migration {}", descriptor);
                    slot.insert(descriptor);
                }
            }
        }
    }

    Ok(discovery)
}

/// List the regular files of one location in file-name order.
fn list_location(location: &Path) -> CoreResult<Vec<PathBuf>> {
    let to_error = |source: std::io::Error| CoreError::Discovery {
        path: location.display().to_string(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(location).map_err(to_error)? {
        let path = entry.map_err(to_error)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
