//! Migration version keys and the filename rules built on them.
//!
//! A [`VersionKey`] is a fixed-width, 14-digit string shaped like a
//! `YYYYMMDDHHMMSS` timestamp. Because the width is fixed, lexicographic order
//! and numeric order agree, so the derived `Ord` is the migration order.
//!
//! Discovery and scaffolding share the patterns defined here so that every
//! file `generate` writes is picked up again by a scan.

use crate::error::{CoreError, CoreResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::OnceLock;

/// Number of digits in a version key.
pub const VERSION_WIDTH: usize = 14;

static SCRIPT_NAME_RE: OnceLock<Regex> = OnceLock::new();
static GENERATE_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn script_name_re() -> &'static Regex {
    SCRIPT_NAME_RE.get_or_init(|| {
        Regex::new(r"^([0-9]{14})_([A-Za-z][A-Za-z0-9_]*)\.([A-Za-z0-9]+)$")
            .expect("valid regex literal")
    })
}

fn generate_name_re() -> &'static Regex {
    GENERATE_NAME_RE.get_or_init(|| {
        Regex::new(r"^(?:([0-9]{14})_)?([A-Za-z][A-Za-z0-9_]*)$").expect("valid regex literal")
    })
}

/// Strongly-typed 14-digit migration version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionKey(String);

impl VersionKey {
    /// Parse a version key, rejecting anything that is not exactly 14 ASCII digits.
    pub fn parse(value: &str) -> CoreResult<Self> {
        if value.len() == VERSION_WIDTH && value.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(value.to_string()))
        } else {
            Err(CoreError::InvalidVersion {
                value: value.to_string(),
            })
        }
    }

    /// Return the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for VersionKey {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for VersionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for VersionKey {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionKey {
    type Error = CoreError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VersionKey> for String {
    fn from(key: VersionKey) -> Self {
        key.0
    }
}

impl PartialEq<str> for VersionKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for VersionKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Split a migration script file name into its version and identifier.
///
/// Returns `None` unless the name is exactly `<14 digits>_<identifier>.<extension>`
/// with the given extension (compared case-sensitively).
pub fn parse_script_file_name<'a>(
    file_name: &'a str,
    extension: &str,
) -> Option<(VersionKey, &'a str)> {
    let caps = script_name_re().captures(file_name)?;
    if caps.get(3)?.as_str() != extension {
        return None;
    }
    let version = VersionKey(caps.get(1)?.as_str().to_string());
    Some((version, caps.get(2)?.as_str()))
}

/// Split a scaffold name of the form `[<14 digits>_]<identifier>`.
///
/// The version part is `None` when the caller did not pin one.
pub fn parse_generate_name(name: &str) -> Option<(Option<VersionKey>, &str)> {
    let caps = generate_name_re().captures(name)?;
    let version = caps.get(1).map(|m| VersionKey(m.as_str().to_string()));
    Some((version, caps.get(2)?.as_str()))
}

/// Convert a dash- or snake-case identifier into a type-like name.
///
/// `create_users` and `create-users` both become `CreateUsers`; an identifier
/// that is already camel case keeps its inner capitals.
pub fn type_name(identifier: &str) -> String {
    identifier
        .split(['_', '-'])
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "version_test.rs"]
mod tests;
