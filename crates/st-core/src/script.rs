//! SQL migration script format
//!
//! A script file is split into sections by marker lines:
//!
//! ```sql
//! -- migrate:up
//! -- say: Creating users
//! CREATE TABLE users (id INTEGER PRIMARY KEY);
//!
//! -- migrate:down
//! DROP TABLE users;
//! ```
//!
//! Text before the first marker is ignored. Inside a section, `-- say:` lines
//! become progress messages and everything else is grouped into SQL batches.
//! A script without a `-- migrate:down` marker does not provide `down`.

use crate::error::{CoreError, CoreResult};
use std::path::Path;

const UP_MARKER: &str = "-- migrate:up";
const DOWN_MARKER: &str = "-- migrate:down";
const SAY_PREFIX: &str = "-- say:";

/// One step of a script section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Progress message printed when the step is reached
    Say(String),
    /// SQL batch executed as-is
    Sql(String),
}

/// A parsed SQL migration script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlScript {
    /// Steps of the up section, `None` when the marker is absent
    pub up: Option<Vec<ScriptStep>>,

    /// Steps of the down section, `None` when the marker is absent
    pub down: Option<Vec<ScriptStep>>,
}

#[derive(Clone, Copy)]
enum Section {
    Preamble,
    Up,
    Down,
}

impl SqlScript {
    /// Read and parse a script file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::ScriptRead {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self::parse(&content))
    }

    /// Parse script text into up/down sections.
    pub fn parse(content: &str) -> Self {
        let mut script = SqlScript::default();
        let mut section = Section::Preamble;
        let mut chunk = String::new();

        for line in content.lines() {
            let trimmed = line.trim();
            let next = if trimmed.eq_ignore_ascii_case(UP_MARKER) {
                Some(Section::Up)
            } else if trimmed.eq_ignore_ascii_case(DOWN_MARKER) {
                Some(Section::Down)
            } else {
                None
            };

            if let Some(next) = next {
                script.flush(section, &mut chunk);
                section = next;
                script.steps_mut(section);
                continue;
            }

            if let Some(message) = say_message(trimmed) {
                script.flush(section, &mut chunk);
                if let Some(steps) = script.steps_mut(section) {
                    steps.push(ScriptStep::Say(message.trim().to_string()));
                }
                continue;
            }

            chunk.push_str(line);
            chunk.push('\n');
        }
        script.flush(section, &mut chunk);
        script
    }

    /// Template written by `generate` for a new migration named `name`.
    pub fn scaffold(name: &str) -> String {
        format!(
            "-- {name}\n\
             \n\
             {UP_MARKER}\n\
             {SAY_PREFIX} This is only an example migrate up!\n\
             \n\
             {DOWN_MARKER}\n\
             {SAY_PREFIX} This is only an example migrate down!\n"
        )
    }

    fn steps_mut(&mut self, section: Section) -> Option<&mut Vec<ScriptStep>> {
        match section {
            Section::Preamble => None,
            Section::Up => Some(self.up.get_or_insert_with(Vec::new)),
            Section::Down => Some(self.down.get_or_insert_with(Vec::new)),
        }
    }

    fn flush(&mut self, section: Section, chunk: &mut String) {
        let sql = std::mem::take(chunk);
        if !has_statement(&sql) {
            return;
        }
        if let Some(steps) = self.steps_mut(section) {
            steps.push(ScriptStep::Sql(sql.trim().to_string()));
        }
    }
}

/// True when `sql` contains something other than blank lines and line comments.
fn has_statement(sql: &str) -> bool {
    sql.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with("--")
    })
}

/// Message of a `-- say:` line, matching the prefix case-insensitively.
fn say_message(line: &str) -> Option<&str> {
    let prefix = line.get(..SAY_PREFIX.len())?;
    if prefix.eq_ignore_ascii_case(SAY_PREFIX) {
        line.get(SAY_PREFIX.len()..)
    } else {
        None
    }
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
