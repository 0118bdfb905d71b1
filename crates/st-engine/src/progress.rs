//! Progress output for migration runs.
//!
//! Progress lines are a side channel: they go to stdout (or an in-memory
//! buffer in tests) and never influence return values. Most lines are gated by
//! the verbosity flag; abort notices and dry-run intents use [`Reporter::always`].

use st_core::VersionKey;
use std::sync::{Arc, Mutex};

/// Width that announcement lines are padded to with `=`.
const ANNOUNCE_WIDTH: usize = 78;

#[derive(Clone)]
enum Sink {
    Stdout,
    Buffer(Arc<Mutex<Vec<String>>>),
}

/// Writes progress lines for the engine.
#[derive(Clone)]
pub struct Reporter {
    verbose: bool,
    sink: Sink,
}

/// Lines collected by a capturing [`Reporter`].
#[derive(Clone, Default)]
pub struct CapturedOutput(Arc<Mutex<Vec<String>>>);

impl CapturedOutput {
    /// All lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().map(|lines| lines.clone()).unwrap_or_default()
    }

    /// True if any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl Reporter {
    /// Reporter printing to stdout.
    pub fn stdout(verbose: bool) -> Self {
        Self {
            verbose,
            sink: Sink::Stdout,
        }
    }

    /// Reporter collecting lines in memory, returned alongside a handle to read them.
    pub fn captured(verbose: bool) -> (Self, CapturedOutput) {
        let output = CapturedOutput::default();
        let reporter = Self {
            verbose,
            sink: Sink::Buffer(Arc::clone(&output.0)),
        };
        (reporter, output)
    }

    /// Whether gated output is printed.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Write a line if verbose.
    pub fn write(&self, text: &str) {
        if self.verbose {
            self.emit(text);
        }
    }

    /// Write a line regardless of verbosity.
    pub fn always(&self, text: &str) {
        self.emit(text);
    }

    /// `== <version> <name>: <text> ====` header, if verbose.
    pub fn announce(&self, version: Option<&VersionKey>, name: &str, text: &str) {
        if self.verbose {
            self.emit(&announcement(version, name, text));
        }
    }

    /// Announcement that is printed regardless of verbosity.
    pub fn announce_always(&self, version: Option<&VersionKey>, name: &str, text: &str) {
        self.emit(&announcement(version, name, text));
    }

    /// `-- message`
    pub fn say(&self, message: &str) {
        self.write(&format!("-- {message}"));
    }

    /// `   -> message`
    pub fn say_sub(&self, message: &str) {
        self.write(&format!("   -> {message}"));
    }

    fn emit(&self, text: &str) {
        match &self.sink {
            Sink::Stdout => println!("{text}"),
            Sink::Buffer(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(text.to_string());
                }
            }
        }
    }
}

fn announcement(version: Option<&VersionKey>, name: &str, text: &str) -> String {
    let mut line = match version {
        Some(version) => format!("== {version} {name}: {text} "),
        None => format!("== {name}: {text} "),
    };
    let width = line.chars().count();
    if width < ANNOUNCE_WIDTH {
        line.push_str(&"=".repeat(ANNOUNCE_WIDTH - width));
    }
    line
}
