//! Shared deterministic types for the diagnostic pipeline.
//!
//! These types are created fresh on every pass and never mutated afterwards;
//! the next pass supersedes them wholesale.

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

/// Which command produces diagnostics on each pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Compile the packages.
    Build,
    /// Run every test.
    Test,
    /// Run the tests matching a pattern.
    RunTest,
    /// Run static analysis.
    Analysis,
    /// Skip the subprocess; scan sources for a marker instead.
    Notes,
}

impl Mode {
    /// True for modes whose failures are reported inside test files.
    pub fn runs_tests(self) -> bool {
        matches!(self, Mode::Test | Mode::RunTest)
    }
}

/// One reported problem.
///
/// Identity is the [`LocationKey`]; `message` is carried for display only and
/// may change between passes while the location persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    /// 1-based; `None` when the source format omits it or reports 0.
    pub column: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        file: impl Into<String>,
        line: u32,
        column: Option<u32>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            column: column.filter(|col| *col > 0),
            message: message.into(),
        }
    }

    pub fn key(&self) -> LocationKey {
        LocationKey {
            file: self.file.clone(),
            line: self.line,
            column: self.column,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.key())
        } else {
            write!(f, "{}: {}", self.key(), self.message)
        }
    }
}

/// `file:line:column` identity of a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationKey {
    pub file: String,
    pub line: u32,
    pub column: Option<u32>,
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(column) => write!(f, "{}:{}:{}", self.file, self.line, column),
            None => write!(f, "{}:{}", self.file, self.line),
        }
    }
}

/// Ordered diagnostics from one parse+filter pass. Index 0 is the default focus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiagnosticSet {
    items: Vec<Diagnostic>,
}

impl DiagnosticSet {
    pub fn new(items: Vec<Diagnostic>) -> Self {
        Self { items }
    }

    pub fn first(&self) -> Option<&Diagnostic> {
        self.items.first()
    }

    pub fn get(&self, index: usize) -> Option<&Diagnostic> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Location-key containment, ignoring position and message.
    pub fn contains_location(&self, diagnostic: &Diagnostic) -> bool {
        let key = diagnostic.key();
        self.items.iter().any(|item| item.key() == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }
}

impl FromIterator<Diagnostic> for DiagnosticSet {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DiagnosticSet {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
