//! Noise predicates applied to parsed diagnostics.
//!
//! A diagnostic survives only if both its path and its message are free of
//! every configured noise substring. Both checks are pure and short-circuit on
//! the first match.

use crate::core::types::{Diagnostic, Mode};

/// Path substrings that mark non-actionable locations.
pub const DEFAULT_PATH_NOISE: &[&str] = &[
    "vendor",
    TEST_FILE_SUFFIX,
    "/snap/go/",
    "../",
    "/pkg/mod/",
];

/// Message substrings that mark advisory analysis output.
pub const DEFAULT_MESSAGE_NOISE: &[&str] = &["does not escape", "leaking param"];

/// Suffix exempted from path noise when the mode runs tests.
pub const TEST_FILE_SUFFIX: &str = "_test.go";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    path_noise: Vec<String>,
    message_noise: Vec<String>,
}

impl Default for Filter {
    fn default() -> Self {
        Self::new(
            DEFAULT_PATH_NOISE.iter().map(|s| s.to_string()).collect(),
            DEFAULT_MESSAGE_NOISE.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl Filter {
    pub fn new(path_noise: Vec<String>, message_noise: Vec<String>) -> Self {
        Self {
            path_noise,
            message_noise,
        }
    }

    /// Adjust the noise lists for `mode`.
    ///
    /// Test modes report failures inside test files, so the test-file entry is
    /// dropped from the path noise there.
    pub fn for_mode(mut self, mode: Mode) -> Self {
        if mode.runs_tests() {
            self.path_noise.retain(|noise| noise != TEST_FILE_SUFFIX);
        }
        self
    }

    pub fn allows(&self, diagnostic: &Diagnostic) -> bool {
        self.allows_path(&diagnostic.file) && self.allows_message(&diagnostic.message)
    }

    pub fn allows_path(&self, file: &str) -> bool {
        !self.path_noise.iter().any(|noise| file.contains(noise.as_str()))
    }

    pub fn allows_message(&self, message: &str) -> bool {
        !self
            .message_noise
            .iter()
            .any(|noise| message.contains(noise.as_str()))
    }
}
