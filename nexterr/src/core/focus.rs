//! Focus state machine: which diagnostic is current, and when focus moves.
//!
//! States:
//!
//! - **Idle**: nothing focused; the last pass was empty (or none ran yet).
//! - **Focused**: `current` is set and `position` indexes the latest set.
//!
//! Focus moves only when the current location key is absent from a new
//! non-empty set; reordering around a still-present diagnostic is not a move.

use crate::core::types::{Diagnostic, DiagnosticSet};

/// Result of feeding one pass into the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The current diagnostic is still present (or nothing changed while idle
    /// with an empty set); no side effects.
    Unchanged,
    /// `next` became current. `previous` is the diagnostic it replaced, if any.
    Focus {
        previous: Option<Diagnostic>,
        next: Diagnostic,
    },
    /// The pass was empty. `previous` is the diagnostic that lost focus, if any.
    Idle { previous: Option<Diagnostic> },
}

#[derive(Debug, Default)]
pub struct FocusTracker {
    current: Option<Diagnostic>,
    position: usize,
    latest: DiagnosticSet,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Diagnostic> {
        self.current.as_ref()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn latest(&self) -> &DiagnosticSet {
        &self.latest
    }

    /// Replace the latest set and decide whether focus moves.
    ///
    /// Every move resets `position` to 0.
    pub fn observe(&mut self, set: DiagnosticSet) -> Transition {
        let transition = match set.first().cloned() {
            None => {
                self.position = 0;
                match self.current.take() {
                    Some(previous) => Transition::Idle {
                        previous: Some(previous),
                    },
                    None => Transition::Unchanged,
                }
            }
            Some(_) if self.current_in(&set) => {
                if self.position >= set.len() {
                    self.position = 0;
                }
                Transition::Unchanged
            }
            Some(first) => {
                self.position = 0;
                let previous = self.current.replace(first.clone());
                Transition::Focus {
                    previous,
                    next: first,
                }
            }
        };
        self.latest = set;
        transition
    }

    /// Advance the manual-navigation pointer and return the entry to peek at.
    ///
    /// Wraps from the last entry back to 0. Never changes `current`.
    pub fn step(&mut self) -> Option<&Diagnostic> {
        let len = self.latest.len();
        if len == 0 {
            return None;
        }
        self.position = (self.position + 1) % len;
        self.latest.get(self.position)
    }

    fn current_in(&self, set: &DiagnosticSet) -> bool {
        self.current
            .as_ref()
            .is_some_and(|current| set.contains_location(current))
    }
}
