//! Error-stream navigator for the build/edit loop.
//!
//! Repeatedly runs a build or test command, focuses the editor on the first
//! unresolved diagnostic, and moves focus only when that diagnostic's location
//! disappears from the output. The crate keeps the same split as a
//! deterministic runner:
//!
//! - **[`core`]**: Pure logic (parsing, filtering, focus state machine).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting collaborators (subprocess, editor, filesystem
//!   watch, marker scan, config file), each behind a trait or plain function.
//!
//! Orchestration modules ([`pipeline`], [`engine`], [`looping`]) wire the core
//! logic to the collaborators and implement the CLI commands.

pub mod core;
pub mod engine;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
