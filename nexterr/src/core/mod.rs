//! Deterministic, pure logic for the diagnostic pipeline.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod filter;
pub mod focus;
pub mod parser;
pub mod types;
