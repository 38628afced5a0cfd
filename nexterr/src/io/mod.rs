//! I/O collaborators for the navigator.

pub mod config;
pub mod editor;
pub mod markers;
pub mod process;
pub mod tool;
pub mod watch;
