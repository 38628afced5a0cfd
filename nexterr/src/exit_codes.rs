//! Stable exit codes for nexterr CLI commands.

/// Command succeeded, or the loop stopped because no diagnostics remain.
pub const OK: i32 = 0;
/// Invalid configuration, tool spawn failure, or other fatal errors.
pub const INVALID: i32 = 1;
/// `nexterr list` found at least one diagnostic.
pub const DIAGNOSTICS: i32 = 2;
