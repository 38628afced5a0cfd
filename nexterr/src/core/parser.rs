//! Diagnostic parsing from raw tool output.
//!
//! Two record shapes are recognised:
//!
//! - `file:line:column:message`, split on the first three `:` separators.
//! - A trace line such as `Error Trace:\t/src/pkg/a_test.go:25`, which carries
//!   only `file` and `line`.
//!
//! Anything else is noise (banners, blank lines, package headers) and is
//! skipped without error.

use crate::core::types::Diagnostic;

/// Maximum number of `:`-separated fields in a record.
pub const MAX_FIELDS: usize = 4;

/// Labels that introduce a `file:line` pair on the same line.
pub const TRACE_MARKERS: &[&str] = &["Error Trace"];

/// Parse tool output into diagnostics, in emission order.
///
/// The returned iterator is lazy and borrows `output`; collect it to keep the
/// results past the lifetime of the text.
pub fn parse_diagnostics(output: &str) -> impl Iterator<Item = Diagnostic> + '_ {
    output.lines().filter_map(parse_line)
}

/// Parse a single line, returning `None` for noise.
pub fn parse_line(line: &str) -> Option<Diagnostic> {
    let fields: Vec<&str> = line.splitn(MAX_FIELDS, ':').collect();
    match fields.as_slice() {
        [file, line, column, message] => parse_located(file, line, column, message),
        [label, file, line] if is_trace_label(label) => parse_trace(file, line),
        _ => None,
    }
}

fn parse_located(file: &str, line: &str, column: &str, message: &str) -> Option<Diagnostic> {
    let file = file.trim();
    let message = message.trim();
    if file.is_empty() || message.is_empty() {
        return None;
    }
    let line = parse_line_number(line)?;
    let column: u32 = column.trim().parse().ok()?;
    Some(Diagnostic::new(file, line, Some(column), message))
}

fn parse_trace(file: &str, line: &str) -> Option<Diagnostic> {
    let file = file.trim();
    if file.is_empty() {
        return None;
    }
    let line = parse_line_number(line)?;
    Some(Diagnostic::new(file, line, None, ""))
}

fn parse_line_number(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|line| *line > 0)
}

fn is_trace_label(label: &str) -> bool {
    TRACE_MARKERS.iter().any(|marker| label.contains(marker))
}
