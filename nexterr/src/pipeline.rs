//! One diagnostic pass: tool run, marker scan, parse, filter.

use anyhow::Result;
use tracing::{debug, instrument};

use crate::core::filter::Filter;
use crate::core::parser::parse_diagnostics;
use crate::core::types::{Diagnostic, DiagnosticSet};
use crate::io::markers::MarkerScan;
use crate::io::tool::BuildTool;

pub struct Pipeline<T: BuildTool> {
    tool: T,
    filter: Filter,
    markers: Option<MarkerScan>,
}

impl<T: BuildTool> Pipeline<T> {
    pub fn new(tool: T, filter: Filter, markers: Option<MarkerScan>) -> Self {
        Self {
            tool,
            filter,
            markers,
        }
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Run one pass and return the filtered set.
    ///
    /// Marker hits come first, then compiler diagnostics in emission order.
    /// Tool output is only parsed when the tool reports failure; the marker
    /// scan runs regardless. Fails only if the tool cannot be started.
    #[instrument(skip_all)]
    pub fn collect(&self) -> Result<DiagnosticSet> {
        let run = self.tool.run()?;
        let mut items: Vec<Diagnostic> = self
            .markers
            .as_ref()
            .map(MarkerScan::scan)
            .unwrap_or_default();
        let marker_hits = items.len();
        if !run.success {
            items.extend(parse_diagnostics(&run.output));
        }
        let parsed = items.len();
        let set: DiagnosticSet = items
            .into_iter()
            .filter(|diagnostic| self.filter.allows(diagnostic))
            .collect();
        debug!(
            success = run.success,
            marker_hits,
            parsed,
            kept = set.len(),
            "diagnostic pass finished"
        );
        Ok(set)
    }
}
