//! Apply focus decisions to the watch and the editor.
//!
//! [`Engine`] is the single owner of focus state. Each [`Engine::refresh`]
//! runs one pipeline pass, feeds the result to the [`FocusTracker`], and
//! performs the side effects of whatever transition fired. Only a tool that
//! cannot be started is fatal; editor and watch failures are logged.

use std::path::Path;

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::core::focus::{FocusTracker, Transition};
use crate::core::types::{Diagnostic, DiagnosticSet};
use crate::io::editor::Editor;
use crate::io::tool::BuildTool;
use crate::io::watch::{PathWatcher, WatchController};
use crate::pipeline::Pipeline;

/// Settings resolved once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineSettings {
    /// Stop as soon as a pass yields no diagnostics.
    pub close_on_no_error: bool,
}

/// What one refresh did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Focus stayed where it was.
    Unchanged,
    /// `focus` was opened; `fixed` is the diagnostic whose location disappeared.
    Focused {
        fixed: Option<Diagnostic>,
        focus: Diagnostic,
    },
    /// No diagnostics remain; waiting for the next refresh.
    Idle { fixed: Option<Diagnostic> },
    /// No diagnostics remain and the engine is configured to stop.
    Exit { fixed: Option<Diagnostic> },
}

impl RefreshOutcome {
    pub fn fixed(&self) -> Option<&Diagnostic> {
        match self {
            RefreshOutcome::Unchanged => None,
            RefreshOutcome::Focused { fixed, .. }
            | RefreshOutcome::Idle { fixed }
            | RefreshOutcome::Exit { fixed } => fixed.as_ref(),
        }
    }
}

pub struct Engine<T: BuildTool, E: Editor, W: PathWatcher> {
    pipeline: Pipeline<T>,
    editor: E,
    watch: WatchController<W>,
    tracker: FocusTracker,
    settings: EngineSettings,
}

impl<T: BuildTool, E: Editor, W: PathWatcher> Engine<T, E, W> {
    pub fn new(pipeline: Pipeline<T>, editor: E, watcher: W, settings: EngineSettings) -> Self {
        Self {
            pipeline,
            editor,
            watch: WatchController::new(watcher),
            tracker: FocusTracker::new(),
            settings,
        }
    }

    pub fn current(&self) -> Option<&Diagnostic> {
        self.tracker.current()
    }

    pub fn position(&self) -> usize {
        self.tracker.position()
    }

    pub fn latest(&self) -> &DiagnosticSet {
        self.tracker.latest()
    }

    pub fn watch(&self) -> &WatchController<W> {
        &self.watch
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn tool(&self) -> &T {
        self.pipeline.tool()
    }

    /// Run one pass and apply the resulting transition.
    ///
    /// Errors only when the tool cannot be started.
    #[instrument(skip_all)]
    pub fn refresh(&mut self) -> Result<RefreshOutcome> {
        let set = self.pipeline.collect()?;
        let empty = set.is_empty();
        let outcome = match self.tracker.observe(set) {
            Transition::Unchanged => {
                self.ensure_watch();
                RefreshOutcome::Unchanged
            }
            Transition::Focus { previous, next } => {
                self.apply_focus(&next);
                RefreshOutcome::Focused {
                    fixed: previous,
                    focus: next,
                }
            }
            Transition::Idle { previous } => {
                self.watch.clear();
                info!("no diagnostics");
                RefreshOutcome::Idle { fixed: previous }
            }
        };

        if empty && self.settings.close_on_no_error {
            self.watch.clear();
            let fixed = match outcome {
                RefreshOutcome::Idle { fixed } => fixed,
                _ => None,
            };
            return Ok(RefreshOutcome::Exit { fixed });
        }
        Ok(outcome)
    }

    /// Peek at the next entry of the latest set without moving focus.
    pub fn step(&mut self) -> Option<Diagnostic> {
        let peek = self.tracker.step()?.clone();
        debug!(position = self.tracker.position(), location = %peek.key(), "step");
        self.open(&peek);
        Some(peek)
    }

    /// Drop the active watch before the process exits.
    pub fn shutdown(&mut self) {
        self.watch.clear();
    }

    fn apply_focus(&mut self, next: &Diagnostic) {
        info!(location = %next.key(), "focus moved");
        self.watch.clear();
        self.open(next);
        self.register(Path::new(&next.file));
    }

    /// Re-attempt registration when the focused file has no watch.
    fn ensure_watch(&mut self) {
        if self.watch.active().is_some() {
            return;
        }
        let Some(file) = self.tracker.current().map(|current| current.file.clone()) else {
            return;
        };
        debug!(file = %file, "retrying watch registration");
        self.register(Path::new(&file));
    }

    fn register(&mut self, path: &Path) {
        if let Err(err) = self.watch.set_watch(path) {
            warn!(path = %path.display(), err = %format!("{err:#}"), "failed to watch file");
        }
    }

    fn open(&self, diagnostic: &Diagnostic) {
        if let Err(err) = self.editor.open(diagnostic) {
            warn!(location = %diagnostic.key(), err = %format!("{err:#}"), "failed to open editor");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::Filter;
    use crate::io::tool::ToolRun;
    use crate::test_support::{FakeWatcher, RecordingEditor, ScriptedTool, WatchOp};
    use std::path::PathBuf;

    fn engine(
        runs: Vec<ToolRun>,
        editor: RecordingEditor,
        watcher: FakeWatcher,
        close_on_no_error: bool,
    ) -> Engine<ScriptedTool, RecordingEditor, FakeWatcher> {
        Engine::new(
            Pipeline::new(ScriptedTool::new(runs), Filter::default(), None),
            editor,
            watcher,
            EngineSettings { close_on_no_error },
        )
    }

    fn current_key(engine: &Engine<ScriptedTool, RecordingEditor, FakeWatcher>) -> Option<String> {
        engine.current().map(|d| d.key().to_string())
    }

    #[test]
    fn first_failure_opens_and_watches_first_diagnostic() {
        let mut engine = engine(
            vec![ToolRun::failing("x.go:5:2:syntax error\n")],
            RecordingEditor::default(),
            FakeWatcher::default(),
            false,
        );

        let outcome = engine.refresh().expect("refresh");
        assert!(matches!(outcome, RefreshOutcome::Focused { fixed: None, .. }));
        assert_eq!(engine.editor().opened(), vec!["x.go:5:2"]);
        assert_eq!(engine.watch().active(), Some(Path::new("x.go")));
    }

    #[test]
    fn persisting_location_does_not_reopen_editor() {
        let mut engine = engine(
            vec![
                ToolRun::failing("a.go:10:4:undefined: x\n"),
                ToolRun::failing("b.go:1:1:new problem\na.go:10:4:undefined: x\n"),
            ],
            RecordingEditor::default(),
            FakeWatcher::default(),
            false,
        );

        engine.refresh().expect("first");
        assert_eq!(engine.refresh().expect("second"), RefreshOutcome::Unchanged);
        assert_eq!(engine.editor().opened(), vec!["a.go:10:4"]);
        assert_eq!(engine.watch().active(), Some(Path::new("a.go")));
    }

    #[test]
    fn reselection_removes_old_watch_before_adding_new() {
        let mut engine = engine(
            vec![
                ToolRun::failing("a.go:10:4:undefined: x\n"),
                ToolRun::failing("b.go:1:1:other\n"),
            ],
            RecordingEditor::default(),
            FakeWatcher::default(),
            false,
        );

        engine.refresh().expect("first");
        let outcome = engine.refresh().expect("second");
        assert_eq!(
            outcome.fixed().map(|d| d.key().to_string()),
            Some("a.go:10:4".to_string())
        );
        assert_eq!(current_key(&engine), Some("b.go:1:1".to_string()));
        assert_eq!(
            engine.watch().watcher().ops(),
            vec![
                WatchOp::Add(PathBuf::from("a.go")),
                WatchOp::Remove(PathBuf::from("a.go")),
                WatchOp::Add(PathBuf::from("b.go")),
            ]
        );
        assert_eq!(engine.editor().opened(), vec!["a.go:10:4", "b.go:1:1"]);
    }

    #[test]
    fn empty_pass_without_close_goes_idle_and_clears_watch() {
        let mut engine = engine(
            vec![ToolRun::failing("a.go:1:1:bad\n"), ToolRun::passing()],
            RecordingEditor::default(),
            FakeWatcher::default(),
            false,
        );

        engine.refresh().expect("first");
        let outcome = engine.refresh().expect("second");
        assert!(matches!(outcome, RefreshOutcome::Idle { fixed: Some(_) }));
        assert_eq!(engine.current(), None);
        assert_eq!(engine.watch().active(), None);
    }

    #[test]
    fn empty_first_pass_with_close_exits_immediately() {
        let mut engine = engine(
            vec![ToolRun::passing()],
            RecordingEditor::default(),
            FakeWatcher::default(),
            true,
        );
        assert_eq!(
            engine.refresh().expect("refresh"),
            RefreshOutcome::Exit { fixed: None }
        );
        assert!(engine.editor().opened().is_empty());
    }

    #[test]
    fn watch_failure_keeps_focus_and_retries_next_pass() {
        let mut engine = engine(
            vec![
                ToolRun::failing("gone.go:3:1:bad\n"),
                ToolRun::failing("gone.go:3:1:bad\n"),
            ],
            RecordingEditor::default(),
            FakeWatcher::failing_first("gone.go", 1),
            false,
        );

        engine.refresh().expect("first");
        assert_eq!(engine.current().map(|d| d.file.as_str()), Some("gone.go"));
        assert_eq!(engine.watch().active(), None);

        assert_eq!(engine.refresh().expect("second"), RefreshOutcome::Unchanged);
        assert_eq!(engine.watch().active(), Some(Path::new("gone.go")));
    }

    #[test]
    fn editor_failure_is_not_fatal() {
        let mut engine = engine(
            vec![ToolRun::failing("a.go:1:1:bad\n")],
            RecordingEditor::failing(),
            FakeWatcher::default(),
            false,
        );
        let outcome = engine.refresh().expect("refresh");
        assert!(matches!(outcome, RefreshOutcome::Focused { .. }));
        assert_eq!(engine.watch().active(), Some(Path::new("a.go")));
    }

    #[test]
    fn tool_start_failure_is_fatal() {
        let mut engine = engine(
            Vec::new(),
            RecordingEditor::default(),
            FakeWatcher::default(),
            false,
        );
        assert!(engine.refresh().is_err());
    }

    #[test]
    fn step_opens_peek_without_touching_focus_or_watch() {
        let mut engine = engine(
            vec![ToolRun::failing("a.go:1:1:first\nb.go:2:2:second\n")],
            RecordingEditor::default(),
            FakeWatcher::default(),
            false,
        );
        engine.refresh().expect("refresh");

        let peek = engine.step().expect("peek");
        assert_eq!(peek.key().to_string(), "b.go:2:2");
        assert_eq!(current_key(&engine), Some("a.go:1:1".to_string()));
        assert_eq!(engine.watch().active(), Some(Path::new("a.go")));
        assert_eq!(engine.editor().opened(), vec!["a.go:1:1", "b.go:2:2"]);

        engine.step().expect("wrap");
        assert_eq!(engine.position(), 0);
    }
}
