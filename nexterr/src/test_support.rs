//! Test-only collaborators: scripted tool, recording editor, fake watcher.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, bail};

use crate::core::types::Diagnostic;
use crate::io::editor::Editor;
use crate::io::tool::{BuildTool, ToolRun};
use crate::io::watch::PathWatcher;

impl ToolRun {
    /// A failed run with the given combined output.
    pub fn failing(output: &str) -> Self {
        Self {
            output: output.to_string(),
            success: false,
        }
    }

    /// A successful run with no output.
    pub fn passing() -> Self {
        Self {
            output: String::new(),
            success: true,
        }
    }
}

/// Tool that replays queued runs, then fails as if the binary vanished.
pub struct ScriptedTool {
    runs: RefCell<VecDeque<ToolRun>>,
    calls: Cell<usize>,
}

impl ScriptedTool {
    pub fn new(runs: Vec<ToolRun>) -> Self {
        Self {
            runs: RefCell::new(runs.into()),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl BuildTool for ScriptedTool {
    fn run(&self) -> Result<ToolRun> {
        self.calls.set(self.calls.get() + 1);
        self.runs
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("spawn command: scripted tool exhausted"))
    }
}

/// Editor that records every location it was asked to open.
#[derive(Default)]
pub struct RecordingEditor {
    opened: RefCell<Vec<String>>,
    fail: bool,
}

impl RecordingEditor {
    /// Editor whose launches always fail (after recording the attempt).
    pub fn failing() -> Self {
        Self {
            opened: RefCell::new(Vec::new()),
            fail: true,
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }
}

impl Editor for RecordingEditor {
    fn open(&self, diagnostic: &Diagnostic) -> Result<()> {
        self.opened.borrow_mut().push(diagnostic.key().to_string());
        if self.fail {
            bail!("editor unavailable");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOp {
    Add(PathBuf),
    Remove(PathBuf),
}

/// In-memory watcher recording operations; `add` fails for configured paths.
#[derive(Default)]
pub struct FakeWatcher {
    registered: BTreeSet<PathBuf>,
    ops: Vec<WatchOp>,
    /// Remaining failed `add` calls per path.
    failing: BTreeMap<PathBuf, usize>,
}

impl FakeWatcher {
    /// Every `add` of these paths fails.
    pub fn failing_on<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            failing: paths
                .into_iter()
                .map(|path| (path.into(), usize::MAX))
                .collect(),
            ..Self::default()
        }
    }

    /// The first `times` calls to `add(path)` fail, later ones succeed.
    pub fn failing_first(path: impl Into<PathBuf>, times: usize) -> Self {
        Self {
            failing: BTreeMap::from([(path.into(), times)]),
            ..Self::default()
        }
    }

    pub fn registered(&self) -> Vec<PathBuf> {
        self.registered.iter().cloned().collect()
    }

    pub fn ops(&self) -> Vec<WatchOp> {
        self.ops.clone()
    }
}

impl PathWatcher for FakeWatcher {
    fn add(&mut self, path: &Path) -> Result<()> {
        if let Some(remaining) = self.failing.get_mut(path)
            && *remaining > 0
        {
            *remaining = remaining.saturating_sub(1);
            bail!("{} does not exist", path.display());
        }
        self.ops.push(WatchOp::Add(path.to_path_buf()));
        self.registered.insert(path.to_path_buf());
        assert!(self.registered.len() <= 1, "more than one active watch");
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> Result<()> {
        self.ops.push(WatchOp::Remove(path.to_path_buf()));
        if !self.registered.remove(path) {
            bail!("{} was not watched", path.display());
        }
        Ok(())
    }
}
