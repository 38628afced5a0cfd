//! Single-path filesystem watch.
//!
//! [`WatchController`] keeps at most one registration alive on a
//! [`PathWatcher`] backend. [`NotifyWatcher`] is the production backend; it
//! forwards change events into a bounded channel, dropping events while the
//! channel is full.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use notify::{Event as NotifyEvent, EventKind, PollWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Pending change notifications kept while the loop is busy.
pub const CHANGE_QUEUE_CAPACITY: usize = 2;

/// Backend able to register and unregister single paths.
pub trait PathWatcher {
    fn add(&mut self, path: &Path) -> Result<()>;
    fn remove(&mut self, path: &Path) -> Result<()>;
}

/// `notify` poll watcher feeding a bounded channel.
pub struct NotifyWatcher {
    inner: PollWatcher,
}

impl NotifyWatcher {
    /// Create the backend and the receiving end of its event channel.
    pub fn new(poll_interval: Duration) -> Result<(Self, mpsc::Receiver<NotifyEvent>)> {
        let (tx, rx) = mpsc::channel::<NotifyEvent>(CHANGE_QUEUE_CAPACITY);
        let inner = PollWatcher::new(
            move |res: Result<NotifyEvent, notify::Error>| match res {
                Ok(event) => {
                    // Full queue: a refresh is already pending.
                    let _ = tx.try_send(event);
                }
                Err(err) => warn!(err = %err, "watch backend error"),
            },
            // Poll mtimes have whole-second resolution; hashing catches quick saves.
            notify::Config::default()
                .with_poll_interval(poll_interval)
                .with_compare_contents(true),
        )
        .context("create file watcher")?;
        Ok((Self { inner }, rx))
    }
}

impl PathWatcher for NotifyWatcher {
    fn add(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            bail!("{} does not exist", path.display());
        }
        self.inner
            .watch(path, RecursiveMode::NonRecursive)
            .with_context(|| format!("watch {}", path.display()))
    }

    fn remove(&mut self, path: &Path) -> Result<()> {
        self.inner
            .unwatch(path)
            .with_context(|| format!("unwatch {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveWatch {
    path: PathBuf,
    resolved: PathBuf,
}

/// Owns the single active registration.
pub struct WatchController<W: PathWatcher> {
    watcher: W,
    active: Option<ActiveWatch>,
}

impl<W: PathWatcher> WatchController<W> {
    pub fn new(watcher: W) -> Self {
        Self {
            watcher,
            active: None,
        }
    }

    pub fn watcher(&self) -> &W {
        &self.watcher
    }

    /// Path currently registered, as given to [`set_watch`](Self::set_watch).
    pub fn active(&self) -> Option<&Path> {
        self.active.as_ref().map(|active| active.path.as_path())
    }

    /// Replace any prior registration with `path`.
    ///
    /// On failure nothing stays registered.
    pub fn set_watch(&mut self, path: &Path) -> Result<()> {
        self.clear();
        self.watcher.add(path)?;
        let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        info!(path = %path.display(), "watching");
        self.active = Some(ActiveWatch {
            path: path.to_path_buf(),
            resolved,
        });
        Ok(())
    }

    /// Remove the active registration, if any.
    pub fn clear(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        debug!(path = %active.path.display(), "unwatching");
        if let Err(err) = self.watcher.remove(&active.path) {
            warn!(path = %active.path.display(), err = %err, "failed to remove watch");
        }
    }

    /// True if `event` is a content change on the watched path.
    pub fn is_relevant(&self, event: &NotifyEvent) -> bool {
        let Some(active) = &self.active else {
            return false;
        };
        if !matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) {
            return false;
        }
        event
            .paths
            .iter()
            .any(|path| path == &active.path || path == &active.resolved)
    }
}
