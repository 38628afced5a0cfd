//! The navigation loop behind `nexterr watch`.
//!
//! A single task owns the [`Engine`]. It wakes on whichever comes first: a
//! change notification for the watched file, a manual step signal, the
//! fallback timer, or shutdown. All focus mutation happens here, so no state
//! is shared with the watcher thread beyond its bounded channel.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use notify::Event as NotifyEvent;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::engine::{Engine, RefreshOutcome};
use crate::io::editor::Editor;
use crate::io::tool::BuildTool;
use crate::io::watch::PathWatcher;

/// Reason why `run_loop` stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStop {
    /// A pass yielded no diagnostics with close-on-no-error set.
    Clean,
    /// The shutdown future resolved.
    Interrupted,
}

/// Event sources feeding the loop.
pub struct LoopEvents {
    /// Change notifications from the watch backend.
    pub changes: mpsc::Receiver<NotifyEvent>,
    /// Manual step signals; `None` disables stepping.
    pub steps: Option<mpsc::Receiver<()>>,
}

/// Run refresh passes until a clean exit, shutdown, or a fatal error.
///
/// The first pass runs before any event is awaited; if it asks to exit the
/// loop is never entered. `on_refresh` sees every pass outcome.
pub async fn run_loop<T, E, W, S, F>(
    engine: &mut Engine<T, E, W>,
    mut events: LoopEvents,
    refresh_interval: Duration,
    shutdown: S,
    mut on_refresh: F,
) -> Result<LoopStop>
where
    T: BuildTool,
    E: Editor,
    W: PathWatcher,
    S: Future,
    F: FnMut(&RefreshOutcome),
{
    let outcome = engine.refresh()?;
    on_refresh(&outcome);
    if matches!(outcome, RefreshOutcome::Exit { .. }) {
        return Ok(LoopStop::Clean);
    }

    let mut tick = tokio::time::interval_at(Instant::now() + refresh_interval, refresh_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutting down");
                engine.shutdown();
                return Ok(LoopStop::Interrupted);
            }
            Some(event) = events.changes.recv() => {
                if !engine.watch().is_relevant(&event) {
                    debug!(kind = ?event.kind, paths = ?event.paths, "ignoring change");
                    continue;
                }
                debug!("watched file changed");
            }
            Some(()) = next_step(&mut events.steps) => {
                engine.step();
                continue;
            }
            _ = tick.tick() => {
                debug!("refresh timer fired");
            }
        }

        // The tool runs synchronously; nothing else is polled until it finishes.
        let outcome = engine.refresh()?;
        on_refresh(&outcome);
        if matches!(outcome, RefreshOutcome::Exit { .. }) {
            return Ok(LoopStop::Clean);
        }
        tick.reset();
    }
}

async fn next_step(steps: &mut Option<mpsc::Receiver<()>>) -> Option<()> {
    match steps {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
