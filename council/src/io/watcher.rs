//! Debounced change notifications for the state file.
//!
//! The containing directory is watched rather than the file itself: every
//! write replaces the file by rename, which a per-file watch would lose.

use std::ffi::OsString;
use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Event as NotifyEvent, EventKind, PollWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Trailing-edge quiet period before `on_change` runs.
    pub debounce: Duration,
    pub poll_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Changed,
    Close,
}

/// Running watch. Stops on [`StateWatcher::close`] or drop.
pub struct StateWatcher {
    watcher: Option<PollWatcher>,
    control: Sender<Signal>,
    worker: Option<JoinHandle<()>>,
}

impl StateWatcher {
    /// Stop watching and cancel any pending notification. Idempotent.
    pub fn close(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.watcher.take();
        let _ = self.control.send(Signal::Close);
        if worker.thread().id() == thread::current().id() {
            // Called from inside `on_change`; the loop sees Close once it returns.
            debug!("state watcher closed from its own callback");
            return;
        }
        if worker.join().is_err() {
            warn!("state watcher thread panicked");
        }
        debug!("state watcher closed");
    }
}

impl Drop for StateWatcher {
    fn drop(&mut self) {
        self.close();
    }
}

/// Call `on_change` once per burst of changes to `state_path`.
///
/// Errors returned by `on_change`, and panics inside it, are logged and
/// swallowed; the watcher keeps running.
pub fn watch_state<F>(
    state_path: &Path,
    options: &WatchOptions,
    on_change: F,
) -> Result<StateWatcher>
where
    F: FnMut() -> Result<()> + Send + 'static,
{
    let dir = state_path
        .parent()
        .with_context(|| format!("state path missing parent {}", state_path.display()))?;
    let target = state_path
        .file_name()
        .with_context(|| format!("state path missing file name {}", state_path.display()))?
        .to_os_string();
    fs::create_dir_all(dir).with_context(|| format!("create directory {}", dir.display()))?;

    let (control, signals) = mpsc::channel();
    let events = control.clone();
    let mut watcher = PollWatcher::new(
        move |res: notify::Result<NotifyEvent>| match res {
            Ok(event) if concerns_target(&event, &target) => {
                let _ = events.send(Signal::Changed);
            }
            Ok(_) => {}
            Err(err) => debug!(error = %err, "state watch error"),
        },
        notify::Config::default().with_poll_interval(options.poll_interval),
    )
    .context("create state watcher")?;
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("watch {}", dir.display()))?;
    info!(path = %dir.display(), "watching state directory");

    let debounce = options.debounce;
    let worker = thread::Builder::new()
        .name("council-state-watch".to_string())
        .spawn(move || debounce_loop(&signals, debounce, on_change))
        .context("spawn state watcher thread")?;

    Ok(StateWatcher {
        watcher: Some(watcher),
        control,
        worker: Some(worker),
    })
}

/// Events without a path cannot be attributed, so they count as a change.
fn concerns_target(event: &NotifyEvent, target: &OsString) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event.paths.is_empty()
        || event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(target.as_os_str()))
}

fn debounce_loop<F>(signals: &Receiver<Signal>, debounce: Duration, mut on_change: F)
where
    F: FnMut() -> Result<()>,
{
    loop {
        match signals.recv() {
            Ok(Signal::Changed) => {}
            Ok(Signal::Close) | Err(_) => return,
        }
        loop {
            match signals.recv_timeout(debounce) {
                Ok(Signal::Changed) => {}
                Err(RecvTimeoutError::Timeout) => break,
                Ok(Signal::Close) | Err(RecvTimeoutError::Disconnected) => return,
            }
        }
        match catch_unwind(AssertUnwindSafe(&mut on_change)) {
            Ok(Ok(())) => debug!("state change delivered"),
            Ok(Err(err)) => debug!(error = %err, "state change callback failed"),
            Err(_) => warn!("state change callback panicked"),
        }
    }
}
