//! The shared council document on disk.
//!
//! [`CouncilStateStore::update`] is the only mutation entry point: it runs
//! load -> transform -> atomic write as one critical section, guarded by a
//! process-local mutex and the cross-process lock file.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::types::{CouncilState, Transition};
use crate::io::atomic::write_json_atomic;
use crate::io::lock::{self, LockOptions};
use crate::io::path::{lock_path_for, resolve_state_path};

/// Load/update contract shared by every front end.
pub trait CouncilStateStore {
    /// Current document; a store that has never been written reads as empty.
    fn load(&self) -> Result<CouncilState>;

    /// Apply `transform` to the current document and persist its `next`
    /// state. Nothing is written when `transform` fails.
    fn update<T, F>(&self, transform: F) -> Result<T>
    where
        F: FnOnce(CouncilState) -> Result<Transition<T>>;
}

/// Callers in one process are serialized per path before they contend for
/// the lock file, even when they hold distinct store instances.
static LOCAL_LOCKS: LazyLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn local_lock_for(path: &Path) -> Arc<Mutex<()>> {
    let mut locks = LOCAL_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    locks.entry(path.to_path_buf()).or_default().clone()
}

/// JSON document at a fixed path with a sibling `.lock` file.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock_options: LockOptions,
    local: Arc<Mutex<()>>,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            lock_path: lock_path_for(&path),
            local: local_lock_for(&path),
            lock_options: LockOptions::default(),
            path,
        }
    }

    /// Store at the resolved location (explicit > env > default).
    pub fn open(explicit: Option<&str>) -> Result<Self> {
        Ok(Self::new(resolve_state_path(explicit)?))
    }

    pub fn with_lock_options(mut self, lock_options: LockOptions) -> Self {
        self.lock_options = lock_options;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Overwrite the document outright, still under the lock.
    pub fn save(&self, state: &CouncilState) -> Result<()> {
        self.locked(|| write_json_atomic(&self.path, state))
    }

    fn locked<T>(&self, action: impl FnOnce() -> Result<T>) -> Result<T> {
        self.ensure_directory()?;
        let _local = self.local.lock().unwrap_or_else(PoisonError::into_inner);
        let guard = lock::acquire(&self.lock_path, &self.lock_options)?;
        let outcome = action();
        // Release errors are only worth surfacing when the action succeeded.
        match (outcome, guard.release()) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err.into()),
            (Err(err), _) => Err(err),
        }
    }

    fn ensure_directory(&self) -> Result<()> {
        let parent = self
            .path
            .parent()
            .with_context(|| format!("state path missing parent {}", self.path.display()))?;
        fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))
    }
}

impl CouncilStateStore for FileStateStore {
    fn load(&self) -> Result<CouncilState> {
        read_state(&self.path)
    }

    fn update<T, F>(&self, transform: F) -> Result<T>
    where
        F: FnOnce(CouncilState) -> Result<Transition<T>>,
    {
        self.locked(|| {
            let current = read_state(&self.path)?;
            let Transition { next, result } = transform(current)?;
            write_json_atomic(&self.path, &next)
                .with_context(|| format!("write state {}", self.path.display()))?;
            debug!(
                path = %self.path.display(),
                requests = next.requests.len(),
                feedback = next.feedback.len(),
                participants = next.participants.len(),
                "state updated"
            );
            Ok(result)
        })
    }
}

fn read_state(path: &Path) -> Result<CouncilState> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no state file yet, starting empty");
            return Ok(CouncilState::default());
        }
        Err(err) => return Err(err).with_context(|| format!("read state {}", path.display())),
    };
    serde_json::from_str(&contents).with_context(|| format!("parse state {}", path.display()))
}
