//! Cross-process advisory lock over `<state path>.lock`.
//!
//! Exclusivity comes solely from create-only file creation: whoever creates
//! the lock file holds the lock until it deletes it. Every process touching
//! the state file has to go through [`acquire`].
//!
//! A holder that died without releasing leaves its file behind; once the
//! file's mtime is older than [`LockOptions::stale_after`], waiters delete it
//! and try again. Two waiters can both decide the same file is stale; that
//! window is tolerated, not fenced.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(50);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    /// Age after which an existing lock file is presumed abandoned.
    pub stale_after: Duration,
    /// Sleep between attempts while the lock is held elsewhere.
    pub retry_delay: Duration,
    /// Total wait before giving up with [`LockError::Timeout`].
    pub max_wait: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

#[derive(Debug, Error)]
pub enum LockError {
    #[error("timed out after {waited:?} waiting for state lock {}", path.display())]
    Timeout { path: PathBuf, waited: Duration },
    #[error("state lock {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Lock file contents. Only for humans inspecting a stuck lock; the locking
/// logic looks at the file's mtime, never its payload.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockPayload {
    pid: u32,
    created_at: DateTime<Utc>,
}

/// Held lock. Dropping the guard releases it.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release explicitly, surfacing any error `Drop` would only log.
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        remove_lock(&self.path)
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = remove_lock(&self.path) {
            warn!(error = %err, "failed to release state lock");
        }
    }
}

/// Block until the lock at `lock_path` is ours or `options.max_wait` elapses.
pub fn acquire(lock_path: &Path, options: &LockOptions) -> Result<LockGuard, LockError> {
    let start = Instant::now();
    loop {
        match try_create(lock_path) {
            Ok(()) => {
                debug!(
                    path = %lock_path.display(),
                    waited = ?start.elapsed(),
                    "state lock acquired"
                );
                return Ok(LockGuard {
                    path: lock_path.to_path_buf(),
                    released: false,
                });
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
            Err(source) => {
                return Err(LockError::Io {
                    path: lock_path.to_path_buf(),
                    source,
                });
            }
        }

        if is_stale(lock_path, options.stale_after).map_err(|source| LockError::Io {
            path: lock_path.to_path_buf(),
            source,
        })? {
            warn!(path = %lock_path.display(), "reclaiming stale state lock");
            remove_lock(lock_path)?;
            continue;
        }

        let waited = start.elapsed();
        if waited >= options.max_wait {
            return Err(LockError::Timeout {
                path: lock_path.to_path_buf(),
                waited,
            });
        }
        thread::sleep(options.retry_delay.min(options.max_wait - waited));
    }
}

/// Delete the lock file. Already gone is fine.
pub fn remove_lock(lock_path: &Path) -> Result<(), LockError> {
    match fs::remove_file(lock_path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(LockError::Io {
            path: lock_path.to_path_buf(),
            source,
        }),
    }
}

fn try_create(lock_path: &Path) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(lock_path)?;
    let payload = LockPayload {
        pid: std::process::id(),
        created_at: Utc::now(),
    };
    let written = serde_json::to_vec(&payload)
        .map_err(io::Error::other)
        .and_then(|bytes| file.write_all(&bytes));
    if let Err(err) = written {
        drop(file);
        let _ = fs::remove_file(lock_path);
        return Err(err);
    }
    Ok(())
}

/// A lock that disappeared between the create attempt and the stat is not
/// stale; the next attempt will simply succeed.
fn is_stale(lock_path: &Path, stale_after: Duration) -> io::Result<bool> {
    let modified = match fs::metadata(lock_path).and_then(|meta| meta.modified()) {
        Ok(modified) => modified,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO);
    Ok(age > stale_after)
}
