//! Atomic replacement of JSON documents (temp file + fsync + rename).
//!
//! Readers see either the previous file or the new one, never a prefix.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

/// Pretty JSON with a trailing newline, written atomically.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(value).context("serialize json")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

/// Replace `path` with `contents`. The temp file lives in the same directory
/// so the rename never crosses filesystems.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp_path = temp_path_for(path)?;
    debug!(
        path = %path.display(),
        tmp = %tmp_path.display(),
        bytes = contents.len(),
        "writing atomically"
    );

    if let Err(err) = write_synced(&tmp_path, contents) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("replace {}", path.display()));
    }
    Ok(())
}

fn write_synced(tmp_path: &Path, contents: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(tmp_path)
        .with_context(|| format!("create temp file {}", tmp_path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    file.sync_all().with_context(|| format!("sync temp file {}", tmp_path.display()))?;
    Ok(())
}

/// `<file name>.<pid>.<unix millis>.<random>.tmp` next to `path`. Unique even
/// among writers that do not hold the lock.
fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let dir = path
        .parent()
        .with_context(|| format!("path has no parent directory {}", path.display()))?;
    let name = path
        .file_name()
        .with_context(|| format!("path has no file name {}", path.display()))?
        .to_string_lossy();
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let nonce: u64 = rand::random();
    Ok(dir.join(format!(
        "{name}.{}.{millis}.{nonce:016x}.tmp",
        std::process::id()
    )))
}
