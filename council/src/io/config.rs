//! Council configuration stored in `config.toml` next to the state file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::io::atomic::write_atomic;
use crate::io::lock::LockOptions;
use crate::io::watcher::WatchOptions;

/// Council configuration (TOML).
///
/// Every section and field is optional; missing values take the defaults
/// every process would use without a file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct CouncilConfig {
    pub lock: LockConfig,
    pub watch: WatchConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LockConfig {
    /// Lock files older than this are presumed abandoned.
    pub stale_after_ms: u64,
    pub retry_delay_ms: u64,
    /// Give up waiting for the lock after this long.
    pub max_wait_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            stale_after_ms: 30_000,
            retry_delay_ms: 50,
            max_wait_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period after the last change before subscribers are notified.
    pub debounce_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            poll_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UiConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5123,
        }
    }
}

impl CouncilConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lock.retry_delay_ms == 0 {
            return Err(anyhow!("lock.retry_delay_ms must be > 0"));
        }
        if self.lock.max_wait_ms == 0 {
            return Err(anyhow!("lock.max_wait_ms must be > 0"));
        }
        if self.lock.stale_after_ms <= self.lock.retry_delay_ms {
            return Err(anyhow!("lock.stale_after_ms must exceed retry_delay_ms"));
        }
        if self.watch.poll_interval_ms == 0 {
            return Err(anyhow!("watch.poll_interval_ms must be > 0"));
        }
        if self.ui.bind.trim().is_empty() {
            return Err(anyhow!("ui.bind must be non-empty"));
        }
        if self.ui.port == 0 {
            return Err(anyhow!("ui.port must be between 1 and 65535"));
        }
        Ok(())
    }

    pub fn lock_options(&self) -> LockOptions {
        LockOptions {
            stale_after: Duration::from_millis(self.lock.stale_after_ms),
            retry_delay: Duration::from_millis(self.lock.retry_delay_ms),
            max_wait: Duration::from_millis(self.lock.max_wait_ms),
        }
    }

    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            debounce: Duration::from_millis(self.watch.debounce_ms),
            poll_interval: Duration::from_millis(self.watch.poll_interval_ms),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `CouncilConfig::default()`.
pub fn load_config(path: &Path) -> Result<CouncilConfig> {
    if !path.exists() {
        return Ok(CouncilConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CouncilConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate().with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk.
pub fn write_config(path: &Path, cfg: &CouncilConfig) -> Result<()> {
    cfg.validate()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}
