//! State-file location.
//!
//! Precedence: explicit path > `AGENTS_COUNCIL_STATE_PATH` > the default under
//! the user's home directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Environment variable overriding the state-file location.
pub const STATE_PATH_ENV: &str = "AGENTS_COUNCIL_STATE_PATH";
pub const COUNCIL_DIR_NAME: &str = ".agents-council";
pub const STATE_FILE_NAME: &str = "state.json";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolve the state path from `explicit`, the environment, or the default.
pub fn resolve_state_path(explicit: Option<&str>) -> Result<PathBuf> {
    let env_override = std::env::var(STATE_PATH_ENV).ok();
    resolve_state_path_with(
        explicit,
        env_override.as_deref(),
        dirs::home_dir().as_deref(),
    )
}

/// Same as [`resolve_state_path`] with the environment and home directory
/// passed in.
pub fn resolve_state_path_with(
    explicit: Option<&str>,
    env_override: Option<&str>,
    home: Option<&Path>,
) -> Result<PathBuf> {
    let chosen = [explicit, env_override]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty());
    if let Some(candidate) = chosen {
        return normalize_path(candidate, home);
    }
    let home = home.context("cannot determine home directory for the default state path")?;
    Ok(home.join(COUNCIL_DIR_NAME).join(STATE_FILE_NAME))
}

/// Expand `~` / `~/...` against `home` and make relative paths absolute.
pub fn normalize_path(input: &str, home: Option<&Path>) -> Result<PathBuf> {
    let expanded = if input == "~" {
        home.context("cannot expand '~' without a home directory")?
            .to_path_buf()
    } else if let Some(rest) = input.strip_prefix("~/") {
        home.with_context(|| format!("cannot expand '{input}' without a home directory"))?
            .join(rest)
    } else {
        PathBuf::from(input)
    };
    std::path::absolute(&expanded).with_context(|| format!("resolve path {}", expanded.display()))
}

/// Sibling lock file: `<state path>.lock`.
pub fn lock_path_for(state_path: &Path) -> PathBuf {
    let mut raw: OsString = state_path.as_os_str().to_owned();
    raw.push(".lock");
    PathBuf::from(raw)
}

/// `config.toml` next to the state file.
pub fn config_path_for(state_path: &Path) -> PathBuf {
    state_path
        .parent()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins_over_environment() {
        let home = Path::new("/home/agent");
        let path = resolve_state_path_with(Some("/tmp/a.json"), Some("/tmp/b.json"), Some(home))
            .expect("resolve");
        assert_eq!(path, PathBuf::from("/tmp/a.json"));
    }

    #[test]
    fn blank_explicit_path_falls_through_to_environment() {
        let home = Path::new("/home/agent");
        let path = resolve_state_path_with(Some("   "), Some(" ~/council.json "), Some(home))
            .expect("resolve");
        assert_eq!(path, PathBuf::from("/home/agent/council.json"));
    }

    #[test]
    fn default_lives_under_home() {
        let home = Path::new("/home/agent");
        let path = resolve_state_path_with(None, None, Some(home)).expect("resolve");
        assert_eq!(path, PathBuf::from("/home/agent/.agents-council/state.json"));
    }

    #[test]
    fn default_without_home_is_an_error() {
        assert!(resolve_state_path_with(None, None, None).is_err());
    }

    #[test]
    fn relative_paths_become_absolute() {
        let path = normalize_path("state/council.json", None).expect("normalize");
        assert!(path.is_absolute());
        assert!(path.ends_with("state/council.json"));
    }

    #[test]
    fn sibling_paths() {
        let state = Path::new("/data/council/state.json");
        assert_eq!(lock_path_for(state), PathBuf::from("/data/council/state.json.lock"));
        assert_eq!(config_path_for(state), PathBuf::from("/data/council/config.toml"));
    }
}
