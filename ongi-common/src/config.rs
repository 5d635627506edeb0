//! Bootstrap configuration discovery and loading
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. User config directory (`~/.config/ongi/<file>`)
//! 4. System config (`/etc/ongi/<file>`, Linux only)
//!
//! When no file is found the caller's built-in defaults apply.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Logging section shared by every service's TOML file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Locate the bootstrap TOML file for a service
///
/// Returns `None` when neither an explicit path nor a default file exists.
/// An explicit path (CLI or environment) is returned even if missing so that
/// loading reports the error instead of silently using defaults.
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_candidates(file_name)
        .into_iter()
        .find(|candidate| candidate.exists())
}

/// Platform config file locations, most specific first
fn default_config_candidates(file_name: &str) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("ongi").join(file_name));
    }
    if cfg!(target_os = "linux") {
        candidates.push(PathBuf::from("/etc/ongi").join(file_name));
    }

    candidates
}

/// Load a TOML config file, or the type's defaults when `path` is `None`
pub fn load_toml_config<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        debug!("No config file found, using built-in defaults");
        return Ok(T::default());
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// OS-dependent default data folder (database location)
pub fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/ongi (or /var/lib/ongi for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("ongi"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/ongi"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("ongi"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/ongi"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("ongi"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\ongi"))
    } else {
        PathBuf::from("./ongi_data")
    }
}
