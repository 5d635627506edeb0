//! Service configuration
//!
//! Settings come from `ongi-artifacts.toml` (see `ongi_common::config` for
//! where it is looked up), then environment variables, then CLI flags applied
//! by `main`.

use ongi_common::config::{default_data_dir, load_toml_config, resolve_config_path, LoggingConfig};
use ongi_common::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::generation::OllamaConfig;

pub const CONFIG_FILE_NAME: &str = "ongi-artifacts.toml";
pub const CONFIG_ENV_VAR: &str = "ONGI_CONFIG";

pub const OLLAMA_BASE_URL_ENV: &str = "OLLAMA_BASE_URL";
pub const OLLAMA_MODEL_ENV: &str = "OLLAMA_MODEL";
pub const STAFF_TOKEN_ENV: &str = "ONGI_STAFF_TOKEN";

/// Contents of `ongi-artifacts.toml`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Defaults to `<data dir>/ongi.db`
    pub database_path: Option<PathBuf>,
    pub staff_token: Option<String>,
    pub logging: LoggingConfig,
    pub ollama: OllamaConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5810,
            database_path: None,
            staff_token: None,
            logging: LoggingConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load the TOML file (if any) and apply environment overrides
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_path, CONFIG_ENV_VAR, CONFIG_FILE_NAME);
        if let Some(path) = &path {
            info!("Config file: {}", path.display());
        }

        let mut config: ServiceConfig = load_toml_config(path.as_deref())?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup; empty values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = get(OLLAMA_BASE_URL_ENV) {
            self.ollama.base_url = base_url;
        }
        if let Some(model) = get(OLLAMA_MODEL_ENV) {
            self.ollama.model = model;
        }
        if let Some(token) = get(STAFF_TOKEN_ENV) {
            self.staff_token = Some(token);
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| default_data_dir().join("ongi.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5810);
        assert_eq!(config.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.ollama.model, "llama3.1:8b");
        assert_eq!(config.ollama.timeout_ms, 60_000);
        assert!(config.staff_token.is_none());
        assert!(config.database_path().ends_with("ongi.db"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
port = 6000
staff_token = "s3cret"

[logging]
level = "debug"

[ollama]
model = "gemma2:9b"

[ollama.options]
temperature = 0.3
"#
        )
        .unwrap();

        let config: ServiceConfig = load_toml_config(Some(file.path())).unwrap();
        assert_eq!(config.port, 6000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.staff_token.as_deref(), Some("s3cret"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.ollama.model, "gemma2:9b");
        assert_eq!(config.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.ollama.options.temperature, 0.3);
        assert_eq!(config.ollama.options.max_tokens, 500);
    }

    #[test]
    fn test_overrides_beat_file_values() {
        let mut config = ServiceConfig {
            staff_token: Some("from-file".to_string()),
            ..ServiceConfig::default()
        };
        let env: HashMap<&str, &str> = [
            (OLLAMA_BASE_URL_ENV, "http://gpu-box:11434"),
            (OLLAMA_MODEL_ENV, ""),
            (STAFF_TOKEN_ENV, "from-env"),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.ollama.base_url, "http://gpu-box:11434");
        // Empty values do not override
        assert_eq!(config.ollama.model, "llama3.1:8b");
        assert_eq!(config.staff_token.as_deref(), Some("from-env"));
    }
}
