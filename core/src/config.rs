//! Configuration Loading
//!
//! Centralized configuration for the chat session, supporting a TOML file
//! at `~/.config/murmur/murmur.toml` with environment overrides.
//!
//! # Configuration Priority
//!
//! Values are loaded with the following priority (highest first):
//! 1. Environment variables
//! 2. TOML configuration file
//! 3. Default values
//!
//! A missing config file is not an error (defaults are used); a file that
//! exists but cannot be parsed is.
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! host = "localhost"
//! port = 11434
//! request_timeout_secs = 120
//!
//! [chat]
//! model = "llama3.1"
//! system_prompt = "You are murmur, a concise local assistant."
//! channel_capacity = 100
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default system prompt used when neither file nor environment set one
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are murmur, a helpful assistant running on a locally hosted model. \
     Be concise and direct.";

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Backend section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Inference server host
    pub host: Option<String>,
    /// Inference server port
    pub port: Option<u16>,
    /// Whole-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

/// Chat section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatToml {
    /// Model identifier to request
    pub model: Option<String>,
    /// System prompt seeded into every conversation
    pub system_prompt: Option<String>,
    /// Token delivery channel capacity
    pub channel_capacity: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MurmurToml {
    /// Backend configuration section
    pub backend: BackendToml,
    /// Chat configuration section
    pub chat: ChatToml,
}

/// Resolved configuration for the chat session and its backend
#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// Inference server host
    pub host: String,
    /// Inference server port
    pub port: u16,
    /// Model identifier to request
    pub model: String,
    /// System prompt seeded into every conversation (and re-seeded on reset)
    pub system_prompt: String,
    /// Whole-request timeout, covering the full streamed response
    pub request_timeout: Duration,
    /// Capacity of the token delivery channel; bounds memory when the
    /// consumer stalls
    pub channel_capacity: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 11434,
            model: "llama3.1".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            request_timeout: Duration::from_secs(120),
            channel_capacity: 100,
        }
    }
}

impl ChatConfig {
    /// Create configuration from environment variables over defaults,
    /// skipping the config file entirely
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        apply_env_config(&mut config);
        config
    }
}

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/murmur/murmur.toml` or
/// `~/.config/murmur/murmur.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("murmur").join("murmur.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or
/// parsed. A missing config file is not an error.
pub fn load_config() -> Result<ChatConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file exists but cannot be
/// read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ChatConfig, ConfigError> {
    let mut config = ChatConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: MurmurToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    // Environment overrides file values
    apply_env_config(&mut config);

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ChatConfig, toml: &MurmurToml) {
    if let Some(ref host) = toml.backend.host {
        config.host = host.clone();
    }
    if let Some(port) = toml.backend.port {
        config.port = port;
    }
    if let Some(secs) = toml.backend.request_timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }

    if let Some(ref model) = toml.chat.model {
        config.model = model.clone();
    }
    if let Some(ref prompt) = toml.chat.system_prompt {
        config.system_prompt = prompt.clone();
    }
    if let Some(capacity) = toml.chat.channel_capacity {
        config.channel_capacity = capacity.max(1);
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut ChatConfig) {
    if let Ok(host) = std::env::var("MURMUR_OLLAMA_HOST") {
        config.host = host;
    }
    if let Ok(port) = std::env::var("MURMUR_OLLAMA_PORT") {
        if let Ok(p) = port.parse::<u16>() {
            config.port = p;
        }
    }
    if let Ok(model) = std::env::var("MURMUR_MODEL") {
        config.model = model;
    }
    if let Ok(prompt) = std::env::var("MURMUR_SYSTEM_PROMPT") {
        config.system_prompt = prompt;
    }
    if let Ok(timeout) = std::env::var("MURMUR_REQUEST_TIMEOUT") {
        if let Ok(secs) = timeout.parse::<u64>() {
            config.request_timeout = Duration::from_secs(secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Clean up all environment variables used by config loading.
    /// Call this at the start of tests that need clean environment state.
    fn clear_config_env_vars() {
        std::env::remove_var("MURMUR_OLLAMA_HOST");
        std::env::remove_var("MURMUR_OLLAMA_PORT");
        std::env::remove_var("MURMUR_MODEL");
        std::env::remove_var("MURMUR_SYSTEM_PROMPT");
        std::env::remove_var("MURMUR_REQUEST_TIMEOUT");
    }

    #[test]
    fn test_default_config() {
        let config = ChatConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 11434);
        assert_eq!(config.model, "llama3.1");
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.channel_capacity, 100);
        assert!(!config.system_prompt.is_empty());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(path) = default_config_path() {
            assert!(path.to_string_lossy().contains("murmur"));
            assert!(path.to_string_lossy().contains("murmur.toml"));
        }
    }

    #[test]
    fn test_parse_full_toml() {
        clear_config_env_vars();

        let toml_content = r#"
[backend]
host = "10.0.0.5"
port = 8080
request_timeout_secs = 30

[chat]
model = "custom-model"
system_prompt = "short answers only"
channel_capacity = 16
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.model, "custom-model");
        assert_eq!(config.system_prompt, "short answers only");
        assert_eq!(config.channel_capacity, 16);
    }

    #[test]
    fn test_parse_partial_toml_keeps_defaults() {
        clear_config_env_vars();

        let toml_content = r#"
[chat]
model = "partial-model"
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        assert_eq!(config.model, "partial-model");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 11434);
    }

    #[test]
    fn test_missing_file_graceful() {
        clear_config_env_vars();

        let path = PathBuf::from("/nonexistent/path/murmur.toml");
        let config = load_config_from_path(Some(path)).unwrap();
        assert_eq!(config.port, 11434);
    }

    #[test]
    fn test_malformed_toml_error() {
        let toml_content = r#"
[backend
port = "not a number"
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let result = load_config_from_path(Some(file.path().to_path_buf()));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_channel_capacity_floor() {
        clear_config_env_vars();

        let toml_content = r#"
[chat]
channel_capacity = 0
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.channel_capacity, 1);
    }

    /// Env vars may leak between parallel tests; assert only that the
    /// value is one of the two values this test could have produced.
    #[test]
    fn test_env_overrides_file() {
        clear_config_env_vars();

        let toml_content = r#"
[chat]
model = "file-model"
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        std::env::set_var("MURMUR_MODEL", "env-model");
        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();
        clear_config_env_vars();

        assert!(
            config.model == "env-model" || config.model == "file-model",
            "Expected env-model or file-model, got: {}",
            config.model
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let original = MurmurToml {
            backend: BackendToml {
                host: Some("box".to_string()),
                port: Some(4242),
                request_timeout_secs: Some(60),
            },
            chat: ChatToml {
                model: Some("test-model".to_string()),
                ..Default::default()
            },
        };

        let toml_string = toml::to_string(&original).unwrap();
        let parsed: MurmurToml = toml::from_str(&toml_string).unwrap();

        assert_eq!(parsed.backend.host, Some("box".to_string()));
        assert_eq!(parsed.backend.port, Some(4242));
        assert_eq!(parsed.backend.request_timeout_secs, Some(60));
        assert_eq!(parsed.chat.model, Some("test-model".to_string()));
    }
}
