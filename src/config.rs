use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8005";
pub const DEFAULT_GREETING: &str =
    "こんにちは。ドキュメントに基づいた質問にお答えします。何かお手伝いしましょうか？";
/// The backend rejects questions longer than this.
pub const DEFAULT_MAX_QUESTION_CHARS: usize = 1000;

/// Client settings, resolved once at startup and shared read-only by the
/// chat session and the upload form.
///
/// Loaded from `~/.config/aozora-client/config.toml` when present. Every
/// field has a default, so an empty file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL for both `/chat/` and `/upload`.
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    /// Assistant greeting shown before the first question.
    pub greeting: String,
    pub max_question_chars: usize,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 60,
            upload_timeout_secs: 300,
            greeting: DEFAULT_GREETING.to_string(),
            max_question_chars: DEFAULT_MAX_QUESTION_CHARS,
            log_level: "warn".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ClientConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Like [`ClientConfig::load`], but a missing file yields defaults.
    /// A file that exists and is broken is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "request_timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }
        if self.upload_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "upload_timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }
        if self.max_question_chars == 0 {
            return Err(ConfigError::Invalid {
                key: "max_question_chars",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}

/// `~/.config/aozora-client/config.toml` (platform config dir).
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aozora-client")
        .join("config.toml")
}
