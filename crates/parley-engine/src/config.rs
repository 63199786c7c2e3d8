//! Client configuration.
//!
//! Stored as JSON in `.parley/config.json`. The base URL of the
//! conversation service always comes from here (or a CLI override); the
//! user identity may be set here or supplied per invocation.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the parley client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the conversation service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// The current user's participant identifier, if configured.
    #[serde(default)]
    pub user_name: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8080".into()
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// The user identifier to act as, preferring an explicit override.
    ///
    /// Returns an empty string when neither is set; an empty identifier
    /// suppresses the conversation list fetch rather than erroring.
    pub fn resolve_user(&self, override_name: Option<&str>) -> String {
        override_name
            .map(str::to_string)
            .or_else(|| self.user_name.clone())
            .unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_name: None,
        }
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert!(config.user_name.is_none());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".parley").join("config.json");

        let config = Config {
            base_url: "http://chat.example.com".into(),
            user_name: Some("alice".into()),
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.base_url, "http://chat.example.com");
        assert_eq!(loaded.user_name.as_deref(), Some("alice"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert!(config.user_name.is_none());
    }

    #[test]
    fn test_resolve_user_precedence() {
        let config = Config {
            base_url: default_base_url(),
            user_name: Some("alice".into()),
        };
        assert_eq!(config.resolve_user(Some("bob")), "bob");
        assert_eq!(config.resolve_user(None), "alice");
        assert_eq!(Config::default().resolve_user(None), "");
    }
}
