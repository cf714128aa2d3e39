//! User-wide provider settings stored as TOML.
//!
//! The file lives at `<config dir>/skillc/config.toml` and holds the values
//! managed by `skc config set|list|reset`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Keys accepted by `skc config set`.
pub const VALID_KEYS: &[&str] = &["provider", "model", "api-key", "base-url"];

/// Persisted user settings. Every value is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct UserSettings {
    /// Default provider name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Default model identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom endpoint base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl UserSettings {
    /// Default location of the settings file.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|d| d.join("skillc").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Loads settings from `path`. A missing file yields empty settings.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        toml::from_str(&content).map_err(|e| ConfigError::Settings(e.to_string()))
    }

    /// Loads settings from the default location, treating every failure
    /// as empty settings.
    pub fn load_default() -> Self {
        match Self::default_path().and_then(|p| Self::load_from(&p)) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("ignoring user settings: {e}");
                Self::default()
            }
        }
    }

    /// Writes settings to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let text = toml::to_string_pretty(self).map_err(|e| ConfigError::Settings(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn slot(&mut self, key: &str) -> Result<&mut Option<String>, ConfigError> {
        match key {
            "provider" => Ok(&mut self.provider),
            "model" => Ok(&mut self.model),
            "api-key" | "api_key" => Ok(&mut self.api_key),
            "base-url" | "base_url" => Ok(&mut self.base_url),
            other => Err(ConfigError::UnknownKey {
                key: other.to_string(),
            }),
        }
    }

    /// Sets one key. An empty value clears it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        *self.slot(key)? = (!value.is_empty()).then(|| value.to_string());
        Ok(())
    }

    /// Returns the value of one key.
    pub fn get(&self, key: &str) -> Result<Option<&str>, ConfigError> {
        let value = match key {
            "provider" => &self.provider,
            "model" => &self.model,
            "api-key" | "api_key" => &self.api_key,
            "base-url" | "base_url" => &self.base_url,
            other => {
                return Err(ConfigError::UnknownKey {
                    key: other.to_string(),
                })
            }
        };
        Ok(value.as_deref())
    }

    /// Returns every key with its value, in [`VALID_KEYS`] order.
    pub fn entries(&self) -> Vec<(&'static str, Option<&str>)> {
        VALID_KEYS
            .iter()
            .map(|key| (*key, self.get(key).ok().flatten()))
            .collect()
    }
}

/// Masks a secret for display, keeping the last four characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}
