use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::auth::DEFAULT_REFRESH_MARGIN_SECONDS;
use crate::cache::DEFAULT_TTL_HOURS;

/// Configuration for the TubeScribe client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend API settings
    pub backend: BackendConfig,

    /// On-disk video cache settings
    pub cache: CacheConfig,

    /// Background-translation polling settings
    pub translation: TranslationConfig,

    /// Auth state and token refresh settings
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the transcript/summarization backend
    pub base_url: String,

    /// HTTP request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory for per-video cache files
    pub cache_dir: PathBuf,

    /// Record lifetime in hours
    pub ttl_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Delay between translation polls in milliseconds
    pub poll_interval_ms: u64,

    /// Maximum number of polls before giving up
    pub max_poll_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Path of the persisted auth record
    pub state_file: PathBuf,

    /// Seconds before expiry at which the access token is refreshed
    pub refresh_margin_seconds: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            cache: CacheConfig::default(),
            translation: TranslationConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_seconds: 120,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache/videos"),
            ttl_hours: DEFAULT_TTL_HOURS,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            max_poll_attempts: 30,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("cache/auth.json"),
            refresh_margin_seconds: DEFAULT_REFRESH_MARGIN_SECONDS,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = [
            "tubescribe.toml",
            "config/tubescribe.toml",
            "~/.config/tubescribe/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("TUBESCRIBE_BACKEND_URL") {
            config.backend.base_url = base_url;
        }

        if let Ok(cache_dir) = std::env::var("TUBESCRIBE_CACHE_DIR") {
            config.cache.cache_dir = PathBuf::from(cache_dir);
        }

        if let Ok(ttl) = std::env::var("TUBESCRIBE_CACHE_TTL_HOURS") {
            config.cache.ttl_hours = ttl.parse().unwrap_or(DEFAULT_TTL_HOURS);
        }

        if let Ok(state_file) = std::env::var("TUBESCRIBE_AUTH_FILE") {
            config.auth.state_file = PathBuf::from(state_file);
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.is_empty() {
            return Err(anyhow!("backend.base_url must not be empty"));
        }

        if self.backend.timeout_seconds == 0 {
            return Err(anyhow!("backend.timeout_seconds must be greater than 0"));
        }

        if self.cache.ttl_hours == 0 {
            return Err(anyhow!("cache.ttl_hours must be greater than 0"));
        }

        if self.translation.poll_interval_ms == 0 {
            return Err(anyhow!("translation.poll_interval_ms must be greater than 0"));
        }

        if self.translation.max_poll_attempts == 0 {
            return Err(anyhow!("translation.max_poll_attempts must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.cache.ttl_hours, 24);
        assert_eq!(config.translation.poll_interval_ms, 500);
        assert_eq!(config.translation.max_poll_attempts, 30);
        assert_eq!(config.auth.refresh_margin_seconds, 60);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [backend]
            base_url = "https://api.example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.base_url, "https://api.example.com");
        assert_eq!(config.backend.timeout_seconds, 120);
        assert_eq!(config.cache.ttl_hours, 24);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = Config::default();
        config.translation.max_poll_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.backend.base_url = String::new();
        assert!(config.validate().is_err());
    }
}
