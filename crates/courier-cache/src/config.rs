//! Configuration loading and management

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use courier_proxy::HttpTransportConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub skip_tls_verify: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            skip_tls_verify: false,
        }
    }
}

impl ClientConfig {
    pub fn transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig {
            timeout: Some(Duration::from_secs(self.timeout_secs)),
            user_agent: Some(self.user_agent.clone()),
            skip_tls_verify: self.skip_tls_verify,
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Seconds between purges of expired entries (0 disables purging)
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("courier-cache/{}", env!("CARGO_PKG_VERSION"))
}

fn default_enabled() -> bool {
    true
}

fn default_purge_interval_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        // Check if config file exists
        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config.validate()?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Reject values that cannot produce a working pipeline
    pub fn validate(&self) -> Result<()> {
        if self.client.timeout_secs == 0 {
            bail!("client.timeout_secs must be greater than zero");
        }

        match self.logging.format.as_str() {
            "text" | "json" => Ok(()),
            other => bail!("Unknown logging format: {} (expected \"text\" or \"json\")", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.client.timeout_secs, 30);
        assert!(config.client.user_agent.starts_with("courier-cache/"));
        assert!(config.cache.enabled);
        assert_eq!(config.cache.purge_interval_secs, 60);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let file = write_config(
            r#"
[client]
skip_tls_verify = true

[cache]
enabled = false
"#,
        );

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert!(config.client.skip_tls_verify);
        assert_eq!(config.client.timeout_secs, 30);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.purge_interval_secs, 60);
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_transport_config() {
        let file = write_config(
            r#"
[client]
timeout_secs = 5
user_agent = "courier-test/1.0"
"#,
        );

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        let transport = config.client.transport_config();
        assert_eq!(transport.timeout, Some(Duration::from_secs(5)));
        assert_eq!(transport.user_agent.as_deref(), Some("courier-test/1.0"));
        assert!(!transport.skip_tls_verify);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let zero_timeout = write_config("[client]\ntimeout_secs = 0\n");
        assert!(Config::load(zero_timeout.path().to_str().unwrap()).is_err());

        let bad_format = write_config("[logging]\nformat = \"xml\"\n");
        assert!(Config::load(bad_format.path().to_str().unwrap()).is_err());

        let malformed = write_config("[cache\nenabled = ");
        assert!(Config::load(malformed.path().to_str().unwrap()).is_err());
    }
}
