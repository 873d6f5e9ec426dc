//! Server configuration loaded from `tileswap.toml`.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tileswap_engine::EngineConfig;
use tracing::{debug, info, instrument, warn};

/// Top-level configuration for the asset server and the console front end.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind to.
    #[serde(default = "default_port")]
    port: u16,

    /// Directory holding `assets/`, `views/` and `controllers/`.
    #[serde(default = "default_static_root")]
    static_root: PathBuf,

    /// Levels file served at `/api/levels`.
    #[serde(default = "default_levels_path")]
    levels_path: PathBuf,

    /// Canvas settings shared with the engine.
    #[serde(default)]
    engine: EngineConfig,

    /// Remote-image relay limits.
    #[serde(default)]
    relay: RelayConfig,
}

/// Limits applied by the remote-image relay.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Upstream request timeout.
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,

    /// Largest payload relayed, in bytes.
    #[serde(default = "default_max_bytes")]
    max_bytes: u64,

    /// `max-age` sent with relayed images.
    #[serde(default = "default_cache_max_age_secs")]
    cache_max_age_secs: u64,

    /// User-Agent sent upstream.
    #[serde(default = "default_user_agent")]
    user_agent: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_levels_path() -> PathBuf {
    PathBuf::from("models/levels.json")
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_max_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_cache_max_age_secs() -> u64 {
    3600
}

fn default_user_agent() -> String {
    format!("tileswap-relay/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_bytes: default_max_bytes(),
            cache_max_age_secs: default_cache_max_age_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl RelayConfig {
    /// Relay limits with a custom timeout and size cap.
    pub fn with_limits(timeout_secs: u64, max_bytes: u64) -> Self {
        Self {
            timeout_secs,
            max_bytes,
            ..Self::default()
        }
    }

    /// `Cache-Control` value for relayed images.
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.cache_max_age_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_root: default_static_root(),
            levels_path: default_levels_path(),
            engine: EngineConfig::default(),
            relay: RelayConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config = Self::parse(&content)?;
        info!(port = config.port, levels = %config.levels_path.display(), "Config loaded");
        Ok(config)
    }

    /// Loads the file if it exists, otherwise uses defaults.
    ///
    /// A file that exists but does not parse is still an error.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            debug!("No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Applies `PORT` from the environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_port_override(std::env::var("PORT").ok())
    }

    /// Applies a `PORT`-style override value.
    pub fn with_port_override(mut self, value: Option<String>) -> Result<Self, ConfigError> {
        if let Some(raw) = value {
            let port = raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::new(format!("Invalid PORT '{}': {}", raw, e)))?;
            if port != self.port {
                warn!(from = self.port, to = port, "PORT overrides configured port");
            }
            self.port = port;
        }
        Ok(self)
    }

    /// Replaces the bind host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Replaces the bind port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Replaces the static root.
    pub fn with_static_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.static_root = root.into();
        self
    }

    /// Replaces the levels file path.
    pub fn with_levels_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.levels_path = path.into();
        self
    }

    /// Replaces the relay limits.
    pub fn with_relay(mut self, relay: RelayConfig) -> Self {
        self.relay = relay;
        self
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error at the caller's location.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = ServerConfig::parse("").unwrap();
        assert_eq!(*config.port(), 3000);
        assert_eq!(config.levels_path(), &PathBuf::from("models/levels.json"));
        assert_eq!(*config.relay().timeout_secs(), 15);
        assert_eq!(*config.relay().max_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.engine().canvas_width, 600);
    }

    #[test]
    fn test_partial_sections() {
        let config = ServerConfig::parse(
            r#"
            port = 8080
            static_root = "public"

            [engine]
            canvas_width = 800

            [relay]
            max_bytes = 1024
            "#,
        )
        .unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.static_root(), &PathBuf::from("public"));
        assert_eq!(config.engine().canvas_width, 800);
        assert_eq!(config.engine().canvas_height, 600);
        assert_eq!(*config.relay().max_bytes(), 1024);
        assert_eq!(config.relay().cache_control(), "public, max-age=3600");
    }

    #[test]
    fn test_port_override() {
        let config = ServerConfig::default()
            .with_port_override(Some("4100".to_string()))
            .unwrap();
        assert_eq!(*config.port(), 4100);

        let err = ServerConfig::default()
            .with_port_override(Some("http".to_string()))
            .unwrap_err();
        assert!(err.message.contains("Invalid PORT"));
    }

    #[test]
    fn test_parse_error_records_location() {
        let err = ServerConfig::parse("port = \"not a number\"").unwrap_err();
        assert!(err.message.starts_with("Failed to parse config"));
        assert!(err.file.ends_with("config.rs"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(*config.port(), 3000);
    }
}
