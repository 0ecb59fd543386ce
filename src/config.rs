//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener and origin configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed to open relay connections.
    /// `"*"` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "https://hospital-socket-client.vercel.app".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }

    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.allows_any_origin() || self.cors_origins.iter().any(|o| o == origin)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment.
    ///
    /// A file that exists but cannot be read or parsed is an error, not a
    /// silent fallback to defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("intake-relay").join("config.toml")),
            Some(PathBuf::from("/etc/intake-relay/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        match Self::load_first(&config_paths)? {
            Some(config) => Ok(config),
            None => Ok(Self::from_env()),
        }
    }

    /// Load the first existing file among `paths`, with env overrides applied
    fn load_first(paths: &[PathBuf]) -> Result<Option<Self>, ConfigError> {
        for path in paths {
            if path.exists() {
                return Self::load_with_env(path).map(Some);
            }
        }
        Ok(None)
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// `PORT` is the plain deployment port; `RELAY_PORT` wins when both are set.
    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("RELAY_HOST") {
            self.server.host = host;
        }
        for key in ["PORT", "RELAY_PORT"] {
            if let Some(port) = var(key).and_then(|p| p.parse().ok()) {
                self.server.port = port;
            }
        }
        if let Some(origins) = var("RELAY_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(level) = var("RELAY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("RELAY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Intake Relay Configuration
#
# Environment variables override these settings:
# - PORT / RELAY_PORT
# - RELAY_HOST
# - RELAY_CORS_ORIGINS (comma-separated)
# - RELAY_LOG_LEVEL
# - RELAY_LOG_FORMAT

[server]
# Address to bind to
host = "0.0.0.0"

# Port to listen on
port = 3001

# Origins allowed to open relay connections ("*" for any)
cors_origins = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "https://hospital-socket-client.vercel.app",
]

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.addr(), "0.0.0.0:3001");
        assert_eq!(config.server.cors_origins.len(), 3);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_default_config_text_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.cors_origins, default_cors_origins());
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 4000\n\n[logging]\nformat = \"json\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.logging.is_json());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/intake-relay.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();

        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_first_skips_missing_paths() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 4100").unwrap();

        let paths = [
            PathBuf::from("/nonexistent/intake-relay.toml"),
            file.path().to_path_buf(),
        ];
        let config = Config::load_first(&paths).unwrap().unwrap();
        assert_eq!(config.server.port, 4100);

        let none = Config::load_first(&[PathBuf::from("/nonexistent/intake-relay.toml")]);
        assert!(none.unwrap().is_none());
    }

    #[test]
    fn test_load_first_fails_on_malformed_file() {
        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "[server\nport = ").unwrap();
        let mut good = tempfile::NamedTempFile::new().unwrap();
        writeln!(good, "[server]\nport = 4100").unwrap();

        let paths = [bad.path().to_path_buf(), good.path().to_path_buf()];
        let result = Config::load_first(&paths);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(overrides(&[
            ("PORT", "8080"),
            ("RELAY_HOST", "127.0.0.1"),
            ("RELAY_CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("RELAY_LOG_LEVEL", "debug"),
        ]));

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(
            config.server.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_relay_port_wins_over_port() {
        let mut config = Config::default();
        config.apply_overrides(overrides(&[("PORT", "8080"), ("RELAY_PORT", "9090")]));
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(overrides(&[("PORT", "not-a-port")]));
        assert_eq!(config.server.port, 3001);
    }

    #[test]
    fn test_origin_allow_list() {
        let mut server = ServerConfig::default();
        assert!(server.is_origin_allowed("http://localhost:3000"));
        assert!(!server.is_origin_allowed("https://evil.example"));

        server.cors_origins.push("*".to_string());
        assert!(server.allows_any_origin());
        assert!(server.is_origin_allowed("https://evil.example"));
    }
}
