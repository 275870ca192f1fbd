//! Configuration module for the order service.
//!
//! Configuration is layered: built-in defaults, then an optional YAML file
//! with environment variable interpolation, then a fixed set of environment
//! overrides.
//!
//! # Usage
//!
//! ```rust,ignore
//! use order_service::config::{Config, load_config};
//!
//! // Resolve the file from ORDER_SERVICE_CONFIG / config.yaml and apply env overrides
//! let config = Config::load()?;
//!
//! // Load from custom path
//! let config = load_config(Some("custom/config.yaml"))?;
//!
//! println!("HTTP port: {}", config.server.port);
//! ```
//!
//! # Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `PORT` | `server.port` |
//! | `BIND_ADDRESS` | `server.bind_address` |
//! | `ORDERS_DB_PATH` | `persistence.db_path` |
//! | `ORDERS_REPAIR_POLICY` | `persistence.repair_policy` |
//! | `LOG_FORMAT` | `observability.logging.format` |

mod observability;
mod persistence;
mod server;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use observability::{LogFormat, LoggingConfig, ObservabilityConfig};
pub use persistence::PersistenceConfig;
pub use server::ServerConfig;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "ORDER_SERVICE_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset, if it exists.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// An environment override has an unusable value.
    #[error("Invalid value for environment variable {name}: {message}")]
    InvalidEnvVar {
        /// Variable name.
        name: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Order store configuration.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load the service configuration from the process environment.
    ///
    /// Reads the file named by `ORDER_SERVICE_CONFIG`, or `config.yaml` if it
    /// exists, or falls back to defaults; then applies environment overrides
    /// and validates the result.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var(CONFIG_PATH_ENV).ok().filter(|p| !p.is_empty());
        let mut config = match explicit {
            Some(path) => parse_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                parse_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Apply environment overrides, reading variables through `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(port) = var("PORT") {
            self.server.port = port.trim().parse().map_err(|e| ConfigError::InvalidEnvVar {
                name: "PORT",
                message: format!("'{port}' is not a port number: {e}"),
            })?;
        }
        if let Some(addr) = var("BIND_ADDRESS") {
            self.server.bind_address = addr;
        }
        if let Some(path) = var("ORDERS_DB_PATH") {
            self.persistence.db_path = PathBuf::from(path);
        }
        if let Some(policy) = var("ORDERS_REPAIR_POLICY") {
            self.persistence.repair_policy =
                policy
                    .parse()
                    .map_err(|message| ConfigError::InvalidEnvVar {
                        name: "ORDERS_REPAIR_POLICY",
                        message,
                    })?;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.observability.logging.format =
                format
                    .parse()
                    .map_err(|message| ConfigError::InvalidEnvVar {
                        name: "LOG_FORMAT",
                        message,
                    })?;
        }

        Ok(())
    }
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let config = parse_file(Path::new(path.unwrap_or(DEFAULT_CONFIG_PATH)))?;
    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let config = parse_str(yaml)?;
    validate_config(&config)?;
    Ok(config)
}

fn parse_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_str(&contents)
}

fn parse_str(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    if interpolated.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml_bw::from_str(&interpolated)?)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |caps: &regex::Captures<'_>| {
        let default_value = caps.get(2).map_or("", |m| m.as_str());
        match std::env::var(&caps[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.bind_address.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "server.bind_address must not be empty".to_string(),
        ));
    }

    if config.server.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "server.request_timeout_secs must be positive".to_string(),
        ));
    }

    if config.server.body_limit_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "server.body_limit_bytes must be positive".to_string(),
        ));
    }

    if config.persistence.db_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "persistence.db_path must not be empty".to_string(),
        ));
    }

    if config.observability.logging.level.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "observability.logging.level must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::RepairPolicy;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.server.body_limit_bytes, 10 * 1024 * 1024);
        assert_eq!(config.persistence.db_path, PathBuf::from("./data/orders.db"));
        assert_eq!(config.persistence.repair_policy, RepairPolicy::Additive);
        assert_eq!(config.observability.logging.level, "info");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_minimal_config() {
        let yaml = r"
server:
  port: 8080
";

        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load minimal config: {e}"),
        };
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_secs, 30); // Default value
        assert_eq!(config.persistence.busy_timeout_ms, 5_000);
    }

    #[test]
    fn test_load_full_config() {
        let yaml = r"
server:
  port: 3100
  bind_address: 127.0.0.1
  request_timeout_secs: 5
persistence:
  db_path: /var/lib/orders/orders.db
  busy_timeout_ms: 250
  repair_policy: destructive
observability:
  logging:
    level: debug
    format: pretty
";

        let config = load_config_from_string(yaml).unwrap();
        assert_eq!(config.server.listen_addr(), "127.0.0.1:3100");
        assert_eq!(config.persistence.repair_policy, RepairPolicy::Destructive);
        assert_eq!(config.observability.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_empty_yaml_is_defaults() {
        assert_eq!(load_config_from_string("").unwrap(), Config::default());
    }

    #[test]
    fn test_env_var_with_default_when_missing() {
        // Use a variable name unlikely to exist
        let input = "path: ${ORDER_SERVICE_TEST_NONEXISTENT_VAR:-./data/orders.db}";
        let result = interpolate_env_vars(input);

        assert_eq!(result, "path: ./data/orders.db");
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)] // ${...} is env var syntax, not format args
    fn test_env_var_with_default_uses_existing() {
        // PATH should always exist
        let input = "path: ${PATH:-default}";
        let result = interpolate_env_vars(input);

        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn test_env_var_without_default_becomes_empty() {
        let input = "bind: ${ORDER_SERVICE_TEST_UNLIKELY_TO_EXIST}";
        let result = interpolate_env_vars(input);

        assert_eq!(result, "bind: ");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[
                ("PORT", "4000"),
                ("BIND_ADDRESS", "127.0.0.1"),
                ("ORDERS_DB_PATH", "/tmp/orders.db"),
                ("ORDERS_REPAIR_POLICY", "destructive"),
                ("LOG_FORMAT", "pretty"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.persistence.db_path, PathBuf::from("/tmp/orders.db"));
        assert_eq!(config.persistence.repair_policy, RepairPolicy::Destructive);
        assert_eq!(config.observability.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_empty_env_override_is_ignored() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[("PORT", "")])).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = Config::default();
        let Err(err) = config.apply_env_overrides(env(&[("PORT", "http")])) else {
            panic!("expected error for non-numeric port");
        };
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_invalid_repair_policy_override() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(env(&[("ORDERS_REPAIR_POLICY", "yolo")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnvVar {
                name: "ORDERS_REPAIR_POLICY",
                ..
            })
        ));
    }

    #[test]
    fn test_validation_zero_timeout() {
        let yaml = r"
server:
  request_timeout_secs: 0
";

        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for zero timeout");
        };
        assert!(err.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn test_invalid_yaml() {
        let result = load_config_from_string("server: [unclosed");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config(Some("/nonexistent/order-service.yaml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
