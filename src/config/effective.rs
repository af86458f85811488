//! Effective configuration with provenance
//!
//! Captures the merged configuration plus where each layer came from, and
//! the typed [`ServiceConfig`] the server is started with.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use apk_protocol::ApiVersion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::defaults::ServiceDefaults;
use super::merge::merge_layers;
use crate::mock::ServiceSettings;

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Typed service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub api_version: ApiVersion,
    pub time_unit_ms: u64,
    pub refresh_delay_units: u32,
    pub slow_delay_units: u32,
    pub slow_package: String,
    pub owned_path: String,
    pub owned_path_package: String,
    /// Unix socket to listen on; stdio when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket: Option<PathBuf>,
    pub log_level: String,
}

impl ServiceConfig {
    /// Latency and sentinel settings for the service.
    pub fn settings(&self) -> ServiceSettings {
        ServiceSettings {
            time_unit: Duration::from_millis(self.time_unit_ms),
            refresh_delay_units: self.refresh_delay_units,
            slow_delay_units: self.slow_delay_units,
            slow_package: self.slow_package.clone(),
            owned_path: self.owned_path.clone(),
            owned_path_package: self.owned_path_package.clone(),
        }
    }
}

/// Effective configuration with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// The merged configuration object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

impl EffectiveConfig {
    /// Build effective config from layers. A missing config file is an
    /// error; an absent `--config` flag is not.
    pub fn build(config_path: Option<&Path>, cli_overrides: Option<Value>) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        // Layer 1: Built-in defaults
        layers.push(ServiceDefaults::default().to_value());
        sources.push(ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
        });

        // Layer 2: Config file
        if let Some(path) = config_path {
            layers.push(Self::load_toml_file(path)?);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.to_string_lossy().to_string()),
            });
        }

        // Layer 3: CLI overrides
        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
            });
        }

        let mut merged = merge_layers(layers);
        Self::validate_config(&mut merged)?;

        Ok(Self {
            created_at: Utc::now(),
            config: merged,
            sources,
        })
    }

    /// Load and parse a TOML file as a JSON value.
    fn load_toml_file(path: &Path) -> Result<Value, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok(Self::toml_to_json(toml_value))
    }

    /// Convert TOML Value to JSON Value
    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => Value::Array(arr.into_iter().map(Self::toml_to_json).collect()),
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    /// Validate configuration values and normalize the API version.
    fn validate_config(config: &mut Value) -> Result<(), ConfigError> {
        if let Some(raw) = config.get("api_version") {
            let text = match raw {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(ConfigError::ValidationError(format!(
                        "api_version must be a string, got {}",
                        other
                    )))
                }
            };
            let api = ApiVersion::from_str(&text).map_err(ConfigError::ValidationError)?;
            config["api_version"] = Value::String(api.to_string());
        }

        if config.get("time_unit_ms").and_then(|v| v.as_u64()) == Some(0) {
            return Err(ConfigError::ValidationError(
                "time_unit_ms must be greater than 0".to_string(),
            ));
        }

        if let Some(slow) = config.get("slow_package").and_then(|v| v.as_str()) {
            if slow.is_empty() {
                return Err(ConfigError::ValidationError(
                    "slow_package must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Typed view of the merged config.
    pub fn service_config(&self) -> Result<ServiceConfig, ConfigError> {
        serde_json::from_value(self.config.clone())
            .map_err(|e| ConfigError::ParseError(format!("invalid configuration: {}", e)))
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a config value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(|v| v.as_u64())
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
