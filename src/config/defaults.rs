//! Built-in service defaults (layer 1)

use serde::{Deserialize, Serialize};

use crate::mock::fixtures;

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDefaults {
    /// API generation to serve (default: "v2")
    pub api_version: String,

    /// Length of one simulated time unit in milliseconds (default: 1000)
    pub time_unit_ms: u64,

    /// Units a v2 repository refresh blocks for (default: 2)
    pub refresh_delay_units: u32,

    /// Units an add/delete naming the slow package blocks for (default: 10)
    pub slow_delay_units: u32,

    pub slow_package: String,
    pub owned_path: String,
    pub owned_path_package: String,

    /// Fallback log filter when RUST_LOG is unset (default: "info")
    pub log_level: String,
}

impl Default for ServiceDefaults {
    fn default() -> Self {
        Self {
            api_version: "v2".to_string(),
            time_unit_ms: 1000,
            refresh_delay_units: 2,
            slow_delay_units: 10,
            slow_package: fixtures::SLOW_PACKAGE.to_string(),
            owned_path: fixtures::OWNED_PATH.to_string(),
            owned_path_package: fixtures::OWNED_PATH_PACKAGE.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ServiceDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "api_version": self.api_version,
            "time_unit_ms": self.time_unit_ms,
            "refresh_delay_units": self.refresh_delay_units,
            "slow_delay_units": self.slow_delay_units,
            "slow_package": self.slow_package,
            "owned_path": self.owned_path,
            "owned_path_package": self.owned_path_package,
            "log_level": self.log_level,
        })
    }
}
