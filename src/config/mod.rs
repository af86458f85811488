//! Configuration merge system
//!
//! Implements the 3-layer configuration merge:
//! 1. Built-in service defaults
//! 2. Config file (`--config path.toml`)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::ServiceDefaults;
pub use effective::{ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, ServiceConfig};
pub use merge::{deep_merge, merge_layers};
