//! apk-polkit mock - stateful stand-in for the apk-polkit package helper
//!
//! Serves the v1 (`dev.Cogitri.apkPolkit1`) or v2 (`dev.Cogitri.apkPolkit2`)
//! helper contract from seeded fixtures, so package-manager front ends can
//! be tested without a privileged daemon or a real package database.

pub mod config;
pub mod mock;
pub mod server;
pub mod signal;

pub use apk_protocol::{ApiVersion, ErrorCode, PackageFields, RpcError, RpcRequest, RpcResponse};
pub use config::{ConfigError, EffectiveConfig, ServiceConfig};
pub use mock::{MockPackageService, ServiceSettings};
pub use server::{serve_connection, serve_stdio, ServerError, ShutdownHandle};
