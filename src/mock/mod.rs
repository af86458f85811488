//! Mock apk-polkit Helper
//!
//! A stateful stand-in for the privileged package helper, serving either
//! the v1 (`dev.Cogitri.apkPolkit1`, tuple records) or v2
//! (`dev.Cogitri.apkPolkit2`, property maps with field selection) API.
//!
//! # Usage Modes
//!
//! - **In-process library**: direct calls on [`MockPackageService`]
//! - **Standalone binary**: line-delimited JSON over stdio or a Unix socket
//!
//! # Operations
//!
//! - repository listing and (non-persisted) add/remove/refresh
//! - upgradable discovery, detail lookup, upgrade
//! - simulated add/delete with a slow-package latency sentinel
//! - file owner search (v2)
//! - `org.freedesktop.DBus.Mock` call log and reset

mod calls;
mod clock;
mod dispatch;
pub mod fixtures;
mod service;
mod state;
pub mod version;

pub use calls::{CallLog, CallRecord};
pub use clock::{Clock, SystemClock, VirtualClock};
pub use dispatch::{signature_arity, Args, Handler, MethodInterface, MethodSpec, MethodTable};
pub use service::{MockPackageService, ServiceSettings};
pub use state::MockState;
