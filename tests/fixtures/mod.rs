//! Shared helpers for the integration tests
//!
//! Services are built on a virtual clock so latency assertions never
//! sleep. Calls go through the request envelope, the same path the
//! transport uses.

#![allow(dead_code)]

use std::sync::Arc;

use apk_polkit_mock::mock::{MockPackageService, VirtualClock};
use apk_polkit_mock::{ApiVersion, RpcError, RpcRequest};
use apk_protocol::{PackageRecord, PackageTuple, Repository};
use serde_json::Value;

/// Every property of a v2 package record.
pub const ALL_FIELDS: u32 = 511;

/// Service for `api` plus the clock it sleeps on.
pub fn service(api: ApiVersion) -> (MockPackageService, VirtualClock) {
    let clock = VirtualClock::new();
    let service = MockPackageService::with_clock(api, Arc::new(clock.clone()));
    (service, clock)
}

pub fn v1_service() -> (MockPackageService, VirtualClock) {
    service(ApiVersion::V1)
}

pub fn v2_service() -> (MockPackageService, VirtualClock) {
    service(ApiVersion::V2)
}

/// Call `method` through the request envelope.
pub fn try_call(service: &MockPackageService, method: &str, args: Vec<Value>) -> Result<Value, RpcError> {
    let request = RpcRequest::new("test", method, args);
    let response = service.handle_request(&request);
    assert_eq!(response.request_id, "test");
    response.into_result()
}

/// Call `method`, panicking on an error response.
pub fn call(service: &MockPackageService, method: &str, args: Vec<Value>) -> Value {
    match try_call(service, method, args) {
        Ok(value) => value,
        Err(e) => panic!("{} failed: {}", method, e),
    }
}

/// JSON array of strings.
pub fn strings(items: &[&str]) -> Value {
    Value::Array(items.iter().map(|s| Value::from(*s)).collect())
}

pub fn repositories(value: Value) -> Vec<Repository> {
    serde_json::from_value(value).expect("a(bss)")
}

pub fn v1_record(value: Value) -> PackageRecord {
    let tuple: PackageTuple = serde_json::from_value(value).expect("(ssssssttu)");
    PackageRecord::from_v1_tuple(tuple)
}

pub fn v1_records(value: Value) -> Vec<PackageRecord> {
    match value {
        Value::Array(items) => items.into_iter().map(v1_record).collect(),
        other => panic!("expected array, got {}", other),
    }
}

pub fn v2_records(value: Value) -> Vec<PackageRecord> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|v| PackageRecord::from_v2_value(v).expect("a{sv}"))
            .collect(),
        other => panic!("expected array, got {}", other),
    }
}
