//! Record of helper methods invoked on a service instance.
//!
//! The outer harness uses this to check that the client actually reached
//! the helper (refresh, repository removal, ...) without inspecting logs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

/// One recorded method call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub args: Vec<Value>,
}

impl CallRecord {
    /// `(tsav)` wire form: unix time, method name, arguments.
    pub fn to_wire(&self) -> Value {
        json!([self.timestamp.timestamp(), self.method, self.args])
    }

    /// `(tav)` wire form, for per-method queries.
    pub fn to_wire_without_method(&self) -> Value {
        json!([self.timestamp.timestamp(), self.args])
    }
}

/// Ordered call log.
#[derive(Debug, Default)]
pub struct CallLog {
    records: Vec<CallRecord>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, method: &str, args: &[Value]) {
        self.records.push(CallRecord {
            timestamp: Utc::now(),
            method: method.to_string(),
            args: args.to_vec(),
        });
    }

    pub fn all(&self) -> &[CallRecord] {
        &self.records
    }

    /// Calls to `method`, oldest first.
    pub fn for_method(&self, method: &str) -> Vec<CallRecord> {
        self.records.iter().filter(|r| r.method == method).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
