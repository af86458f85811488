//! Error types for the RPC protocol.
//!
//! The helper itself never fails a well-formed call. These errors come from
//! the dispatch layer: unknown methods, arguments that do not match the
//! method signature, and envelopes that cannot be parsed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes returned in RPC error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No handler is registered under the method name.
    UnknownMethod,
    /// Argument arity or types do not match the method signature.
    InvalidArgs,
    /// The envelope itself is malformed.
    InvalidRequest,
    /// A result could not be encoded.
    InternalError,
}

impl ErrorCode {
    /// The equivalent bus error name.
    pub fn dbus_name(self) -> &'static str {
        match self {
            ErrorCode::UnknownMethod => "org.freedesktop.DBus.Error.UnknownMethod",
            ErrorCode::InvalidArgs => "org.freedesktop.DBus.Error.InvalidArgs",
            ErrorCode::InvalidRequest | ErrorCode::InternalError => {
                "org.freedesktop.DBus.Error.Failed"
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMethod => write!(f, "UNKNOWN_METHOD"),
            Self::InvalidArgs => write!(f, "INVALID_ARGS"),
            Self::InvalidRequest => write!(f, "INVALID_REQUEST"),
            Self::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// RPC error response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: ErrorCode,
    /// Single-line, human-readable message.
    pub message: String,
    /// Optional machine-readable details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(code: ErrorCode, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// No such method on the served interface.
    pub fn unknown_method(method: &str) -> Self {
        Self::with_data(
            ErrorCode::UnknownMethod,
            format!("unknown method: {}", method),
            serde_json::json!({ "method": method }),
        )
    }

    /// Arguments do not match `signature`.
    pub fn invalid_args(method: &str, signature: &str, detail: impl fmt::Display) -> Self {
        Self::with_data(
            ErrorCode::InvalidArgs,
            format!("invalid arguments for {} (expected '{}'): {}", method, signature, detail),
            serde_json::json!({ "method": method, "signature": signature }),
        )
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Result encoding failed for `method`.
    pub fn internal(method: &str, detail: impl fmt::Display) -> Self {
        Self::with_data(
            ErrorCode::InternalError,
            format!("failed to encode result of {}: {}", method, detail),
            serde_json::json!({ "method": method }),
        )
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::InvalidArgs).unwrap();
        assert_eq!(json, "\"INVALID_ARGS\"");
    }

    #[test]
    fn test_invalid_args_data() {
        let err = RpcError::invalid_args("AddPackages", "as", "expected 1 argument, got 0");
        assert_eq!(err.code, ErrorCode::InvalidArgs);
        assert!(err.message.contains("AddPackages"));
        assert_eq!(err.data.unwrap()["signature"], "as");
    }

    #[test]
    fn test_internal_error() {
        let err = RpcError::internal("ListRepositories", "boom");
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.code.to_string(), "INTERNAL_ERROR");
        assert_eq!(err.code.dbus_name(), "org.freedesktop.DBus.Error.Failed");
        assert_eq!(err.data.unwrap()["method"], "ListRepositories");
    }

    #[test]
    fn test_dbus_names() {
        assert_eq!(
            ErrorCode::UnknownMethod.dbus_name(),
            "org.freedesktop.DBus.Error.UnknownMethod"
        );
    }
}
