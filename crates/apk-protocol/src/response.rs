//! RPC response envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;

/// Reply to one [`RpcRequest`](crate::RpcRequest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Request ID echoed from the request.
    pub request_id: String,
    pub ok: bool,
    /// Method return value (present when ok=true; `null` for void methods).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error details (present when ok=false).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(request_id: String, result: Value) -> Self {
        Self {
            request_id,
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(request_id: String, error: RpcError) -> Self {
        Self {
            request_id,
            ok: false,
            result: None,
            error: Some(error),
        }
    }

    /// Split into the call outcome.
    pub fn into_result(self) -> Result<Value, RpcError> {
        match (self.ok, self.error) {
            (false, Some(err)) => Err(err),
            (false, None) => Err(RpcError::invalid_request("error response without details")),
            (true, _) => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}
