//! RPC request envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single method call, sent as one JSON line.
///
/// `args` are positional, mirroring the bus call's in-signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Caller-chosen ID echoed in the response.
    #[serde(default)]
    pub request_id: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl RpcRequest {
    pub fn new(request_id: impl Into<String>, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            request_id: request_id.into(),
            method: method.into(),
            args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_to_empty() {
        let req: RpcRequest =
            serde_json::from_str(r#"{"request_id":"r1","method":"ListRepositories"}"#).unwrap();
        assert_eq!(req.method, "ListRepositories");
        assert!(req.args.is_empty());
    }
}
