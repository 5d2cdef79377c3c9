//! Wire-level JSON-RPC 2.0 framing for the tool protocol: one message
//! per line over the child's stdin/stdout (spec §1, §6.4).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An outbound request. `id` is always a monotonically increasing
/// integer assigned by [`super::session::RmcpSession`].
#[derive(Debug, Serialize)]
pub struct Request {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// An inbound line: either a response to one of our requests (`id` is
/// `Some`) or a server-initiated notification (`id` is `None`, `method`
/// is `Some`). This gateway has no use for notifications; they are
/// logged and dropped by the reader loop.
#[derive(Debug, Deserialize)]
pub struct Response {
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,
    pub id: Option<u64>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

/// Error object embedded in a JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
