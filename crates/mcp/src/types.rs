//! JSON-RPC 2.0 request types and the payload builder.
//!
//! The bridge speaks the tool-invocation half of the Model Context
//! Protocol: a single JSON-RPC 2.0 `tools/call` request written as one
//! newline-terminated line on the backend's stdin.

use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BridgeError;

/// The JSON-RPC protocol version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// The fixed method name for tool invocation.
pub const TOOLS_CALL_METHOD: &str = "tools/call";

/// Exclusive upper bound for correlation ids.
pub const CORRELATION_ID_BOUND: u32 = 1_000_000;

/// A JSON-RPC 2.0 `tools/call` request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u32,
    pub method: String,
    pub params: CallToolParams,
}

/// Parameters for `tools/call`: the tool name and its argument mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Map<String, Value>>,
}

impl JsonRpcRequest {
    /// Create a `tools/call` request with a fresh correlation id.
    pub fn call_tool(tool: impl Into<String>, arguments: Option<Map<String, Value>>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: correlation_id(),
            method: TOOLS_CALL_METHOD.to_string(),
            params: CallToolParams {
                name: tool.into(),
                arguments,
            },
        }
    }
}

/// Draw a correlation id uniformly from `[0, CORRELATION_ID_BOUND)`.
///
/// Ids are debugging tags only — never matched against the response and
/// never persisted. `OsRng` keeps them unpredictable across concurrent
/// requests without a counter or shared state.
fn correlation_id() -> u32 {
    OsRng.gen_range(0..CORRELATION_ID_BOUND)
}

/// Build the serialized `tools/call` envelope for one invocation.
///
/// An empty argument mapping serializes as an omitted field, not `{}`.
/// The caller is expected to have rejected empty tool names already.
pub fn build_call_envelope(
    tool: &str,
    arguments: Option<Map<String, Value>>,
) -> Result<Vec<u8>, BridgeError> {
    let arguments = arguments.filter(|map| !map.is_empty());
    let request = JsonRpcRequest::call_tool(tool, arguments);
    Ok(serde_json::to_vec(&request)?)
}
