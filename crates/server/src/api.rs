//! Bridge API endpoints.
//!
//! `POST /call` translates a tool invocation into a JSON-RPC envelope,
//! hands it to the subprocess bridge, and relays the backend's stdout
//! as the response body. `GET /healthz` is a liveness probe.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Map, Value};

use bridge_mcp::{build_call_envelope, invoke, BridgeError};

use crate::state::AppState;

/// Request body for `POST /call`. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct CallRequest {
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub arguments: Option<Map<String, Value>>,
    /// Per-call override of the configured backend command.
    #[serde(default)]
    pub server_cmd: Option<String>,
    /// Per-call GitHub token, injected into the backend's environment.
    #[serde(default)]
    pub github_pat: Option<String>,
}

/// Handle one tool invocation end to end.
///
/// The body is decoded from raw bytes so malformed JSON maps to 400
/// with the parse reason. Failure bodies carry diagnostic detail
/// (including backend stderr) — this endpoint is for trusted callers.
pub async fn call(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request: CallRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, format!("invalid JSON body: {e}")).into_response();
        }
    };
    if request.tool.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "`tool` is required (e.g. create_issue)",
        )
            .into_response();
    }

    let envelope = match build_call_envelope(&request.tool, request.arguments) {
        Ok(envelope) => envelope,
        Err(e) => return failure_response(e),
    };

    let command = request
        .server_cmd
        .as_deref()
        .filter(|cmd| !cmd.is_empty())
        .unwrap_or(&state.default_server_cmd);
    let credential = request.github_pat.as_deref().filter(|pat| !pat.is_empty());

    match invoke(&envelope, command, credential, state.timeout).await {
        // Backend stdout is relayed as-is, deliberately unvalidated.
        Ok(stdout) => ([(header::CONTENT_TYPE, "application/json")], stdout).into_response(),
        Err(e) => failure_response(e),
    }
}

/// Liveness probe; independent of any backend state.
pub async fn healthz() -> &'static str {
    "ok"
}

fn failure_response(err: BridgeError) -> Response {
    let status = match err {
        BridgeError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string()).into_response()
}
