//! HTTP-to-MCP subprocess bridge library.
//!
//! Translates one tool invocation into a JSON-RPC 2.0 `tools/call`
//! envelope and runs it against a one-shot backend process over stdio.
//!
//! # Architecture
//!
//! - **types**: JSON-RPC envelope types and the payload builder
//! - **bridge**: backend command resolution and the subprocess exchange
//! - **error**: the failure taxonomy for one invocation
//!
//! # Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use bridge_mcp::{build_call_envelope, invoke};
//!
//! # async fn example() -> Result<(), bridge_mcp::BridgeError> {
//! let envelope = build_call_envelope("create_issue", None)?;
//! let response = invoke(
//!     &envelope,
//!     "./github-mcp-server stdio",
//!     None,
//!     Duration::from_secs(25),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod error;
pub mod types;

pub use bridge::{invoke, BackendCommand, CREDENTIAL_ENV_VAR};
pub use error::BridgeError;
pub use types::{build_call_envelope, CallToolParams, JsonRpcRequest};
