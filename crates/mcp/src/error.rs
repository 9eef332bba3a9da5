//! Error types for the bridge crate.

use std::time::Duration;

/// Failure modes of one bridge invocation.
///
/// Every variant is terminal for the request it belongs to: there is no
/// retry path, and exactly one of these (or a success) is produced per
/// invocation.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The tool arguments could not be serialized into an envelope.
    #[error("failed to serialize jsonrpc payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The backend command string yielded zero tokens.
    #[error("invalid server command: empty or blank")]
    InvalidCommand,

    /// The backend process could not be started.
    #[error("failed to start subprocess: {0}")]
    Launch(#[source] std::io::Error),

    /// The backend exited non-zero, or waiting on it failed.
    #[error("subprocess error: {detail}, stderr: {stderr}")]
    Subprocess {
        detail: String,
        /// Captured standard error, lossily decoded for diagnostics.
        stderr: String,
    },

    /// The deadline elapsed before the backend exited; it was killed.
    #[error("subprocess timed out after {0:?}")]
    Timeout(Duration),
}
