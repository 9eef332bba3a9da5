//! Shared application state.

use std::time::Duration;

/// Request-independent configuration shared by all handlers.
///
/// Read-only after startup; every invocation gets its own process,
/// buffers, and deadline, so no locking is needed here.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Command line used to start the stdio backend when the request
    /// doesn't override it.
    pub default_server_cmd: String,
    /// Hard wall-clock deadline applied per invocation.
    pub timeout: Duration,
}
