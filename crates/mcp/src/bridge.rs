//! Subprocess bridge.
//!
//! Runs exactly one backend process per invocation: writes the envelope
//! to its stdin, closes the stream, and races the process's natural exit
//! against a wall-clock deadline. Stdout is relayed verbatim on success;
//! stderr is attached to failure outcomes for diagnostics.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::BridgeError;

/// Environment variable used for the per-request credential override.
pub const CREDENTIAL_ENV_VAR: &str = "GITHUB_PERSONAL_ACCESS_TOKEN";

/// A backend command resolved from its configured command string.
///
/// Resolution is a plain whitespace split: the first token is the
/// executable, the rest are its arguments. No shell quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl BackendCommand {
    /// Split a command string into program and arguments.
    ///
    /// A blank string is a configuration error, caught before any
    /// process is spawned.
    pub fn parse(command: &str) -> Result<Self, BridgeError> {
        let mut tokens = command.split_whitespace().map(str::to_string);
        let program = tokens.next().ok_or(BridgeError::InvalidCommand)?;
        Ok(Self {
            program,
            args: tokens.collect(),
        })
    }
}

/// Run one backend process to completion or forced termination.
///
/// The envelope is written to the backend's stdin followed by a newline,
/// then stdin is closed — the backend is expected to read one request,
/// emit one response on stdout, and exit. The full exchange (write,
/// drain, exit) shares a single `deadline`; if it elapses first the
/// backend is killed and [`BridgeError::Timeout`] is returned.
///
/// The backend inherits this process's environment in full. A
/// `credential` override is layered on top as [`CREDENTIAL_ENV_VAR`]
/// without mutating the inherited set.
///
/// `kill_on_drop` ties the backend's lifetime to the calling future: if
/// the HTTP request is cancelled mid-invocation, dropping the future
/// tears the backend down as well.
pub async fn invoke(
    payload: &[u8],
    command: &str,
    credential: Option<&str>,
    deadline: Duration,
) -> Result<Vec<u8>, BridgeError> {
    let resolved = BackendCommand::parse(command)?;

    debug!(program = %resolved.program, "spawning backend process");

    let mut cmd = Command::new(&resolved.program);
    cmd.args(&resolved.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(token) = credential {
        cmd.env(CREDENTIAL_ENV_VAR, token);
    }

    let mut child = cmd.spawn().map_err(BridgeError::Launch)?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| BridgeError::Launch(std::io::Error::other("failed to capture stdin")))?;
    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| BridgeError::Launch(std::io::Error::other("failed to capture stdout")))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| BridgeError::Launch(std::io::Error::other("failed to capture stderr")))?;

    let exchange = async {
        // Single-exchange write: envelope, newline, then close stdin so a
        // well-behaved backend knows no further requests are coming. A
        // backend that exits before reading breaks the pipe; that case is
        // classified by the exit race below, not the write.
        if let Err(e) = write_envelope(&mut stdin, payload).await {
            debug!(error = %e, "stdin write failed (backend may have exited early)");
        }
        drop(stdin);

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let (status, out_read, err_read) = tokio::join!(
            child.wait(),
            stdout_pipe.read_to_end(&mut stdout),
            stderr_pipe.read_to_end(&mut stderr),
        );
        if let Err(e) = out_read {
            warn!(error = %e, "stdout drain failed");
        }
        if let Err(e) = err_read {
            warn!(error = %e, "stderr drain failed");
        }

        match status {
            Ok(status) if status.success() => Ok(stdout),
            Ok(status) => Err(BridgeError::Subprocess {
                detail: status.to_string(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            }),
            Err(e) => Err(BridgeError::Subprocess {
                detail: format!("wait failed: {e}"),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            }),
        }
    };

    // Bind before matching so the exchange future (and its borrow of
    // `child`) is dropped before the timeout arm kills the process.
    let raced = tokio::time::timeout(deadline, exchange).await;
    match raced {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!(program = %resolved.program, ?deadline, "backend timed out, killing");
            // Best-effort, idempotent: a process that already exited is
            // reaped, not an error.
            if let Err(e) = child.kill().await {
                debug!(error = %e, "kill after timeout failed");
            }
            Err(BridgeError::Timeout(deadline))
        }
    }
}

async fn write_envelope(
    stdin: &mut tokio::process::ChildStdin,
    payload: &[u8],
) -> std::io::Result<()> {
    stdin.write_all(payload).await?;
    stdin.write_all(b"\n").await?;
    stdin.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Instant;

    const TEST_DEADLINE: Duration = Duration::from_secs(5);

    /// Write an executable shell script into `dir` and return its path.
    fn script(dir: &tempfile::TempDir, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("backend.sh");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh\n{body}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_parse_program_and_args() {
        let cmd = BackendCommand::parse("./github-mcp-server stdio --flag").unwrap();
        assert_eq!(cmd.program, "./github-mcp-server");
        assert_eq!(cmd.args, vec!["stdio".to_string(), "--flag".to_string()]);
    }

    #[test]
    fn test_parse_blank_command_rejected() {
        assert!(matches!(
            BackendCommand::parse(""),
            Err(BridgeError::InvalidCommand)
        ));
        assert!(matches!(
            BackendCommand::parse("   "),
            Err(BridgeError::InvalidCommand)
        ));
    }

    #[tokio::test]
    async fn test_echo_backend_roundtrip() {
        let output = invoke(br#"{"jsonrpc":"2.0"}"#, "cat", None, TEST_DEADLINE)
            .await
            .unwrap();
        assert_eq!(output, b"{\"jsonrpc\":\"2.0\"}\n");
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = script(&dir, "echo boom >&2\nexit 1");

        let err = invoke(b"{}", &cmd, None, TEST_DEADLINE).await.unwrap_err();
        match err {
            BridgeError::Subprocess { stderr, .. } => assert!(stderr.contains("boom")),
            other => panic!("expected Subprocess failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_kills_backend() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("backend.pid");
        // Record the backend's PID, then block well past the deadline.
        let cmd = script(&dir, "echo $$ > \"$1\"\nexec sleep 30");

        let start = Instant::now();
        let err = invoke(
            b"{}",
            &format!("{cmd} {}", pid_file.display()),
            None,
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BridgeError::Timeout(_)));
        assert!(start.elapsed() < Duration::from_secs(3));

        // The kill is awaited and the child reaped before invoke returns,
        // so the process must be gone by now.
        let pid: u32 = std::fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        assert!(!std::path::Path::new(&format!("/proc/{pid}")).exists());
    }

    #[tokio::test]
    async fn test_missing_executable_is_launch_failure() {
        let err = invoke(b"{}", "/no/such/backend-binary", None, TEST_DEADLINE)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Launch(_)));
    }

    #[tokio::test]
    async fn test_credential_override_reaches_backend() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = script(&dir, "printf '%s' \"$GITHUB_PERSONAL_ACCESS_TOKEN\"");

        let output = invoke(b"{}", &cmd, Some("ghp_override"), TEST_DEADLINE)
            .await
            .unwrap();
        assert_eq!(output, b"ghp_override");
    }

    #[tokio::test]
    async fn test_environment_inherited() {
        // Process-global env write: the var name is unique to this test
        // and set exactly once, before any spawn that could read it.
        static AMBIENT: std::sync::OnceLock<()> = std::sync::OnceLock::new();
        AMBIENT.get_or_init(|| std::env::set_var("BRIDGE_TEST_AMBIENT", "inherited"));

        let dir = tempfile::tempdir().unwrap();
        let cmd = script(&dir, "printf '%s' \"$BRIDGE_TEST_AMBIENT\"");

        let output = invoke(b"{}", &cmd, None, TEST_DEADLINE).await.unwrap();
        assert_eq!(output, b"inherited");
    }

    #[tokio::test]
    async fn test_command_override_resolves_argv0() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = script(&dir, "printf '%s' \"$0\"");

        let output = invoke(b"{}", &cmd, None, TEST_DEADLINE).await.unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), cmd);
    }
}
