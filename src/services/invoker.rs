use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing;

/// Marker placed in stderr when a command exceeds its deadline, so callers
/// can tell a timeout apart from an ordinary tool failure.
const TIMEOUT_MARKER: &str = "command timed out";

/// Captured outcome of one external invocation. Consumed synchronously by the
/// caller, never persisted.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn timed_out(&self) -> bool {
        !self.success && self.stderr.starts_with(TIMEOUT_MARKER)
    }
}

/// Runs external tools with a bounded wait and captured output.
///
/// Arguments are always passed as a discrete list, never interpolated into a
/// shell string, so untrusted input (usernames, passwords) cannot become
/// shell syntax.
#[derive(Debug, Clone)]
pub struct CommandInvoker {
    timeout: Duration,
}

impl CommandInvoker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }

    /// Run `program` with `args` and capture the outcome. This never returns
    /// an error: spawn failures and timeouts are reported through the result
    /// itself so callers get one uniform shape to classify.
    pub async fn run(&self, program: &str, args: &[&str]) -> CommandResult {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout must reap the child
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!("Failed to spawn {}: {}", program, e);
                return CommandResult {
                    success: false,
                    stdout: String::new(),
                    stderr: e.to_string(),
                };
            }
        };

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => CommandResult {
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            },
            Ok(Err(e)) => CommandResult {
                success: false,
                stdout: String::new(),
                stderr: e.to_string(),
            },
            Err(_) => {
                tracing::warn!(
                    "{} did not finish within {} seconds",
                    program,
                    self.timeout.as_secs()
                );
                CommandResult {
                    success: false,
                    stdout: String::new(),
                    stderr: format!("{} after {:?}", TIMEOUT_MARKER, self.timeout),
                }
            }
        }
    }
}
