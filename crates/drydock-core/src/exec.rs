//! External process execution behind a trait seam.
//!
//! Workspace and checker operations go through [`CommandRunner`] so
//! tests can observe exactly which processes would be spawned. The
//! real implementation is [`SystemRunner`], which enforces a timeout
//! on every call.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Result of an external command execution.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    /// Exit code (0 = success, -1 if terminated by signal).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl ExecOutput {
    /// Whether the command exited cleanly.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes external commands.
///
/// An `Err` means the command could not be run at all (missing binary,
/// spawn failure, timeout); a nonzero exit code is an `Ok` with the
/// captured output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
        timeout: Duration,
    ) -> anyhow::Result<ExecOutput>;
}

/// [`CommandRunner`] backed by real OS processes.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
        timeout: Duration,
    ) -> anyhow::Result<ExecOutput> {
        let start = Instant::now();

        let mut command = Command::new(program);
        command
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let child = command.spawn()?;

        let output = if timeout.is_zero() {
            child.wait_with_output().await?
        } else {
            tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| {
                    anyhow::anyhow!(
                        "{} timed out after {} seconds",
                        program,
                        timeout.as_secs()
                    )
                })??
        };

        Ok(ExecOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
