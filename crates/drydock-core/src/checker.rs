//! Syntax gate: reduce a static-analysis run to a single outcome.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::exec::CommandRunner;

/// Marker the checker's stdout is scanned for.
pub const SYNTAX_ERROR_MARKER: &str = "syntax-error";

const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(120);

/// Outcome of a syntax check.
///
/// `Inconclusive` means the tool itself could not be run (missing
/// binary, crash, timeout) — an infrastructure failure, kept distinct
/// from a genuine syntax failure so the build record and commit status
/// can reflect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    Passed,
    Failed,
    Inconclusive,
}

impl CheckOutcome {
    /// Whether the gate passed.
    pub fn passed(&self) -> bool {
        matches!(self, CheckOutcome::Passed)
    }

    /// Result string recorded in the build log.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckOutcome::Passed => "pass",
            CheckOutcome::Failed => "fail",
            CheckOutcome::Inconclusive => "inconclusive",
        }
    }
}

/// Runs the external static-analysis tool against a workspace.
pub struct SyntaxChecker {
    runner: Arc<dyn CommandRunner>,
    tool: String,
    extra_args: Vec<String>,
    timeout: Duration,
}

impl SyntaxChecker {
    /// Create a checker invoking `pylint <path> --errors-only`.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        SyntaxChecker {
            runner,
            tool: "pylint".to_string(),
            extra_args: vec!["--errors-only".to_string()],
            timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    /// Use a different checker tool and arguments. The target path is
    /// always passed as the first argument.
    pub fn with_tool(mut self, tool: &str, extra_args: &[&str]) -> Self {
        self.tool = tool.to_string();
        self.extra_args = extra_args.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Change the checker timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the tree at `path`.
    ///
    /// Fails fast if the path does not exist (no process spawned).
    /// Otherwise the tool runs restricted to error-level findings and
    /// its stdout is scanned for [`SYNTAX_ERROR_MARKER`]: absent means
    /// pass, present means fail, regardless of the tool's exit code.
    pub async fn check(&self, path: &Path) -> CheckOutcome {
        if !path.exists() {
            warn!(path = %path.display(), "check target does not exist");
            return CheckOutcome::Failed;
        }

        let path_str = path.to_string_lossy().to_string();
        let mut args: Vec<&str> = vec![path_str.as_str()];
        args.extend(self.extra_args.iter().map(String::as_str));

        match self.runner.run(&self.tool, &args, None, self.timeout).await {
            Ok(out) => {
                if out.stdout.contains(SYNTAX_ERROR_MARKER) {
                    info!(path = %path.display(), "syntax check failed");
                    CheckOutcome::Failed
                } else {
                    info!(path = %path.display(), "syntax check passed");
                    CheckOutcome::Passed
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "checker tool could not be run");
                CheckOutcome::Inconclusive
            }
        }
    }
}
