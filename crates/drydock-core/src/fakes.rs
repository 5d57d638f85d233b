//! Scripted [`CommandRunner`] fake (testing only)
//!
//! Records every invocation and replies with canned outputs, so tests
//! can assert which processes would have been spawned and in what
//! order.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::exec::{CommandRunner, ExecOutput};

/// One recorded process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

/// Canned reply for a scripted invocation.
#[derive(Debug, Clone)]
pub enum CannedOutput {
    /// Command ran and exited.
    Completes {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    /// Command could not be run at all.
    FailsToSpawn { error: String },
}

impl CannedOutput {
    /// Clean exit with empty output.
    pub fn ok() -> Self {
        Self::Completes {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Clean exit with the given stdout.
    pub fn ok_with_stdout(stdout: &str) -> Self {
        Self::Completes {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    /// Nonzero exit.
    pub fn exits_with(exit_code: i32) -> Self {
        Self::Completes {
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Spawn failure (missing binary, crash).
    pub fn spawn_failure(error: &str) -> Self {
        Self::FailsToSpawn {
            error: error.to_string(),
        }
    }
}

/// Recording fake with a FIFO of canned replies.
///
/// Invocations beyond the scripted replies get [`CannedOutput::ok`].
/// With `materializing_clone_targets`, a `git clone` invocation also
/// creates its target directory with one file in it, mimicking a
/// checkout.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    invocations: Mutex<Vec<Invocation>>,
    responses: Mutex<VecDeque<CannedOutput>>,
    materialize_clone_targets: bool,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `git clone` invocations create their target directory.
    pub fn materializing_clone_targets(mut self) -> Self {
        self.materialize_clone_targets = true;
        self
    }

    /// Queue the reply for the next unanswered invocation.
    pub fn push_response(&self, response: CannedOutput) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// All invocations recorded so far.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Number of invocations recorded so far.
    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
        _timeout: Duration,
    ) -> anyhow::Result<ExecOutput> {
        self.invocations.lock().unwrap().push(Invocation {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: cwd.map(Path::to_path_buf),
        });

        if self.materialize_clone_targets && program == "git" && args.first() == Some(&"clone") {
            if let Some(target) = args.last() {
                std::fs::create_dir_all(target)?;
                std::fs::write(Path::new(target).join("README.md"), "scripted checkout\n")?;
            }
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(CannedOutput::ok);

        match response {
            CannedOutput::Completes {
                exit_code,
                stdout,
                stderr,
            } => Ok(ExecOutput {
                exit_code,
                stdout,
                stderr,
                duration_ms: 0,
            }),
            CannedOutput::FailsToSpawn { error } => Err(anyhow::anyhow!(error)),
        }
    }
}
