//! Build pipeline orchestration.
//!
//! Processes one build request at a time, strictly sequentially:
//! clone → check → notify → persist → clean up. Each stage's output
//! gates the next; store and notifier faults are caught and reflected
//! in the report rather than crashing the pipeline.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use drydock_notify::{CommitState, StatusClient};
use drydock_store::{BuildLog, StoreError};

use crate::checker::{CheckOutcome, SyntaxChecker};
use crate::workspace::WorkspaceManager;

/// One build to run.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Repository URL on the expected host.
    pub repo_url: String,

    /// Branch to build.
    pub branch: String,

    /// Caller-supplied id namespacing the workspace.
    pub request_id: String,

    /// Commit to report against. When absent, the workspace HEAD is
    /// captured after the clone.
    pub commit_sha: Option<String>,
}

impl BuildRequest {
    pub fn new(repo_url: &str, branch: &str, request_id: &str) -> Self {
        BuildRequest {
            repo_url: repo_url.to_string(),
            branch: branch.to_string(),
            request_id: request_id.to_string(),
            commit_sha: None,
        }
    }

    /// Pin the commit the status and build record are attached to.
    pub fn with_commit_sha(mut self, sha: &str) -> Self {
        self.commit_sha = Some(sha.to_string());
        self
    }
}

/// Result of a complete pipeline execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    /// Workspace name, once derived.
    pub workspace: Option<String>,

    /// Commit the build was attributed to.
    pub commit_sha: Option<String>,

    /// Whether the clone stage succeeded.
    pub cloned: bool,

    /// Syntax gate outcome, if the gate ran.
    pub outcome: Option<CheckOutcome>,

    /// Whether the host accepted the commit status.
    pub notified: bool,

    /// Whether a build-log entry was written.
    pub recorded: bool,

    /// Whether the workspace was removed during cleanup.
    pub workspace_removed: bool,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl PipelineReport {
    /// Whether the build as a whole passed.
    pub fn success(&self) -> bool {
        self.cloned && self.outcome == Some(CheckOutcome::Passed)
    }
}

/// Sequences workspace, checker, notifier, and store for one request.
pub struct Pipeline {
    workspace: WorkspaceManager,
    checker: SyntaxChecker,
    store: Arc<dyn BuildLog>,
    notifier: Option<StatusClient>,
}

impl Pipeline {
    pub fn new(
        workspace: WorkspaceManager,
        checker: SyntaxChecker,
        store: Arc<dyn BuildLog>,
    ) -> Self {
        Pipeline {
            workspace,
            checker,
            store,
            notifier: None,
        }
    }

    /// Attach a commit-status notifier.
    pub fn with_notifier(mut self, notifier: StatusClient) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Execute one build request end to end.
    pub async fn run(&self, request: &BuildRequest) -> PipelineReport {
        let start = Instant::now();
        let mut report = PipelineReport::default();

        let Some(name) = self
            .workspace
            .workspace_name(&request.repo_url, &request.request_id)
        else {
            warn!(url = %request.repo_url, "cannot derive workspace name; aborting build");
            report.duration_ms = start.elapsed().as_millis() as u64;
            return report;
        };
        report.workspace = Some(name.clone());

        info!(workspace = %name, branch = %request.branch, "starting build");

        if !self
            .workspace
            .clone_repo(&request.repo_url, &request.request_id, &request.branch)
            .await
        {
            warn!(workspace = %name, "clone failed; aborting build");
            if let Some(sha) = &request.commit_sha {
                report.commit_sha = Some(sha.clone());
                report.notified = self
                    .notify(sha, CommitState::Error, "Workspace clone failed.")
                    .await;
                // A failed clone is still a failed build; keep it in
                // the durable record.
                report.recorded = self.record(sha, "fail", "fail").await;
            }
            // A failed clone can still leave a partial tree behind.
            report.workspace_removed = self.workspace.delete(&name);
            report.duration_ms = start.elapsed().as_millis() as u64;
            return report;
        }
        report.cloned = true;

        let sha = match &request.commit_sha {
            Some(sha) => Some(sha.clone()),
            None => self.workspace.head_sha(&name).await,
        };

        let outcome = self.checker.check(&self.workspace.path(&name)).await;
        report.outcome = Some(outcome);

        if let Some(sha) = &sha {
            report.commit_sha = Some(sha.clone());

            let (state, description) = match outcome {
                CheckOutcome::Passed => {
                    (CommitState::Success, "Syntax check passed with no errors.")
                }
                CheckOutcome::Failed => (
                    CommitState::Failure,
                    "Syntax check failed. There is a syntax error.",
                ),
                CheckOutcome::Inconclusive => {
                    (CommitState::Error, "Syntax check could not be run.")
                }
            };
            report.notified = self.notify(sha, state, description).await;

            // The syntax gate is the only check stage; it feeds both
            // result columns.
            report.recorded = self
                .record(sha, outcome.as_str(), outcome.as_str())
                .await;
        } else {
            warn!(workspace = %name, "could not determine commit sha; skipping notify and record");
        }

        report.workspace_removed = self.workspace.delete(&name);
        report.duration_ms = start.elapsed().as_millis() as u64;

        if report.success() {
            info!(workspace = %name, "build completed successfully");
        } else {
            info!(workspace = %name, "build failed");
        }
        report
    }

    async fn record(&self, sha: &str, test_result: &str, lint_result: &str) -> bool {
        match self.store.create(sha, test_result, lint_result).await {
            Ok(entry) => {
                info!(build_id = entry.id, commit = %sha, "build recorded");
                true
            }
            Err(StoreError::DuplicateCommit { .. }) => {
                warn!(commit = %sha, "build already recorded for commit");
                false
            }
            Err(e) => {
                warn!(commit = %sha, error = %e, "failed to record build");
                false
            }
        }
    }

    async fn notify(&self, sha: &str, state: CommitState, description: &str) -> bool {
        let Some(notifier) = &self.notifier else {
            debug!("no notifier configured; skipping commit status");
            return false;
        };
        match notifier
            .update_commit_status(sha, state.as_str(), description, None)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(sha, error = %e, "failed to update commit status");
                false
            }
        }
    }
}
