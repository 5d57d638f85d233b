//! Commit-status states and the GitHub API client.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::NotifyConfig;
use crate::error::NotifyError;
use crate::Result;

/// Context attached to statuses when the caller supplies none.
pub const DEFAULT_CONTEXT: &str = "CI Notification";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Host-side commit status states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitState {
    Pending,
    Success,
    Failure,
    Error,
}

impl CommitState {
    /// Wire form of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitState::Pending => "pending",
            CommitState::Success => "success",
            CommitState::Failure => "failure",
            CommitState::Error => "error",
        }
    }
}

impl FromStr for CommitState {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(CommitState::Pending),
            "success" => Ok(CommitState::Success),
            "failure" => Ok(CommitState::Failure),
            "error" => Ok(CommitState::Error),
            other => Err(NotifyError::InvalidState {
                state: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for CommitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// GitHub commit-status client.
pub struct StatusClient {
    config: NotifyConfig,
    http: reqwest::Client,
}

impl StatusClient {
    /// Create a client with the given configuration.
    pub fn new(config: NotifyConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("drydock-notify/0.1.0")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        StatusClient { config, http }
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(NotifyConfig::from_env()?))
    }

    /// Report a commit's build state to the host.
    ///
    /// The state string is validated first, so a bogus state never
    /// reaches the network. The target repository is then resolved; a
    /// resolution fault (bad credentials, nonexistent repo) is wrapped
    /// with context rather than swallowed, as is a status-creation
    /// fault. On success the host's raw response payload is returned
    /// unmodified so callers can inspect host-specific fields.
    pub async fn update_commit_status(
        &self,
        sha: &str,
        state: &str,
        description: &str,
        context: Option<&str>,
    ) -> Result<serde_json::Value> {
        let state: CommitState = state.parse()?;
        let context = context.unwrap_or(DEFAULT_CONTEXT);

        self.resolve_repository().await?;

        let url = format!(
            "{}/repos/{}/statuses/{}",
            self.config.base_url,
            self.config.repo_slug(),
            sha
        );
        let body = json!({
            "state": state.as_str(),
            "target_url": "",
            "description": description,
            "context": context,
        });

        debug!(sha, state = %state, "creating commit status");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| NotifyError::StatusCreation {
                sha: sha.to_string(),
                source: e,
            })?;

        let payload = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| NotifyError::StatusCreation {
                sha: sha.to_string(),
                source: e,
            })?;

        info!(sha, state = %state, "commit status updated");
        Ok(payload)
    }

    /// Resolve the target repository, surfacing auth and existence
    /// problems before any status is created.
    async fn resolve_repository(&self) -> Result<()> {
        let url = format!("{}/repos/{}", self.config.base_url, self.config.repo_slug());

        self.http
            .get(&url)
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| NotifyError::RepoResolution {
                repo: self.config.repo_slug(),
                source: e,
            })?;

        Ok(())
    }
}
