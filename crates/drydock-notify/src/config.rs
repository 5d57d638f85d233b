//! Notifier configuration
//!
//! Three environment values are required: the auth token, the
//! repository owner, and the repository name. Their absence is a
//! configuration fault raised eagerly, before any network access.

use crate::error::NotifyError;
use crate::Result;

/// Environment variable holding the GitHub auth token.
pub const AUTH_TOKEN_VAR: &str = "CI_SERVER_AUTH_TOKEN";
/// Environment variable holding the repository owner.
pub const REPO_OWNER_VAR: &str = "REPO_OWNER";
/// Environment variable holding the repository name.
pub const REPO_NAME_VAR: &str = "REPO_NAME";

const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Notifier configuration
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// GitHub auth token
    pub token: String,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// API base URL
    pub base_url: String,
}

impl NotifyConfig {
    /// Create a config from explicit values.
    pub fn new(token: &str, owner: &str, repo: &str) -> Self {
        NotifyConfig {
            token: token.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a config from environment variables.
    ///
    /// Fails with [`NotifyError::MissingConfig`] naming the first
    /// absent variable.
    pub fn from_env() -> Result<Self> {
        Ok(NotifyConfig {
            token: require(AUTH_TOKEN_VAR)?,
            owner: require(REPO_OWNER_VAR)?,
            repo: require(REPO_NAME_VAR)?,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different API host.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// `owner/repo` slug used in API paths and error messages.
    pub fn repo_slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

fn require(var: &'static str) -> Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(NotifyError::MissingConfig { var }),
    }
}
