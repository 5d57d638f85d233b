//! Error types for drydock-notify

use thiserror::Error;

/// Errors that can occur while notifying the host of a commit status.
///
/// The three host-API sub-cases (configuration, repository resolution,
/// status creation) are distinguishable and carry their original
/// cause.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// State string is not one of pending/success/failure/error.
    #[error("Invalid commit status state: {state}. Must be one of pending, success, failure, error")]
    InvalidState { state: String },

    /// A required environment value is absent.
    #[error("Missing GitHub configuration: {var} is not set")]
    MissingConfig { var: &'static str },

    /// The target repository could not be resolved (bad credentials,
    /// nonexistent repo).
    #[error("Error accessing repository {repo}: {source}")]
    RepoResolution {
        repo: String,
        #[source]
        source: reqwest::Error,
    },

    /// The status object could not be created on the commit.
    #[error("Error updating commit status for {sha}: {source}")]
    StatusCreation {
        sha: String,
        #[source]
        source: reqwest::Error,
    },
}
