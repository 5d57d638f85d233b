//! Drydock status notifier.
//!
//! Reports a commit's build state to GitHub via the commit-status API.
//! Configuration and the state string are validated eagerly, before
//! any network access; host-side failures are wrapped per operation so
//! callers can tell a bad repository from a failed status create.

mod config;
mod error;
mod status;

pub use config::{NotifyConfig, AUTH_TOKEN_VAR, REPO_NAME_VAR, REPO_OWNER_VAR};
pub use error::NotifyError;
pub use status::{CommitState, StatusClient, DEFAULT_CONTEXT};

/// Result type for notifier operations
pub type Result<T> = std::result::Result<T, NotifyError>;
