//! Error types for drydock-store

use thiserror::Error;

/// Errors that can occur in the build-log persistence layer.
///
/// Reads never fault on absence: a missing entry is `Ok(None)` or an
/// empty list, so consumers of the read surface need no error handling
/// for "not found".
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    Schema(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Backend(String),

    /// Insert would violate commit-hash uniqueness.
    ///
    /// Produced by the fast-path pre-check and by the UNIQUE-index
    /// rejection at insert time alike, so callers see the same fault
    /// regardless of which side of the race they land on.
    #[error("Build log already contains an entry for commit {commit_hash}")]
    DuplicateCommit { commit_hash: String },
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}
