//! Storage trait for the build log.
//!
//! The trait is async and backend-agnostic. An in-memory fake is
//! provided for testing via the `fakes` module.

use async_trait::async_trait;

use crate::entry::BuildLogEntry;
use crate::error::StoreError;

/// Result type for [`BuildLog`] operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable, queryable record of past builds.
///
/// Guarantees:
/// - `commit_hash` is unique across all entries, enforced at the
///   storage layer.
/// - Entries are immutable once created; the only mutation is insert.
/// - `list_all` returns entries in insertion (id) order.
/// - Reads return `None`/empty collections for absent data, never an
///   error.
#[async_trait]
pub trait BuildLog: Send + Sync {
    /// All entries in insertion order. Empty if none exist.
    async fn list_all(&self) -> StoreResult<Vec<BuildLogEntry>>;

    /// Entry with the given id, if any.
    async fn get_by_id(&self, id: i64) -> StoreResult<Option<BuildLogEntry>>;

    /// Entry for the given commit hash, if any. The uniqueness
    /// invariant guarantees at most one.
    async fn get_by_commit(&self, commit_hash: &str) -> StoreResult<Option<BuildLogEntry>>;

    /// All entries created on the given `YYYY-MM-DD` date.
    async fn get_by_date(&self, build_date: &str) -> StoreResult<Vec<BuildLogEntry>>;

    /// Insert a new entry with `build_date` set to today.
    ///
    /// The duplicate pre-check is a fast path only; concurrent writers
    /// can both pass it, in which case exactly one insert wins and the
    /// loser still surfaces [`StoreError::DuplicateCommit`].
    async fn create(
        &self,
        commit_hash: &str,
        test_result: &str,
        lint_result: &str,
    ) -> StoreResult<BuildLogEntry>;
}
