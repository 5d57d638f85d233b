//! SurrealDB schema initialization for the build log.
//!
//! Sets up the `build_log` table with the commit-hash uniqueness
//! constraint. Safe to call multiple times or concurrently at startup
//! (idempotent).

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::Result;

/// Name of the UNIQUE index guarding `commit_hash`.
///
/// Also used to recognize constraint-violation errors at insert time.
pub(crate) const COMMIT_HASH_INDEX: &str = "idx_commit_hash";

/// Initialize the build-log tables.
///
/// Schema:
/// ```text
/// TABLE build_log {
///   build_id:     INT (unique, monotonic, store-assigned)
///   commit_hash:  STRING (unique)
///   build_date:   STRING "YYYY-MM-DD" (indexed)
///   test_result:  STRING
///   lint_result:  STRING
/// }
/// ```
///
/// Constraints:
/// - `commit_hash` is unique — the authoritative duplicate guard
/// - entries are immutable: update and delete permissions are denied
/// - `build_id` allocation goes through the `counter` table
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing build_log schema");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS build_log SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR read FULL
                FOR update NONE
                FOR delete NONE;

        -- Authoritative uniqueness guard for commit hashes
        DEFINE INDEX IF NOT EXISTS idx_commit_hash ON TABLE build_log COLUMNS commit_hash UNIQUE;

        -- Entry ids are store-assigned and unique
        DEFINE INDEX IF NOT EXISTS idx_build_id ON TABLE build_log COLUMNS build_id UNIQUE;

        -- Index build_date for by-date queries
        DEFINE INDEX IF NOT EXISTS idx_build_date ON TABLE build_log COLUMNS build_date;

        -- Monotonic id allocation
        DEFINE TABLE IF NOT EXISTS counter SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR read FULL
                FOR update FULL
                FOR delete NONE;
    "#;

    db.query(sql)
        .await
        .map_err(|e| StoreError::Schema(e.to_string()))?;

    info!("build_log schema initialized");
    Ok(())
}
