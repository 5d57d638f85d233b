//! SurrealDB-backed [`BuildLog`] implementation.
//!
//! Uses `schema::BuildLogRecord` for persistence, converting to the
//! public [`BuildLogEntry`] at the boundary. There is no import-time
//! global: callers open a handle explicitly at startup and pass it to
//! the orchestrator.

use std::path::Path;

use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::entry::{today, BuildLogEntry};
use crate::error::StoreError;
use crate::migrations::{self, COMMIT_HASH_INDEX};
use crate::schema::BuildLogRecord;
use crate::store_traits::{BuildLog, StoreResult};

/// Default directory holding the on-disk build log.
pub const DEFAULT_DATABASE_DIR: &str = "database";

/// SurrealDB-backed build log.
pub struct SurrealBuildLog {
    db: Surreal<Any>,
}

impl SurrealBuildLog {
    /// Create an in-memory instance for testing.
    ///
    /// Connects to `mem://`, selects `drydock/main`, and runs
    /// `init_schema`.
    pub async fn in_memory() -> crate::Result<Self> {
        Self::connect("mem://").await
    }

    /// Open (or create) the on-disk build log under the given
    /// directory.
    pub async fn open(dir: &Path) -> crate::Result<Self> {
        std::fs::create_dir_all(dir).map_err(|e| {
            StoreError::Connection(format!(
                "Failed to create database directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        let url = format!("surrealkv://{}", dir.join("ci.db").display());
        Self::connect(&url).await
    }

    /// Open the build log in the fixed `database` directory.
    pub async fn open_default() -> crate::Result<Self> {
        Self::open(Path::new(DEFAULT_DATABASE_DIR)).await
    }

    async fn connect(url: &str) -> crate::Result<Self> {
        let db = surrealdb::engine::any::connect(url)
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to connect to {url}: {e}")))?;

        db.use_ns("drydock")
            .use_db("main")
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;

        info!("SurrealBuildLog connected ({url})");
        Ok(Self { db })
    }

    /// Re-run schema initialization. Idempotent; safe at any time.
    pub async fn init_schema(&self) -> crate::Result<()> {
        migrations::init_schema(&self.db).await
    }

    // -- private helpers -----------------------------------------------------

    /// Allocate the next monotonic entry id.
    ///
    /// A single `UPSERT ... +=` statement is atomic in SurrealDB, so
    /// concurrent writers never observe the same id.
    async fn next_id(&self) -> StoreResult<i64> {
        let mut res = self
            .db
            .query("UPSERT counter:build_log SET value += 1 RETURN VALUE value")
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let ids: Vec<i64> = res
            .take(0)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        ids.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("counter returned no value".to_string()))
    }

    /// Classify an insert rejection. Only a violation of the
    /// commit-hash index becomes [`StoreError::DuplicateCommit`], so
    /// the race loser sees the same fault the pre-check produces; any
    /// other rejection stays a backend fault.
    fn classify_insert_error(commit_hash: &str, msg: &str) -> StoreError {
        if msg.contains(COMMIT_HASH_INDEX) {
            StoreError::DuplicateCommit {
                commit_hash: commit_hash.to_string(),
            }
        } else {
            StoreError::Backend(msg.to_string())
        }
    }
}

#[async_trait]
impl BuildLog for SurrealBuildLog {
    async fn list_all(&self) -> StoreResult<Vec<BuildLogEntry>> {
        let mut res = self
            .db
            .query("SELECT * FROM build_log ORDER BY build_id ASC")
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows: Vec<BuildLogRecord> = res
            .take(0)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(rows.into_iter().map(BuildLogEntry::from).collect())
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<BuildLogEntry>> {
        let mut res = self
            .db
            .query("SELECT * FROM build_log WHERE build_id = $id")
            .bind(("id", id))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows: Vec<BuildLogRecord> = res
            .take(0)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(rows.into_iter().next().map(BuildLogEntry::from))
    }

    async fn get_by_commit(&self, commit_hash: &str) -> StoreResult<Option<BuildLogEntry>> {
        let hash_owned = commit_hash.to_string();
        let mut res = self
            .db
            .query("SELECT * FROM build_log WHERE commit_hash = $hash")
            .bind(("hash", hash_owned))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows: Vec<BuildLogRecord> = res
            .take(0)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(rows.into_iter().next().map(BuildLogEntry::from))
    }

    async fn get_by_date(&self, build_date: &str) -> StoreResult<Vec<BuildLogEntry>> {
        let date_owned = build_date.to_string();
        let mut res = self
            .db
            .query("SELECT * FROM build_log WHERE build_date = $date ORDER BY build_id ASC")
            .bind(("date", date_owned))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows: Vec<BuildLogRecord> = res
            .take(0)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(rows.into_iter().map(BuildLogEntry::from).collect())
    }

    async fn create(
        &self,
        commit_hash: &str,
        test_result: &str,
        lint_result: &str,
    ) -> StoreResult<BuildLogEntry> {
        // Fast-path duplicate check; the UNIQUE index is authoritative.
        if self.get_by_commit(commit_hash).await?.is_some() {
            return Err(StoreError::DuplicateCommit {
                commit_hash: commit_hash.to_string(),
            });
        }

        let id = self.next_id().await?;
        let row = BuildLogRecord::new(id, commit_hash, today(), test_result, lint_result);

        debug!(commit = commit_hash, build_id = id, "creating build log entry");

        let created: Option<BuildLogRecord> = self
            .db
            .create("build_log")
            .content(row)
            .await
            .map_err(|e| Self::classify_insert_error(commit_hash, &e.to_string()))?;

        created
            .map(BuildLogEntry::from)
            .ok_or_else(|| StoreError::Backend("create returned no record".to_string()))
    }
}
