//! In-memory fake for the build log (testing only)
//!
//! Provides `MemoryBuildLog` which satisfies the [`BuildLog`] contract
//! without any external dependencies, including commit-hash uniqueness
//! and monotonic id assignment.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::entry::{today, BuildLogEntry};
use crate::error::StoreError;
use crate::store_traits::{BuildLog, StoreResult};

/// In-memory build log backed by a `Vec` in insertion order.
#[derive(Debug, Default)]
pub struct MemoryBuildLog {
    entries: Mutex<Vec<BuildLogEntry>>,
}

impl MemoryBuildLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BuildLog for MemoryBuildLog {
    async fn list_all(&self) -> StoreResult<Vec<BuildLogEntry>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.clone())
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<BuildLogEntry>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.iter().find(|e| e.id == id).cloned())
    }

    async fn get_by_commit(&self, commit_hash: &str) -> StoreResult<Option<BuildLogEntry>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.iter().find(|e| e.commit_hash == commit_hash).cloned())
    }

    async fn get_by_date(&self, build_date: &str) -> StoreResult<Vec<BuildLogEntry>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|e| e.build_date == build_date)
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        commit_hash: &str,
        test_result: &str,
        lint_result: &str,
    ) -> StoreResult<BuildLogEntry> {
        // Check-and-insert under one lock: the fake's equivalent of the
        // storage-level unique constraint.
        let mut entries = self.entries.lock().unwrap();
        if entries.iter().any(|e| e.commit_hash == commit_hash) {
            return Err(StoreError::DuplicateCommit {
                commit_hash: commit_hash.to_string(),
            });
        }

        let id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        let entry = BuildLogEntry {
            id,
            commit_hash: commit_hash.to_string(),
            build_date: today(),
            test_result: test_result.to_string(),
            lint_result: lint_result.to_string(),
        };
        entries.push(entry.clone());
        Ok(entry)
    }
}
