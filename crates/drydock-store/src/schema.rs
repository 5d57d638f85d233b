//! Schema definitions for the SurrealDB build_log table.
//!
//! The DB row stores the monotonic entry id under `build_id` so it
//! never collides with SurrealDB's native record id; conversion to the
//! public [`BuildLogEntry`] happens at the boundary.

use serde::{Deserialize, Serialize};

use crate::entry::BuildLogEntry;

/// Database row for the `build_log` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct BuildLogRecord {
    pub build_id: i64,
    pub commit_hash: String,
    pub build_date: String,
    pub test_result: String,
    pub lint_result: String,
}

impl BuildLogRecord {
    pub fn new(
        build_id: i64,
        commit_hash: &str,
        build_date: String,
        test_result: &str,
        lint_result: &str,
    ) -> Self {
        Self {
            build_id,
            commit_hash: commit_hash.to_string(),
            build_date,
            test_result: test_result.to_string(),
            lint_result: lint_result.to_string(),
        }
    }
}

impl From<BuildLogRecord> for BuildLogEntry {
    fn from(row: BuildLogRecord) -> Self {
        BuildLogEntry {
            id: row.build_id,
            commit_hash: row.commit_hash,
            build_date: row.build_date,
            test_result: row.test_result,
            lint_result: row.lint_result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_converts_to_entry() {
        let row = BuildLogRecord::new(7, "abc123", "2026-08-24".to_string(), "pass", "fail");
        let entry: BuildLogEntry = row.into();
        assert_eq!(entry.id, 7);
        assert_eq!(entry.commit_hash, "abc123");
        assert_eq!(entry.build_date, "2026-08-24");
        assert_eq!(entry.test_result, "pass");
        assert_eq!(entry.lint_result, "fail");
    }
}
