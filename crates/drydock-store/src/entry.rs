//! Public build-log entry type.

use serde::{Deserialize, Serialize};

/// Format used for `build_date` fields.
pub const BUILD_DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's date in [`BUILD_DATE_FORMAT`].
pub fn today() -> String {
    chrono::Local::now().format(BUILD_DATE_FORMAT).to_string()
}

/// One immutable record of a build outcome.
///
/// Entries are created exclusively by the pipeline after a check
/// completes; there is no update or delete path. `build_date` is set
/// by the store at write time, never by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildLogEntry {
    /// Store-assigned id, monotonically unique.
    pub id: i64,

    /// Commit hash, globally unique across all entries.
    pub commit_hash: String,

    /// Creation date in `YYYY-MM-DD` form.
    pub build_date: String,

    /// Test stage outcome.
    pub test_result: String,

    /// Lint/syntax stage outcome.
    pub lint_result: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_is_iso_date_shaped() {
        let date = today();
        assert_eq!(date.len(), 10, "expected YYYY-MM-DD, got: {date}");
        let parts: Vec<&str> = date.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())));
    }
}
