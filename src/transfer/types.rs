//! Shared types for export, import and merge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::storage::RecordType;

/// Errors from the single-entry archive helpers.
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The archive ended without an entry of the requested name.
    #[error("Archive has no entry named {0}")]
    EntryNotFound(String),
}

/// Transfer-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Compress(#[from] CompressError),

    /// The destination or source URI no longer resolves to something we
    /// may open.
    #[error("File not accessible: {0}")]
    FileNotFound(String),

    #[error("No export destination configured")]
    NoDestination,

    #[error("Unsupported URI scheme: {0}")]
    UnsupportedUri(String),
}

impl From<rusqlite::Error> for TransferError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<crate::error::Error> for TransferError {
    fn from(err: crate::error::Error) -> Self {
        match err {
            crate::error::Error::Transfer(inner) => inner,
            crate::error::Error::Io(io) => Self::Io(io),
            other => Self::Database(other.to_string()),
        }
    }
}

/// Result type for transfer operations.
pub type TransferResult<T> = std::result::Result<T, TransferError>;

/// Errors that abort a merge.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("Database error: {0}")]
    Database(String),

    /// A staged record points at an app row the staged database does not have.
    #[error("Staged {record_type} record references unknown app info id {app_info_id}")]
    UnknownAppInfo {
        record_type: RecordType,
        app_info_id: i64,
    },
}

impl From<rusqlite::Error> for MergeError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<crate::error::Error> for MergeError {
    fn from(err: crate::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Persisted reason for the last failed export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportErrorCode {
    Unknown,
    /// The destination was revoked or deleted; the user has to pick a new one.
    LostFileAccess,
}

impl ExportErrorCode {
    /// Classify the error that stopped an export.
    #[must_use]
    pub const fn classify(err: &TransferError) -> Self {
        match err {
            TransferError::FileNotFound(_) | TransferError::NoDestination => Self::LostFileAccess,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::LostFileAccess => "LOST_FILE_ACCESS",
        }
    }
}

impl std::fmt::Display for ExportErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted result of the last import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportOutcome {
    Merged,
    /// Staged database missing or written by a newer schema.
    NotMergeable,
    /// The archive could not be read or unpacked.
    CopyFailed,
    MergeFailed,
}

impl std::fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merged => write!(f, "merged"),
            Self::NotMergeable => write!(f, "not_mergeable"),
            Self::CopyFailed => write!(f, "copy_failed"),
            Self::MergeFailed => write!(f, "merge_failed"),
        }
    }
}

/// Statistics for a merge.
#[derive(Debug, Default, Clone, Serialize)]
pub struct MergeStats {
    /// App identity rows created in the primary database.
    pub apps_created: usize,
    /// Records written to the primary database, per type.
    pub records_migrated: BTreeMap<RecordType, usize>,
    /// Rows removed from the staged record tables.
    pub staged_rows_deleted: usize,
    /// Categories whose priority list changed.
    pub categories_merged: usize,
}

impl MergeStats {
    /// Total number of records migrated.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.records_migrated.values().sum()
    }
}

/// Sizes observed during a successful export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSizes {
    pub original_bytes: u64,
    pub compressed_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_lost_file_access() {
        assert_eq!(
            ExportErrorCode::classify(&TransferError::FileNotFound("file:///x".into())),
            ExportErrorCode::LostFileAccess
        );
        assert_eq!(
            ExportErrorCode::classify(&TransferError::NoDestination),
            ExportErrorCode::LostFileAccess
        );
        assert_eq!(
            ExportErrorCode::classify(&TransferError::Database("corrupt".into())),
            ExportErrorCode::Unknown
        );
    }

    #[test]
    fn test_merge_stats_total() {
        let mut stats = MergeStats::default();
        stats.records_migrated.insert(RecordType::Steps, 4);
        stats.records_migrated.insert(RecordType::Weight, 2);
        assert_eq!(stats.total_records(), 6);
    }

    #[test]
    fn test_error_code_serializes_screaming() {
        let json = serde_json::to_string(&ExportErrorCode::LostFileAccess).unwrap();
        assert_eq!(json, "\"LOST_FILE_ACCESS\"");
    }
}
