//! Error types for the health transfer engine.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::transfer::{ExportErrorCode, ImportOutcome, TransferError};

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    DatabaseError,
    SchemaTooNew,

    // Not Found (exit 3)
    AppInfoNotFound,
    RecordNotFound,

    // Validation (exit 4)
    InvalidArgument,

    // Transfer (exit 6)
    TransferError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::SchemaTooNew => "SCHEMA_TOO_NEW",
            Self::AppInfoNotFound => "APP_INFO_NOT_FOUND",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::TransferError => "TRANSFER_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::DatabaseError | Self::SchemaTooNew => 2,
            Self::AppInfoNotFound | Self::RecordNotFound => 3,
            Self::InvalidArgument => 4,
            Self::TransferError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether retrying the same call with corrected input can succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument | Self::DatabaseError | Self::TransferError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in storage and CLI operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `htx init` first")]
    NotInitialized,

    #[error("Database at {path} has schema version {found}, newest supported is {supported}")]
    SchemaTooNew {
        path: PathBuf,
        found: i32,
        supported: i32,
    },

    #[error("No app info row for package: {package}")]
    AppInfoNotFound { package: String },

    #[error("Record not found: {uuid}")]
    RecordNotFound { uuid: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Export failed: {code}")]
    ExportFailed { code: ExportErrorCode },

    #[error("Import failed: {outcome}")]
    ImportFailed { outcome: ImportOutcome },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::SchemaTooNew { .. } => ErrorCode::SchemaTooNew,
            Self::AppInfoNotFound { .. } => ErrorCode::AppInfoNotFound,
            Self::RecordNotFound { .. } => ErrorCode::RecordNotFound,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Transfer(_) | Self::ExportFailed { .. } | Self::ImportFailed { .. } => {
                ErrorCode::TransferError
            }
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Recovery hint for the user.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => Some("Run `htx init` to create the health database".to_string()),

            Self::SchemaTooNew { supported, .. } => Some(format!(
                "This build understands schema versions up to {supported}. \
                 Upgrade htx before opening this database."
            )),

            Self::AppInfoNotFound { package } => Some(format!(
                "No app identity for '{package}'. Install the app or import data that references it."
            )),

            Self::InvalidArgument(msg) if msg.contains("period") => Some(
                "Export period is given in days. Use 0 to disable scheduled exports.".to_string(),
            ),

            Self::Transfer(TransferError::FileNotFound(_))
            | Self::ExportFailed {
                code: ExportErrorCode::LostFileAccess,
            } => Some(
                "The destination is no longer accessible. Pick a new one with \
                 `htx configure --destination <uri>`."
                    .to_string(),
            ),

            Self::ImportFailed {
                outcome: ImportOutcome::NotMergeable,
            } => Some("The archive was written by a newer schema. Upgrade htx to import it.".to_string()),

            Self::ImportFailed {
                outcome: ImportOutcome::CopyFailed,
            } => Some("Check that the archive exists and is a health data export.".to_string()),

            Self::RecordNotFound { .. }
            | Self::ExportFailed { .. }
            | Self::ImportFailed { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Transfer(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(Error::NotInitialized.exit_code(), 2);
        assert_eq!(
            Error::RecordNotFound { uuid: "x".into() }.exit_code(),
            3
        );
        assert_eq!(Error::InvalidArgument("bad".into()).exit_code(), 4);
        assert_eq!(Error::Config("bad".into()).exit_code(), 7);
        assert_eq!(Error::Other("boom".into()).exit_code(), 1);
    }

    #[test]
    fn test_structured_json_includes_hint() {
        let err = Error::NotInitialized;
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "NOT_INITIALIZED");
        assert_eq!(json["error"]["exit_code"], 2);
        assert!(json["error"]["hint"].as_str().unwrap().contains("htx init"));
    }

    #[test]
    fn test_failed_transfers_are_retryable() {
        let err = Error::ExportFailed {
            code: ExportErrorCode::LostFileAccess,
        };
        assert_eq!(err.exit_code(), 6);
        assert!(err.to_structured_json()["error"]["retryable"].as_bool().unwrap());
        assert!(err.hint().unwrap().contains("--destination"));

        let err = Error::ImportFailed {
            outcome: ImportOutcome::NotMergeable,
        };
        assert_eq!(err.to_string(), "Import failed: not_mergeable");
    }

    #[test]
    fn test_lost_destination_hint() {
        let err = Error::Transfer(TransferError::FileNotFound("file:///gone".into()));
        assert!(err.hint().unwrap().contains("--destination"));
    }
}
