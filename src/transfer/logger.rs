//! Per-attempt metrics for exports and imports.
//!
//! Each attempt produces one tracing event and, when a metrics file is
//! configured, one JSON line appended to it.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::transfer::file::append_jsonl;
use crate::transfer::types::{ExportErrorCode, ImportOutcome};

pub const METRICS_FILE_NAME: &str = "transfer_metrics.jsonl";

/// Which pipeline produced a metrics line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Export,
    Import,
}

/// One metrics line.
#[derive(Debug, Clone, Serialize)]
pub struct TransferMetrics {
    pub kind: TransferKind,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ExportErrorCode>,
    pub duration_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_size_kb: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed_size_kb: Option<i32>,
    pub timestamp_ms: i64,
}

/// Size in whole kilobytes, saturating at `i32::MAX`.
///
/// That ceiling is roughly 2 TB, far beyond any database this runs on.
#[must_use]
pub fn size_in_kb(bytes: u64) -> i32 {
    i32::try_from(bytes / 1024).unwrap_or(i32::MAX)
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Records transfer metrics.
#[derive(Debug, Clone, Default)]
pub struct TransferLogger {
    metrics_path: Option<PathBuf>,
}

impl TransferLogger {
    /// Log to tracing and append to `metrics_path`.
    #[must_use]
    pub fn new(metrics_path: PathBuf) -> Self {
        Self {
            metrics_path: Some(metrics_path),
        }
    }

    /// Log to tracing only.
    #[must_use]
    pub fn tracing_only() -> Self {
        Self::default()
    }

    pub fn log_export_success(&self, elapsed: Duration, original_bytes: u64, compressed_bytes: u64) {
        self.record(&TransferMetrics {
            kind: TransferKind::Export,
            status: "success".to_string(),
            error_code: None,
            duration_ms: duration_ms(elapsed),
            original_size_kb: Some(size_in_kb(original_bytes)),
            compressed_size_kb: Some(size_in_kb(compressed_bytes)),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        });
    }

    pub fn log_export_error(&self, elapsed: Duration, code: ExportErrorCode) {
        self.record(&TransferMetrics {
            kind: TransferKind::Export,
            status: "error".to_string(),
            error_code: Some(code),
            duration_ms: duration_ms(elapsed),
            original_size_kb: None,
            compressed_size_kb: None,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        });
    }

    pub fn log_import(&self, elapsed: Duration, outcome: ImportOutcome, staged_bytes: Option<u64>) {
        self.record(&TransferMetrics {
            kind: TransferKind::Import,
            status: outcome.to_string(),
            error_code: None,
            duration_ms: duration_ms(elapsed),
            original_size_kb: staged_bytes.map(size_in_kb),
            compressed_size_kb: None,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        });
    }

    fn record(&self, metrics: &TransferMetrics) {
        info!(
            kind = ?metrics.kind,
            status = metrics.status,
            error_code = ?metrics.error_code,
            duration_ms = metrics.duration_ms,
            original_size_kb = metrics.original_size_kb,
            compressed_size_kb = metrics.compressed_size_kb,
            "Transfer finished"
        );

        if let Some(path) = &self.metrics_path {
            if let Err(e) = append_jsonl(path, metrics) {
                warn!(path = %path.display(), error = %e, "Failed to append transfer metrics");
            }
        }
    }
}
