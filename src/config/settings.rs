//! Persisted export/import settings for one user.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::transfer::file::atomic_write;
use crate::transfer::{user_dir, ExportErrorCode, ImportOutcome};

pub const SETTINGS_FILE_NAME: &str = "export_import_settings.json";

/// The last export that reached its destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastExport {
    pub time_ms: i64,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastExportError {
    pub code: ExportErrorCode,
    pub time_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastImport {
    pub outcome: ImportOutcome,
    pub time_ms: i64,
}

/// Everything the export/import pipeline persists between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportImportSettings {
    /// Days between scheduled exports; zero or less disables them.
    pub export_period_days: i32,
    pub destination_uri: Option<String>,
    pub last_successful_export: Option<LastExport>,
    pub last_export_error: Option<LastExportError>,
    pub last_import: Option<LastImport>,
}

/// JSON-file backed settings, written atomically.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SettingsStore {
    /// Settings of `user` under `data_root`.
    #[must_use]
    pub fn for_user(data_root: &Path, user: u32) -> Self {
        Self::at(user_dir(data_root, user).join(SETTINGS_FILE_NAME))
    }

    #[must_use]
    pub fn at(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current settings; defaults if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<ExportImportSettings> {
        let _guard = self.lock.lock();
        self.read_unlocked()
    }

    fn read_unlocked(&self) -> Result<ExportImportSettings> {
        if !self.path.exists() {
            return Ok(ExportImportSettings::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply `f` to the stored settings and save the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be read or written.
    pub fn update(
        &self,
        f: impl FnOnce(&mut ExportImportSettings),
    ) -> Result<ExportImportSettings> {
        let _guard = self.lock.lock();
        let mut settings = self.read_unlocked()?;
        f(&mut settings);
        let content = serde_json::to_string_pretty(&settings)?;
        atomic_write(&self.path, &content)?;
        debug!(path = %self.path.display(), "Settings saved");
        Ok(settings)
    }

    /// # Errors
    ///
    /// Returns an error if the settings cannot be saved.
    pub fn set_export_period(&self, days: i32) -> Result<ExportImportSettings> {
        self.update(|s| s.export_period_days = days)
    }

    /// Point exports at a new destination.
    ///
    /// A changed destination clears the last export error, which described
    /// the old one.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be saved.
    pub fn set_destination_uri(&self, uri: &str) -> Result<ExportImportSettings> {
        self.update(|s| {
            if s.destination_uri.as_deref() != Some(uri) {
                s.last_export_error = None;
            }
            s.destination_uri = Some(uri.to_string());
        })
    }

    /// # Errors
    ///
    /// Returns an error if the settings cannot be saved.
    pub fn record_export_success(&self, time_ms: i64, uri: &str) -> Result<ExportImportSettings> {
        self.update(|s| {
            s.last_successful_export = Some(LastExport {
                time_ms,
                uri: uri.to_string(),
            });
            s.last_export_error = None;
        })
    }

    /// # Errors
    ///
    /// Returns an error if the settings cannot be saved.
    pub fn record_export_error(
        &self,
        code: ExportErrorCode,
        time_ms: i64,
    ) -> Result<ExportImportSettings> {
        self.update(|s| s.last_export_error = Some(LastExportError { code, time_ms }))
    }

    /// # Errors
    ///
    /// Returns an error if the settings cannot be saved.
    pub fn record_import_outcome(
        &self,
        outcome: ImportOutcome,
        time_ms: i64,
    ) -> Result<ExportImportSettings> {
        self.update(|s| s.last_import = Some(LastImport { outcome, time_ms }))
    }
}
