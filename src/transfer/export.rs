//! One export cycle: copy, strip, compress, upload.
//!
//! The live database is copied to a private per-user directory, device-local
//! log tables are emptied in the copy, the copy is zipped and the archive is
//! streamed to the configured destination URI. Local files are removed after
//! every run, successful or not.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::config::{FeatureFlags, SettingsStore};
use crate::storage::{HealthStorage, SharedStorage};
use crate::transfer::compress::compress;
use crate::transfer::context::{delete_database_files, remove_if_exists, DatabaseContext};
use crate::transfer::destination::ContentResolver;
use crate::transfer::logger::TransferLogger;
use crate::transfer::notify::{NotificationSender, NotificationType};
use crate::transfer::types::{ExportErrorCode, ExportSizes, TransferError, TransferResult};

/// Directory, per user, holding export temp files.
pub const EXPORT_DIR_NAME: &str = "export_import";
pub const LOCAL_EXPORT_DATABASE_FILE_NAME: &str = "health_connect_export.db";
pub const LOCAL_EXPORT_ZIP_FILE_NAME: &str = "health_connect_export.zip";
/// Name of the single entry inside every export archive.
pub const EXPORT_ARCHIVE_ENTRY_NAME: &str = "health_connect_export.db";

/// Stage an export failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    LocalCopy,
    StripLogs,
    Compress,
    Upload,
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalCopy => write!(f, "local_copy"),
            Self::StripLogs => write!(f, "strip_logs"),
            Self::Compress => write!(f, "compress"),
            Self::Upload => write!(f, "upload"),
        }
    }
}

/// Runs export cycles for one user.
pub struct ExportManager {
    storage: SharedStorage,
    settings: Arc<SettingsStore>,
    resolver: Arc<dyn ContentResolver>,
    notifier: Arc<dyn NotificationSender>,
    logger: TransferLogger,
    flags: FeatureFlags,
    data_root: PathBuf,
    user: u32,
    lock: Mutex<()>,
}

impl ExportManager {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        storage: SharedStorage,
        settings: Arc<SettingsStore>,
        resolver: Arc<dyn ContentResolver>,
        notifier: Arc<dyn NotificationSender>,
        logger: TransferLogger,
        flags: FeatureFlags,
        data_root: PathBuf,
        user: u32,
    ) -> Self {
        Self {
            storage,
            settings,
            resolver,
            notifier,
            logger,
            flags,
            data_root,
            user,
            lock: Mutex::new(()),
        }
    }

    /// Run one export cycle.
    ///
    /// Returns whether the archive reached the destination. The outcome is
    /// persisted in settings; failures also raise a notification when
    /// fast-follow is enabled. At most one cycle runs at a time.
    pub fn run_export(&self) -> bool {
        let _guard = self.lock.lock();
        let started = Instant::now();
        info!(user = self.user, "Starting export");

        let result = DatabaseContext::new(&self.data_root, EXPORT_DIR_NAME, self.user)
            .map_err(|e| (ExportStage::LocalCopy, TransferError::Io(e)))
            .and_then(|context| {
                let db_path = context.file(LOCAL_EXPORT_DATABASE_FILE_NAME);
                let zip_path = context.file(LOCAL_EXPORT_ZIP_FILE_NAME);
                let result = self.export_to(&db_path, &zip_path);
                cleanup(&db_path, &zip_path);
                result
            });

        let now = chrono::Utc::now().timestamp_millis();
        match result {
            Ok((uri, sizes)) => {
                info!(
                    user = self.user,
                    uri = %uri,
                    compressed_bytes = sizes.compressed_bytes,
                    "Export complete"
                );
                if let Err(e) = self.settings.record_export_success(now, &uri) {
                    warn!(error = %e, "Failed to persist export success");
                }
                self.logger.log_export_success(
                    started.elapsed(),
                    sizes.original_bytes,
                    sizes.compressed_bytes,
                );
                true
            }
            Err((stage, err)) => {
                let code = ExportErrorCode::classify(&err);
                error!(user = self.user, %stage, %code, error = %err, "Export failed");
                if let Err(e) = self.settings.record_export_error(code, now) {
                    warn!(error = %e, "Failed to persist export error");
                }
                self.logger.log_export_error(started.elapsed(), code);
                if self.flags.export_import_fast_follow {
                    let kind = match code {
                        ExportErrorCode::LostFileAccess => {
                            NotificationType::ExportUnsuccessfulLostFileAccess
                        }
                        ExportErrorCode::Unknown => NotificationType::ExportUnsuccessfulGenericError,
                    };
                    self.notifier.send_notification(kind, self.user);
                }
                false
            }
        }
    }

    fn export_to(
        &self,
        db_path: &Path,
        zip_path: &Path,
    ) -> Result<(String, ExportSizes), (ExportStage, TransferError)> {
        self.copy_live_database(db_path)
            .map_err(|e| (ExportStage::LocalCopy, e))?;

        let original_bytes = strip_log_tables(db_path).map_err(|e| (ExportStage::StripLogs, e))?;

        let compressed_bytes = compress(db_path, EXPORT_ARCHIVE_ENTRY_NAME, zip_path)
            .map_err(|e| (ExportStage::Compress, TransferError::from(e)))?;

        let uri = self
            .upload(zip_path)
            .map_err(|e| (ExportStage::Upload, e))?;

        Ok((
            uri,
            ExportSizes {
                original_bytes,
                compressed_bytes,
            },
        ))
    }

    fn copy_live_database(&self, db_path: &Path) -> TransferResult<()> {
        delete_database_files(db_path)?;
        self.storage.lock().backup_to(db_path)?;
        Ok(())
    }

    fn upload(&self, zip_path: &Path) -> TransferResult<String> {
        let uri = self
            .settings
            .load()?
            .destination_uri
            .ok_or(TransferError::NoDestination)?;

        let mut output = self.resolver.open_output(&uri)?;
        let mut input = File::open(zip_path)?;
        io::copy(&mut input, &mut output)?;
        output.flush()?;
        Ok(uri)
    }
}

/// Empty the log tables of the exported copy and fold it into a single file.
///
/// Returns the size of the stripped database.
fn strip_log_tables(db_path: &Path) -> TransferResult<u64> {
    {
        let mut copy = HealthStorage::open(db_path)?;
        copy.clear_log_tables()?;
        copy.checkpoint_to_single_file()?;
    }
    Ok(fs::metadata(db_path)?.len())
}

fn cleanup(db_path: &Path, zip_path: &Path) {
    if let Err(e) = delete_database_files(db_path) {
        warn!(path = %db_path.display(), error = %e, "Failed to delete local export database");
    }
    if let Err(e) = remove_if_exists(zip_path) {
        warn!(path = %zip_path.display(), error = %e, "Failed to delete local export archive");
    }
}

/// Remove leftover export files of `user`, if any.
///
/// # Errors
///
/// Returns an error if a file exists but cannot be deleted.
pub fn delete_local_export_files(data_root: &Path, user: u32) -> io::Result<()> {
    let context = DatabaseContext::new(data_root, EXPORT_DIR_NAME, user)?;
    delete_database_files(&context.file(LOCAL_EXPORT_DATABASE_FILE_NAME))?;
    remove_if_exists(&context.file(LOCAL_EXPORT_ZIP_FILE_NAME))
}
