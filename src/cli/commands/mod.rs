//! Command implementations.

pub mod completions;
pub mod configure;
pub mod export;
pub mod import;
pub mod init;
pub mod jobs;
pub mod providers;
pub mod status;
pub mod version;

use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::Cli;
use crate::config::{
    resolve_data_dir, resolve_db_path, FeatureFlags, InstalledPackages, SettingsStore,
    INSTALLED_PACKAGES_FILE_NAME,
};
use crate::error::{Error, Result};
use crate::storage::{HealthStorage, SharedStorage};
use crate::transfer::{
    user_dir, ExportImportJobs, ExportManager, FileContentResolver, FileJobScheduler,
    ImportManager, TracingNotificationSender, TransferLogger, METRICS_FILE_NAME,
};

/// Resolved locations and wiring shared by the commands.
pub struct Runtime {
    pub data_root: PathBuf,
    pub db_path: PathBuf,
    pub user: u32,
    pub flags: FeatureFlags,
    pub settings: Arc<SettingsStore>,
}

impl Runtime {
    /// Resolve paths from the global arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if no data root can be determined.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let data_root = resolve_data_dir(cli.data_dir.as_deref())
            .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))?;
        let db_path = resolve_db_path(cli.db.as_deref(), &data_root);
        let settings = Arc::new(SettingsStore::for_user(&data_root, cli.user));

        Ok(Self {
            data_root,
            db_path,
            user: cli.user,
            flags: FeatureFlags::from_env(),
            settings,
        })
    }

    #[must_use]
    pub fn user_dir(&self) -> PathBuf {
        user_dir(&self.data_root, self.user)
    }

    /// Open the primary database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if the database does not exist yet.
    pub fn open_storage(&self) -> Result<SharedStorage> {
        if !self.db_path.exists() {
            return Err(Error::NotInitialized);
        }
        Ok(HealthStorage::open(&self.db_path)?.into_shared())
    }

    fn logger(&self) -> TransferLogger {
        TransferLogger::new(self.user_dir().join(METRICS_FILE_NAME))
    }

    #[must_use]
    pub fn export_manager(&self, storage: SharedStorage) -> ExportManager {
        ExportManager::new(
            storage,
            self.settings.clone(),
            Arc::new(FileContentResolver),
            Arc::new(TracingNotificationSender),
            self.logger(),
            self.flags,
            self.data_root.clone(),
            self.user,
        )
    }

    /// # Errors
    ///
    /// Returns an error if the installed-package list cannot be read.
    pub fn import_manager(&self, storage: SharedStorage) -> Result<ImportManager> {
        let inventory = InstalledPackages::load(&self.data_root.join(INSTALLED_PACKAGES_FILE_NAME))?;
        Ok(ImportManager::new(
            storage,
            Arc::new(inventory),
            self.settings.clone(),
            Arc::new(FileContentResolver),
            Arc::new(TracingNotificationSender),
            self.logger(),
            self.flags,
            self.data_root.clone(),
            self.user,
        ))
    }

    #[must_use]
    pub fn job_scheduler(&self) -> Arc<FileJobScheduler> {
        Arc::new(FileJobScheduler::for_user(&self.data_root, self.user))
    }

    #[must_use]
    pub fn jobs(&self, scheduler: Arc<FileJobScheduler>) -> ExportImportJobs {
        ExportImportJobs::new(scheduler, self.settings.clone(), self.data_root.clone(), self.user)
    }
}

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Render an epoch-millisecond timestamp for humans.
pub(crate) fn format_time(time_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(time_ms)
        .map_or_else(|| time_ms.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}
