//! One import cycle: unzip, version gate, merge, clean up.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::config::{FeatureFlags, SettingsStore};
use crate::storage::{read_database_version, PackageInventory, SharedStorage, DATABASE_VERSION};
use crate::transfer::compress::decompress;
use crate::transfer::context::{delete_database_files, DatabaseContext};
use crate::transfer::destination::ContentResolver;
use crate::transfer::export::EXPORT_ARCHIVE_ENTRY_NAME;
use crate::transfer::logger::TransferLogger;
use crate::transfer::merge::DatabaseMerger;
use crate::transfer::notify::{NotificationSender, NotificationType};
use crate::transfer::staged::StagedDatabase;
use crate::transfer::types::{CompressError, ImportOutcome, MergeStats, TransferError};

/// Directory, per user, holding the staged database of an import.
pub const IMPORT_DIR_NAME: &str = "import";
pub const STAGED_DATABASE_FILE_NAME: &str = "health_connect_import.db";

/// What happened to one import attempt.
#[derive(Debug)]
enum ImportAttempt {
    Merged(MergeStats),
    NotMergeable { version: Option<i32> },
    CopyFailed(TransferError),
    MergeFailed(String),
}

impl ImportAttempt {
    const fn outcome(&self) -> ImportOutcome {
        match self {
            Self::Merged(_) => ImportOutcome::Merged,
            Self::NotMergeable { .. } => ImportOutcome::NotMergeable,
            Self::CopyFailed(_) => ImportOutcome::CopyFailed,
            Self::MergeFailed(_) => ImportOutcome::MergeFailed,
        }
    }

    /// Notification for the attempt, if any. A newer schema is skipped
    /// silently.
    fn notification(&self) -> Option<NotificationType> {
        match self {
            Self::Merged(_) => Some(NotificationType::ImportComplete),
            Self::NotMergeable { .. } => None,
            Self::CopyFailed(TransferError::Compress(
                CompressError::EntryNotFound(_) | CompressError::Zip(_),
            )) => Some(NotificationType::ImportUnsuccessfulInvalidFile),
            Self::CopyFailed(_) | Self::MergeFailed(_) => {
                Some(NotificationType::ImportUnsuccessfulGenericError)
            }
        }
    }
}

/// Runs import cycles for one user.
pub struct ImportManager {
    merger: DatabaseMerger,
    settings: Arc<SettingsStore>,
    resolver: Arc<dyn ContentResolver>,
    notifier: Arc<dyn NotificationSender>,
    logger: TransferLogger,
    flags: FeatureFlags,
    data_root: PathBuf,
    user: u32,
    lock: Mutex<()>,
}

impl ImportManager {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        storage: SharedStorage,
        inventory: Arc<dyn PackageInventory>,
        settings: Arc<SettingsStore>,
        resolver: Arc<dyn ContentResolver>,
        notifier: Arc<dyn NotificationSender>,
        logger: TransferLogger,
        flags: FeatureFlags,
        data_root: PathBuf,
        user: u32,
    ) -> Self {
        Self {
            merger: DatabaseMerger::new(storage, inventory, flags.merge_priority_lists),
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

    /// Import the archive at `uri` and merge it into the primary database.
    ///
    /// Returns whether data was merged. The outcome is persisted in settings.
    /// No staged file is left on disk afterwards. At most one import runs at
    /// a time.
    pub fn run_import(&self, uri: &str) -> bool {
        let _guard = self.lock.lock();
        let started = Instant::now();
        info!(user = self.user, uri, "Starting import");

        if self.flags.export_import_fast_follow {
            self.notifier
                .send_notification(NotificationType::ImportInProgress, self.user);
        }

        let context = DatabaseContext::new(&self.data_root, IMPORT_DIR_NAME, self.user);
        let (attempt, staged_bytes) = match context {
            Ok(context) => {
                let staged_path = context.file(STAGED_DATABASE_FILE_NAME);
                let attempt = self.import_from(uri, &staged_path);
                let staged_bytes = fs::metadata(&staged_path).ok().map(|m| m.len());
                if let Err(e) = delete_database_files(&staged_path) {
                    warn!(
                        path = %staged_path.display(),
                        error = %e,
                        "Failed to delete staged database"
                    );
                }
                (attempt, staged_bytes)
            }
            Err(e) => (ImportAttempt::CopyFailed(TransferError::Io(e)), None),
        };

        let outcome = attempt.outcome();
        match &attempt {
            ImportAttempt::Merged(stats) => {
                info!(
                    user = self.user,
                    records = stats.total_records(),
                    apps_created = stats.apps_created,
                    "Import merged"
                );
            }
            ImportAttempt::NotMergeable { version } => {
                info!(
                    user = self.user,
                    version = ?version,
                    supported = DATABASE_VERSION,
                    "Staged database not mergeable, skipping import"
                );
            }
            ImportAttempt::CopyFailed(e) => {
                error!(user = self.user, error = %e, "Failed to copy import archive");
            }
            ImportAttempt::MergeFailed(e) => {
                error!(user = self.user, error = %e, "Merge failed");
            }
        }

        let now = chrono::Utc::now().timestamp_millis();
        if let Err(e) = self.settings.record_import_outcome(outcome, now) {
            warn!(error = %e, "Failed to persist import outcome");
        }
        self.logger.log_import(started.elapsed(), outcome, staged_bytes);

        if self.flags.export_import_fast_follow {
            if let Some(kind) = attempt.notification() {
                self.notifier.send_notification(kind, self.user);
            }
        }

        outcome == ImportOutcome::Merged
    }

    fn import_from(&self, uri: &str, staged_path: &Path) -> ImportAttempt {
        if let Err(e) = self.copy_archive(uri, staged_path) {
            return ImportAttempt::CopyFailed(e);
        }

        match read_database_version(staged_path) {
            Some(version) if version <= DATABASE_VERSION => {}
            version => return ImportAttempt::NotMergeable { version },
        }

        let staged = match StagedDatabase::open(staged_path) {
            Ok(staged) => staged,
            Err(e) => return ImportAttempt::MergeFailed(e.to_string()),
        };
        match self.merger.merge(&staged) {
            Ok(stats) => ImportAttempt::Merged(stats),
            Err(e) => ImportAttempt::MergeFailed(e.to_string()),
        }
    }

    fn copy_archive(&self, uri: &str, staged_path: &Path) -> Result<(), TransferError> {
        delete_database_files(staged_path)?;
        let mut input = self.resolver.open_input(uri)?;
        decompress(&mut input, EXPORT_ARCHIVE_ENTRY_NAME, staged_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstalledPackages;
    use crate::storage::records::{InsertMode, RecordType};
    use crate::storage::schema::set_user_version;
    use crate::storage::sqlite::tests::steps;
    use crate::storage::HealthStorage;
    use crate::transfer::compress::compress;
    use crate::transfer::destination::FileContentResolver;
    use crate::transfer::notify::RecordingNotificationSender;
    use tempfile::TempDir;

    struct Harness {
        temp_dir: TempDir,
        storage: SharedStorage,
        settings: Arc<SettingsStore>,
        notifier: Arc<RecordingNotificationSender>,
        manager: ImportManager,
    }

    fn harness() -> Harness {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        fs::create_dir_all(root.join("data")).unwrap();

        let storage = HealthStorage::open(&root.join("data/healthconnect.db"))
            .unwrap()
            .into_shared();
        let settings = Arc::new(SettingsStore::for_user(&root, 0));
        let notifier = Arc::new(RecordingNotificationSender::default());
        let manager = ImportManager::new(
            storage.clone(),
            Arc::new(InstalledPackages::default()),
            settings.clone(),
            Arc::new(FileContentResolver),
            notifier.clone(),
            TransferLogger::tracing_only(),
            FeatureFlags::default(),
            root,
            0,
        );

        Harness {
            temp_dir,
            storage,
            settings,
            notifier,
            manager,
        }
    }

    /// Build an export archive holding `count` step records.
    fn archive(h: &Harness, name: &str, count: i64, version: Option<i32>) -> PathBuf {
        let db = h.temp_dir.path().join(format!("{name}.db"));
        {
            let mut source = HealthStorage::open(&db).unwrap();
            let app = source.insert_app_info("com.example.fit", Some("Fit"), None).unwrap();
            let records: Vec<_> = (0..count).map(|i| steps(&format!("{name}-{i}"), app, i)).collect();
            source.insert_records(&records, &InsertMode::Restore).unwrap();
            source.checkpoint_to_single_file().unwrap();
            if let Some(version) = version {
                set_user_version(source.conn(), version).unwrap();
            }
        }
        let zip = h.temp_dir.path().join(format!("{name}.zip"));
        compress(&db, EXPORT_ARCHIVE_ENTRY_NAME, &zip).unwrap();
        zip
    }

    fn staged_dir(h: &Harness) -> PathBuf {
        h.temp_dir.path().join("root/users/0").join(IMPORT_DIR_NAME)
    }

    fn assert_no_staged_files(h: &Harness) {
        let count = fs::read_dir(staged_dir(h)).map(Iterator::count).unwrap_or(0);
        assert_eq!(count, 0, "staged files left behind");
    }

    #[test]
    fn test_import_merges_archive() {
        let h = harness();
        let zip = archive(&h, "backup", 4, None);

        assert!(h.manager.run_import(&zip.display().to_string()));

        assert_eq!(h.storage.lock().count_records(RecordType::Steps).unwrap(), 4);
        assert_eq!(
            h.settings.load().unwrap().last_import.map(|i| i.outcome),
            Some(ImportOutcome::Merged)
        );
        assert_eq!(
            h.notifier.sent(),
            vec![NotificationType::ImportInProgress, NotificationType::ImportComplete]
        );
        assert_no_staged_files(&h);
    }

    #[test]
    fn test_newer_schema_leaves_primary_untouched() {
        let h = harness();
        let zip = archive(&h, "future", 4, Some(DATABASE_VERSION + 1));

        assert!(!h.manager.run_import(&zip.display().to_string()));

        let primary = h.storage.lock();
        for record_type in RecordType::ALL {
            assert_eq!(primary.count_records(record_type).unwrap(), 0);
        }
        assert!(primary.list_app_infos().unwrap().is_empty());
        drop(primary);

        assert_eq!(
            h.settings.load().unwrap().last_import.map(|i| i.outcome),
            Some(ImportOutcome::NotMergeable)
        );
        assert_eq!(h.notifier.sent(), vec![NotificationType::ImportInProgress]);
        assert_no_staged_files(&h);
    }

    #[test]
    fn test_archive_without_entry_is_invalid_file() {
        let h = harness();
        let other = h.temp_dir.path().join("notes.txt");
        fs::write(&other, b"not a database").unwrap();
        let zip = h.temp_dir.path().join("wrong.zip");
        compress(&other, "notes.txt", &zip).unwrap();

        assert!(!h.manager.run_import(&zip.display().to_string()));

        assert_eq!(
            h.settings.load().unwrap().last_import.map(|i| i.outcome),
            Some(ImportOutcome::CopyFailed)
        );
        assert_eq!(
            h.notifier.sent(),
            vec![
                NotificationType::ImportInProgress,
                NotificationType::ImportUnsuccessfulInvalidFile
            ]
        );
        assert_no_staged_files(&h);
    }

    #[test]
    fn test_missing_archive_is_generic_error() {
        let h = harness();
        let missing = h.temp_dir.path().join("missing.zip");

        assert!(!h.manager.run_import(&missing.display().to_string()));
        assert_eq!(
            h.notifier.sent().last(),
            Some(&NotificationType::ImportUnsuccessfulGenericError)
        );
    }
}
