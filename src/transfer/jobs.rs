//! Periodic export job registration and execution.
//!
//! The engine does not run its own timer. It registers a recurring job with a
//! [`JobScheduler`] and the host calls [`ExportImportJobs::execute_periodic_export_job`]
//! when the job fires. [`FileJobScheduler`] keeps registrations in a JSON file
//! so the CLI can play the host's role.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SettingsStore;
use crate::error::Result;
use crate::transfer::context::user_dir;
use crate::transfer::export::{delete_local_export_files, ExportManager};
use crate::transfer::file::atomic_write;

pub const MIN_JOB_ID: i64 = 1_000_000;
pub const JOB_NAMESPACE: &str = "HEALTH_CONNECT_IMPORT_EXPORT_JOBS";
pub const PERIODIC_EXPORT_JOB_NAME: &str = "periodic_export_job";
pub const JOBS_FILE_NAME: &str = "jobs.json";

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Interval used while a newly chosen destination has not received an export.
pub const FIRST_EXPORT_INTERVAL_MS: i64 = HOUR_MS;
const MIN_FLEX_MS: i64 = 6 * HOUR_MS;
const WEEKLY_FLEX_MS: i64 = DAY_MS;

/// Data handed back to the job callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobExtras {
    pub user_id: u32,
    pub job_name: String,
    #[serde(default)]
    pub is_first_export: bool,
}

/// A registered recurring job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInfo {
    pub id: i64,
    pub namespace: String,
    pub interval_ms: i64,
    /// The job may run this long before the end of each interval.
    pub flex_ms: i64,
    pub requires_charging: bool,
    pub requires_device_idle: bool,
    pub extras: JobExtras,
    pub scheduled_at_ms: i64,
    #[serde(default)]
    pub last_run_ms: Option<i64>,
}

impl JobInfo {
    /// Start of the window in which the job may next run.
    #[must_use]
    pub const fn next_window_start_ms(&self) -> i64 {
        let base = match self.last_run_ms {
            Some(last) => last,
            None => self.scheduled_at_ms,
        };
        base + self.interval_ms - self.flex_ms
    }

    #[must_use]
    pub const fn is_due(&self, now_ms: i64) -> bool {
        now_ms >= self.next_window_start_ms()
    }
}

/// Host job scheduler.
pub trait JobScheduler: Send + Sync {
    /// Register `job`, replacing any job with the same id and namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the registration cannot be stored.
    fn schedule(&self, job: JobInfo) -> Result<()>;

    /// Cancel every job in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns an error if the registrations cannot be updated.
    fn cancel_all(&self, namespace: &str) -> Result<()>;

    /// Jobs currently registered in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns an error if the registrations cannot be read.
    fn pending(&self, namespace: &str) -> Result<Vec<JobInfo>>;
}

/// Job registrations persisted as a JSON array.
#[derive(Debug)]
pub struct FileJobScheduler {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileJobScheduler {
    /// Scheduler for `user` under `data_root`.
    #[must_use]
    pub fn for_user(data_root: &Path, user: u32) -> Self {
        Self::at(user_dir(data_root, user).join(JOBS_FILE_NAME))
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

    /// Mark job `id` as having run at `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns an error if the registrations cannot be updated.
    pub fn record_run(&self, namespace: &str, id: i64, now_ms: i64) -> Result<()> {
        self.modify(|jobs| {
            for job in jobs
                .iter_mut()
                .filter(|j| j.namespace == namespace && j.id == id)
            {
                job.last_run_ms = Some(now_ms);
            }
        })
    }

    fn read_unlocked(&self) -> Result<Vec<JobInfo>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn modify(&self, f: impl FnOnce(&mut Vec<JobInfo>)) -> Result<()> {
        let _guard = self.lock.lock();
        let mut jobs = self.read_unlocked()?;
        f(&mut jobs);
        atomic_write(&self.path, &serde_json::to_string_pretty(&jobs)?)?;
        Ok(())
    }
}

impl JobScheduler for FileJobScheduler {
    fn schedule(&self, job: JobInfo) -> Result<()> {
        self.modify(|jobs| {
            jobs.retain(|j| !(j.namespace == job.namespace && j.id == job.id));
            jobs.push(job);
        })
    }

    fn cancel_all(&self, namespace: &str) -> Result<()> {
        self.modify(|jobs| jobs.retain(|j| j.namespace != namespace))
    }

    fn pending(&self, namespace: &str) -> Result<Vec<JobInfo>> {
        let _guard = self.lock.lock();
        Ok(self
            .read_unlocked()?
            .into_iter()
            .filter(|j| j.namespace == namespace)
            .collect())
    }
}

/// Interval and flex, in milliseconds, for an export every `period_days`.
///
/// The flex window is 6 hours, or a day for weekly and longer periods, so a
/// run lands early in the cycle. It never exceeds the interval.
#[must_use]
pub fn export_job_timing(period_days: i32, is_first_export: bool) -> (i64, i64) {
    let interval_ms = if is_first_export {
        FIRST_EXPORT_INTERVAL_MS
    } else {
        i64::from(period_days) * DAY_MS
    };
    let flex_ms = if period_days >= 7 {
        WEEKLY_FLEX_MS
    } else {
        MIN_FLEX_MS
    };
    (interval_ms, flex_ms.min(interval_ms))
}

/// Job id for `user`.
#[must_use]
pub fn export_job_id(user: u32) -> i64 {
    MIN_JOB_ID + i64::from(user)
}

/// Registers and runs the periodic export job of one user.
pub struct ExportImportJobs {
    scheduler: Arc<dyn JobScheduler>,
    settings: Arc<SettingsStore>,
    data_root: PathBuf,
    user: u32,
}

impl ExportImportJobs {
    #[must_use]
    pub fn new(
        scheduler: Arc<dyn JobScheduler>,
        settings: Arc<SettingsStore>,
        data_root: PathBuf,
        user: u32,
    ) -> Self {
        Self {
            scheduler,
            settings,
            data_root,
            user,
        }
    }

    /// Register the export job from the current settings.
    ///
    /// A period of zero or less cancels every job in the namespace and
    /// removes leftover local export files. Returns the registered job.
    ///
    /// # Errors
    ///
    /// Returns an error if settings cannot be read or the scheduler fails.
    pub fn schedule_periodic_export_job(&self, now_ms: i64) -> Result<Option<JobInfo>> {
        let settings = self.settings.load()?;

        if settings.export_period_days <= 0 {
            info!(user = self.user, "Exports disabled, cancelling jobs");
            self.scheduler.cancel_all(JOB_NAMESPACE)?;
            if let Err(e) = delete_local_export_files(&self.data_root, self.user) {
                warn!(user = self.user, error = %e, "Failed to delete local export files");
            }
            return Ok(None);
        }

        let is_first_export = match (&settings.destination_uri, &settings.last_successful_export) {
            (Some(destination), Some(last)) => *destination != last.uri,
            _ => true,
        };
        let (interval_ms, flex_ms) = export_job_timing(settings.export_period_days, is_first_export);

        let job = JobInfo {
            id: export_job_id(self.user),
            namespace: JOB_NAMESPACE.to_string(),
            interval_ms,
            flex_ms,
            requires_charging: true,
            requires_device_idle: true,
            extras: JobExtras {
                user_id: self.user,
                job_name: PERIODIC_EXPORT_JOB_NAME.to_string(),
                is_first_export,
            },
            scheduled_at_ms: now_ms,
            last_run_ms: None,
        };
        self.scheduler.schedule(job.clone())?;
        info!(
            user = self.user,
            interval_ms,
            flex_ms,
            is_first_export,
            "Periodic export job scheduled"
        );
        Ok(Some(job))
    }

    /// Job callback: run one export.
    ///
    /// A disabled period counts as success without exporting. After the
    /// first export to a new destination succeeds the job is re-registered
    /// with the normal period.
    pub fn execute_periodic_export_job(
        &self,
        exporter: &ExportManager,
        extras: &JobExtras,
        now_ms: i64,
    ) -> bool {
        if extras.job_name != PERIODIC_EXPORT_JOB_NAME {
            warn!(job_name = %extras.job_name, "Unknown job, ignoring");
            return false;
        }

        match self.settings.load() {
            Ok(settings) if settings.export_period_days <= 0 => {
                debug!(user = self.user, "Exports disabled, skipping job");
                return true;
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to read settings, exporting anyway"),
        }

        let succeeded = exporter.run_export();
        if succeeded && extras.is_first_export {
            if let Err(e) = self.schedule_periodic_export_job(now_ms) {
                warn!(user = self.user, error = %e, "Failed to reschedule export job");
            }
        }
        succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureFlags;
    use crate::storage::HealthStorage;
    use crate::transfer::context::DatabaseContext;
    use crate::transfer::destination::FileContentResolver;
    use crate::transfer::export::{EXPORT_DIR_NAME, LOCAL_EXPORT_ZIP_FILE_NAME};
    use crate::transfer::logger::TransferLogger;
    use crate::transfer::notify::RecordingNotificationSender;
    use tempfile::TempDir;

    struct Harness {
        temp_dir: TempDir,
        scheduler: Arc<FileJobScheduler>,
        settings: Arc<SettingsStore>,
        jobs: ExportImportJobs,
        exporter: ExportManager,
    }

    fn harness() -> Harness {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        fs::create_dir_all(root.join("data")).unwrap();

        let storage = HealthStorage::open(&root.join("data/healthconnect.db"))
            .unwrap()
            .into_shared();
        let settings = Arc::new(SettingsStore::for_user(&root, 0));
        let scheduler = Arc::new(FileJobScheduler::for_user(&root, 0));
        let jobs = ExportImportJobs::new(scheduler.clone(), settings.clone(), root.clone(), 0);
        let exporter = ExportManager::new(
            storage,
            settings.clone(),
            Arc::new(FileContentResolver),
            Arc::new(RecordingNotificationSender::default()),
            TransferLogger::tracing_only(),
            FeatureFlags::default(),
            root,
            0,
        );

        Harness {
            temp_dir,
            scheduler,
            settings,
            jobs,
            exporter,
        }
    }

    fn destination(h: &Harness, name: &str) -> String {
        h.temp_dir.path().join(name).display().to_string()
    }

    #[test]
    fn test_timing() {
        assert_eq!(export_job_timing(1, false), (DAY_MS, 6 * HOUR_MS));
        assert_eq!(export_job_timing(7, false), (7 * DAY_MS, DAY_MS));
        assert_eq!(export_job_timing(30, false), (30 * DAY_MS, DAY_MS));
        assert_eq!(export_job_timing(7, true), (HOUR_MS, HOUR_MS));
    }

    #[test]
    fn test_is_due() {
        let job = JobInfo {
            id: 1,
            namespace: JOB_NAMESPACE.into(),
            interval_ms: DAY_MS,
            flex_ms: 6 * HOUR_MS,
            requires_charging: true,
            requires_device_idle: true,
            extras: JobExtras {
                user_id: 0,
                job_name: PERIODIC_EXPORT_JOB_NAME.into(),
                is_first_export: false,
            },
            scheduled_at_ms: 0,
            last_run_ms: None,
        };
        assert!(!job.is_due(17 * HOUR_MS));
        assert!(job.is_due(18 * HOUR_MS));

        let ran = JobInfo {
            last_run_ms: Some(DAY_MS),
            ..job
        };
        assert!(!ran.is_due(DAY_MS + HOUR_MS));
    }

    #[test]
    fn test_new_destination_schedules_first_export() {
        let h = harness();
        h.settings.set_export_period(7).unwrap();
        h.settings.set_destination_uri(&destination(&h, "a.zip")).unwrap();

        let job = h.jobs.schedule_periodic_export_job(0).unwrap().unwrap();
        assert!(job.extras.is_first_export);
        assert_eq!(job.interval_ms, FIRST_EXPORT_INTERVAL_MS);
        assert_eq!(job.id, MIN_JOB_ID);
        assert!(job.requires_charging && job.requires_device_idle);
        assert_eq!(h.scheduler.pending(JOB_NAMESPACE).unwrap(), vec![job]);
    }

    #[test]
    fn test_first_export_success_reschedules_normal_period() {
        let h = harness();
        h.settings.set_export_period(7).unwrap();
        h.settings.set_destination_uri(&destination(&h, "a.zip")).unwrap();
        let first = h.jobs.schedule_periodic_export_job(0).unwrap().unwrap();

        assert!(h.jobs.execute_periodic_export_job(&h.exporter, &first.extras, 10));

        let pending = h.scheduler.pending(JOB_NAMESPACE).unwrap();
        assert_eq!(pending.len(), 1);
        assert!(!pending[0].extras.is_first_export);
        assert_eq!(pending[0].interval_ms, 7 * DAY_MS);
        assert_eq!(pending[0].flex_ms, DAY_MS);
        assert_eq!(pending[0].scheduled_at_ms, 10);
    }

    #[test]
    fn test_failed_first_export_keeps_short_interval() {
        let h = harness();
        h.settings.set_export_period(7).unwrap();
        h.settings
            .set_destination_uri(&destination(&h, "missing/a.zip"))
            .unwrap();
        let first = h.jobs.schedule_periodic_export_job(0).unwrap().unwrap();

        assert!(!h.jobs.execute_periodic_export_job(&h.exporter, &first.extras, 10));

        let pending = h.scheduler.pending(JOB_NAMESPACE).unwrap();
        assert_eq!(pending, vec![first]);
    }

    #[test]
    fn test_disabled_period_cancels_and_cleans_up() {
        let h = harness();
        h.settings.set_export_period(7).unwrap();
        h.settings.set_destination_uri(&destination(&h, "a.zip")).unwrap();
        h.jobs.schedule_periodic_export_job(0).unwrap();

        let context = DatabaseContext::new(h.temp_dir.path(), EXPORT_DIR_NAME, 0).unwrap();
        let leftover = context.file(LOCAL_EXPORT_ZIP_FILE_NAME);
        fs::write(&leftover, b"stale").unwrap();

        h.settings.set_export_period(0).unwrap();
        assert!(h.jobs.schedule_periodic_export_job(5).unwrap().is_none());
        assert!(h.scheduler.pending(JOB_NAMESPACE).unwrap().is_empty());
        assert!(!leftover.exists());
    }

    #[test]
    fn test_disabled_period_skips_export_as_success() {
        let h = harness();
        let extras = JobExtras {
            user_id: 0,
            job_name: PERIODIC_EXPORT_JOB_NAME.into(),
            is_first_export: false,
        };
        assert!(h.jobs.execute_periodic_export_job(&h.exporter, &extras, 0));
        assert!(h.settings.load().unwrap().last_export_error.is_none());
    }

    #[test]
    fn test_record_run() {
        let h = harness();
        h.settings.set_export_period(1).unwrap();
        let job = h.jobs.schedule_periodic_export_job(0).unwrap().unwrap();

        h.scheduler.record_run(JOB_NAMESPACE, job.id, 42).unwrap();
        let pending = h.scheduler.pending(JOB_NAMESPACE).unwrap();
        assert_eq!(pending[0].last_run_ms, Some(42));
    }
}
