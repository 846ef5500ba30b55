//! Export, import and merge of the health database.
//!
//! # Flow
//!
//! - **Export**: copy the live database, strip the log tables, zip it and
//!   stream the archive to the user's destination ([`ExportManager`])
//! - **Import**: unzip an archive into a staged database, check its schema
//!   version and merge it into the live database ([`ImportManager`],
//!   [`DatabaseMerger`])
//! - **Scheduling**: a recurring export job per user ([`ExportImportJobs`])
//!
//! Both directions report a boolean and persist a typed outcome in the
//! user's settings. Failures reach the user only as notifications.

mod compress;
mod context;
mod destination;
mod export;
pub mod file;
mod import;
mod jobs;
mod logger;
mod merge;
mod notify;
mod providers;
mod staged;
mod types;

pub use compress::{compress, decompress};
pub use context::{delete_database_files, remove_if_exists, user_dir, DatabaseContext};
pub use destination::{ContentResolver, FileContentResolver};
pub use export::{
    delete_local_export_files, ExportManager, ExportStage, EXPORT_ARCHIVE_ENTRY_NAME,
    EXPORT_DIR_NAME, LOCAL_EXPORT_DATABASE_FILE_NAME, LOCAL_EXPORT_ZIP_FILE_NAME,
};
pub use import::{ImportManager, IMPORT_DIR_NAME, STAGED_DATABASE_FILE_NAME};
pub use jobs::{
    export_job_id, export_job_timing, ExportImportJobs, FileJobScheduler, JobExtras, JobInfo,
    JobScheduler, FIRST_EXPORT_INTERVAL_MS, JOBS_FILE_NAME, JOB_NAMESPACE, MIN_JOB_ID,
    PERIODIC_EXPORT_JOB_NAME,
};
pub use logger::{size_in_kb, TransferKind, TransferLogger, TransferMetrics, METRICS_FILE_NAME};
pub use merge::{union_priority_order, DatabaseMerger, MERGE_PAGE_SIZE};
pub use notify::{
    Notification, NotificationAction, NotificationFactory, NotificationSender, NotificationType,
    TracingNotificationSender,
};
pub use providers::{
    is_supported_root, query_document_providers, DocumentProvider, DocumentsBackend,
    JsonDocumentsBackend, ProviderEntry, ProviderError, RootRow,
};
pub use staged::StagedDatabase;
pub use types::{
    CompressError, ExportErrorCode, ExportSizes, ImportOutcome, MergeError, MergeStats,
    TransferError, TransferResult,
};
