//! Merge of a staged database into the primary database.
//!
//! # Algorithm
//!
//! 1. **App identities**: map staged app row ids to package names, and give
//!    packages that are neither installed nor known to the primary a row of
//!    their own (label only, icons are never read from a staged database).
//! 2. **Records**: copy every record type page by page, keeping UUIDs and
//!    translating app ids through package names. Ordered groups are fully
//!    inserted before any of their staged rows are deleted; every other type
//!    is inserted then deleted on its own.
//! 3. **Usage**: rebuild the primary's app/record-type usage index.
//! 4. **Priorities** (optional): append staged category priority entries the
//!    primary does not have yet. Installed apps without a primary row get one
//!    labelled from the package inventory.
//!
//! There is no transaction around the whole merge. Each page insert commits
//! on its own, so an aborted merge leaves earlier pages in place and the
//! staged rows of unfinished types untouched. Merges are serialized across
//! every merger in the process.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::storage::{
    HealthStorage, InsertMode, PackageInventory, PageCursor, PageToken, Record, RecordData,
    RecordType, SharedStorage,
};
use crate::transfer::staged::StagedDatabase;
use crate::transfer::types::{MergeError, MergeStats};

/// Records read from the staged database per page.
pub const MERGE_PAGE_SIZE: u32 = 5000;

/// Record types that must move in this order, with deletion deferred until
/// the whole group is in. Exercise sessions reference planned sessions.
const ORDERED_GROUPS: &[&[RecordType]] = &[&[
    RecordType::PlannedExerciseSession,
    RecordType::ExerciseSession,
]];

/// Held for the whole of a merge.
static MERGE_LOCK: Mutex<()> = Mutex::new(());

/// Staged app row id to package name.
type StagedPackages = HashMap<i64, String>;

/// Merges staged databases into the primary database.
pub struct DatabaseMerger {
    storage: SharedStorage,
    inventory: Arc<dyn PackageInventory>,
    merge_priority_lists: bool,
    page_size: u32,
}

impl DatabaseMerger {
    #[must_use]
    pub fn new(
        storage: SharedStorage,
        inventory: Arc<dyn PackageInventory>,
        merge_priority_lists: bool,
    ) -> Self {
        Self {
            storage,
            inventory,
            merge_priority_lists,
            page_size: MERGE_PAGE_SIZE,
        }
    }

    /// Override the page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Merge everything in `staged` into the primary database.
    ///
    /// One merge runs at a time per process. The staged record tables are
    /// empty afterwards.
    ///
    /// # Errors
    ///
    /// Any read or write failure aborts the merge. Record types completed
    /// before the failure stay committed.
    pub fn merge(&self, staged: &StagedDatabase) -> Result<MergeStats, MergeError> {
        let _guard = MERGE_LOCK.lock();
        info!(staged = %staged.path().display(), "Starting merge");

        let mut stats = MergeStats::default();

        let packages = self.merge_app_info(staged, &mut stats)?;
        self.merge_records(staged, &packages, &mut stats)?;

        self.storage.lock().resync_app_record_type_usage()?;

        if self.merge_priority_lists {
            self.merge_priorities(staged, &packages, &mut stats)?;
        } else {
            debug!("Priority list merge disabled");
        }

        info!(
            apps_created = stats.apps_created,
            records = stats.total_records(),
            categories = stats.categories_merged,
            "Merge complete"
        );
        Ok(stats)
    }

    fn merge_app_info(
        &self,
        staged: &StagedDatabase,
        stats: &mut MergeStats,
    ) -> Result<StagedPackages, MergeError> {
        let staged_apps = staged.read(HealthStorage::list_app_infos)?;
        let mut packages = StagedPackages::with_capacity(staged_apps.len());

        let mut primary = self.storage.lock();
        for app in staged_apps {
            let installed = self.inventory.is_installed(&app.package_name);
            if !installed && primary.get_app_info_id(&app.package_name)?.is_none() {
                primary.insert_app_info(&app.package_name, app.application_name.as_deref(), None)?;
                stats.apps_created += 1;
                debug!(package = %app.package_name, "Created app info from staged database");
            }
            packages.insert(app.row_id, app.package_name);
        }

        Ok(packages)
    }

    fn merge_records(
        &self,
        staged: &StagedDatabase,
        packages: &StagedPackages,
        stats: &mut MergeStats,
    ) -> Result<(), MergeError> {
        let mut app_ids = HashMap::new();
        let mut remaining: Vec<RecordType> = RecordType::ALL.to_vec();

        for group in ORDERED_GROUPS {
            for &record_type in *group {
                self.migrate_record_type(staged, record_type, packages, &mut app_ids, stats)?;
            }
            for &record_type in *group {
                stats.staged_rows_deleted +=
                    staged.write(|s| s.delete_all_records(record_type))?;
            }
            remaining.retain(|t| !group.contains(t));
        }

        for record_type in remaining {
            self.migrate_record_type(staged, record_type, packages, &mut app_ids, stats)?;
            stats.staged_rows_deleted += staged.write(|s| s.delete_all_records(record_type))?;
        }

        Ok(())
    }

    fn migrate_record_type(
        &self,
        staged: &StagedDatabase,
        record_type: RecordType,
        packages: &StagedPackages,
        app_ids: &mut HashMap<i64, i64>,
        stats: &mut MergeStats,
    ) -> Result<(), MergeError> {
        let mut token = PageToken::default();
        let mut migrated = 0;

        loop {
            let page = staged.read(|s| s.read_records_page(record_type, token, self.page_size))?;
            if page.records.is_empty() {
                break;
            }

            let mut primary = self.storage.lock();
            let mut records = Vec::with_capacity(page.records.len());
            for record in page.records {
                let app_info_id =
                    self.primary_app_id(&mut primary, record.app_info_id, record_type, packages, app_ids)?;
                records.push(prepare_for_primary(record, app_info_id));
            }
            migrated += primary.insert_records(&records, &InsertMode::Restore)?.len();
            drop(primary);

            match page.next {
                PageCursor::More(next) => token = next,
                PageCursor::End => break,
            }
        }

        debug!(%record_type, migrated, "Record type migrated");
        *stats.records_migrated.entry(record_type).or_default() += migrated;
        Ok(())
    }

    /// Translate a staged app id to the primary's id for the same package.
    fn primary_app_id(
        &self,
        primary: &mut HealthStorage,
        staged_id: i64,
        record_type: RecordType,
        packages: &StagedPackages,
        app_ids: &mut HashMap<i64, i64>,
    ) -> Result<i64, MergeError> {
        if let Some(&id) = app_ids.get(&staged_id) {
            return Ok(id);
        }
        let package = packages.get(&staged_id).ok_or(MergeError::UnknownAppInfo {
            record_type,
            app_info_id: staged_id,
        })?;
        let id = primary.get_or_insert_app_info_id(package, self.inventory.as_ref())?;
        app_ids.insert(staged_id, id);
        Ok(id)
    }

    fn merge_priorities(
        &self,
        staged: &StagedDatabase,
        packages: &StagedPackages,
        stats: &mut MergeStats,
    ) -> Result<(), MergeError> {
        let staged_orders = staged.read(HealthStorage::list_priority_orders)?;

        let mut primary = self.storage.lock();
        for (category, staged_ids) in staged_orders {
            if staged_ids.is_empty() {
                continue;
            }

            let mut incoming = Vec::with_capacity(staged_ids.len());
            for staged_id in staged_ids {
                let Some(package) = packages.get(&staged_id) else {
                    warn!(?category, staged_id, "Priority entry has no staged app info");
                    continue;
                };
                match primary.get_or_insert_app_info_id(package, self.inventory.as_ref()) {
                    Ok(id) => incoming.push(id),
                    Err(Error::AppInfoNotFound { .. }) => {
                        debug!(?category, package = %package, "Priority entry is neither installed nor known");
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            let existing = primary.get_priority_order(category)?;
            let merged = union_priority_order(&existing, &incoming);
            if merged != existing {
                primary.set_priority_order(category, &merged)?;
                stats.categories_merged += 1;
            }
        }

        Ok(())
    }
}

/// Rewrite a staged record for insertion into the primary database.
fn prepare_for_primary(mut record: Record, app_info_id: i64) -> Record {
    record.app_info_id = app_info_id;
    // Regenerated when the completing exercise session is inserted.
    if let RecordData::PlannedExerciseSession {
        completed_exercise_session_id,
        ..
    } = &mut record.data
    {
        *completed_exercise_session_id = None;
    }
    record
}

/// Existing order first, then unseen incoming entries, without duplicates.
#[must_use]
pub fn union_priority_order(existing: &[i64], incoming: &[i64]) -> Vec<i64> {
    let mut merged = Vec::with_capacity(existing.len() + incoming.len());
    for &id in existing.iter().chain(incoming) {
        if !merged.contains(&id) {
            merged.push(id);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstalledPackages;
    use crate::storage::sqlite::tests::steps;
    use crate::storage::{HealthDataCategory, HeartRateSample};
    use std::time::Duration;

    struct Fixture {
        primary: SharedStorage,
        staged: StagedDatabase,
    }

    fn fixture() -> Fixture {
        Fixture {
            primary: HealthStorage::open_memory().unwrap().into_shared(),
            staged: StagedDatabase::from_storage(HealthStorage::open_memory().unwrap()),
        }
    }

    fn merger(primary: &SharedStorage, installed: &[(&str, &str)]) -> DatabaseMerger {
        let inventory = InstalledPackages::from_pairs(installed.iter().copied());
        DatabaseMerger::new(primary.clone(), Arc::new(inventory), true)
    }

    fn planned(uuid: &str, app: i64, completed: Option<&str>) -> Record {
        Record {
            data: RecordData::PlannedExerciseSession {
                title: Some("Tempo".into()),
                notes: None,
                exercise_type: 56,
                completed_exercise_session_id: completed.map(str::to_string),
            },
            ..steps(uuid, app, 0)
        }
    }

    fn session(uuid: &str, app: i64, planned: Option<&str>) -> Record {
        Record {
            data: RecordData::ExerciseSession {
                title: Some("Tempo".into()),
                notes: Some("felt good".into()),
                exercise_type: 56,
                planned_exercise_session_id: planned.map(str::to_string),
            },
            ..steps(uuid, app, 0)
        }
    }

    #[test]
    fn test_records_keep_uuid_and_payload() {
        let f = fixture();
        let app = f
            .staged
            .write(|s| s.insert_app_info("com.example.fit", Some("Fit"), None))
            .unwrap();
        let heart_rate = Record {
            data: RecordData::HeartRate {
                samples: vec![HeartRateSample { epoch_millis: 1_100, beats_per_minute: 64 }],
            },
            ..steps("hr-1", app, 0)
        };
        f.staged
            .write(|s| {
                s.insert_records(&[steps("steps-1", app, 42), heart_rate.clone()], &InsertMode::Restore)
            })
            .unwrap();

        let stats = merger(&f.primary, &[]).merge(&f.staged).unwrap();

        let primary = f.primary.lock();
        let merged = primary.get_record(RecordType::Steps, "steps-1").unwrap().unwrap();
        assert_eq!(merged.data, RecordData::Steps { count: 42 });
        let primary_app = primary.get_app_info_id("com.example.fit").unwrap().unwrap();
        assert_eq!(merged.app_info_id, primary_app);
        let merged_hr = primary.get_record(RecordType::HeartRate, "hr-1").unwrap().unwrap();
        assert_eq!(merged_hr.data, heart_rate.data);

        assert_eq!(stats.total_records(), 2);
        assert_eq!(stats.apps_created, 1);
        assert_eq!(f.staged.read(|s| s.count_records(RecordType::Steps)).unwrap(), 0);
    }

    #[test]
    fn test_existing_uuid_is_overwritten_not_duplicated() {
        let f = fixture();
        let primary_app = f
            .primary
            .lock()
            .insert_app_info("com.example.fit", None, None)
            .unwrap();
        f.primary
            .lock()
            .insert_records(&[steps("steps-1", primary_app, 1)], &InsertMode::Restore)
            .unwrap();

        let staged_app = f
            .staged
            .write(|s| s.insert_app_info("com.example.fit", None, None))
            .unwrap();
        f.staged
            .write(|s| s.insert_records(&[steps("steps-1", staged_app, 9)], &InsertMode::Restore))
            .unwrap();

        merger(&f.primary, &[]).merge(&f.staged).unwrap();

        let primary = f.primary.lock();
        assert_eq!(primary.count_records(RecordType::Steps).unwrap(), 1);
        let record = primary.get_record(RecordType::Steps, "steps-1").unwrap().unwrap();
        assert_eq!(record.data, RecordData::Steps { count: 9 });
    }

    #[test]
    fn test_app_ids_are_translated_through_package_names() {
        let f = fixture();
        {
            let mut primary = f.primary.lock();
            primary.insert_app_info("com.example.a", None, None).unwrap();
            primary.insert_app_info("com.example.b", None, None).unwrap();
        }
        // Staged numbering is the reverse of the primary's
        let (staged_b, staged_a) = f
            .staged
            .write(|s| {
                Ok::<_, crate::error::Error>((
                    s.insert_app_info("com.example.b", None, None)?,
                    s.insert_app_info("com.example.a", None, None)?,
                ))
            })
            .unwrap();
        f.staged
            .write(|s| {
                s.insert_records(
                    &[steps("from-a", staged_a, 1), steps("from-b", staged_b, 2)],
                    &InsertMode::Restore,
                )
            })
            .unwrap();

        merger(&f.primary, &[]).merge(&f.staged).unwrap();

        let primary = f.primary.lock();
        let a = primary.get_app_info_id("com.example.a").unwrap().unwrap();
        let from_a = primary.get_record(RecordType::Steps, "from-a").unwrap().unwrap();
        assert_eq!(from_a.app_info_id, a);
        assert_eq!(primary.list_app_infos().unwrap().len(), 2);
    }

    #[test]
    fn test_installed_apps_are_not_created_from_staged_labels() {
        let f = fixture();
        f.staged
            .write(|s| s.insert_app_info("com.example.fit", Some("Stale Label"), Some(&[1u8, 2, 3][..])))
            .unwrap();

        let stats = merger(&f.primary, &[("com.example.fit", "Fit")])
            .merge(&f.staged)
            .unwrap();

        assert_eq!(stats.apps_created, 0);
        assert!(f.primary.lock().list_app_infos().unwrap().is_empty());
    }

    #[test]
    fn test_staged_icons_are_not_imported() {
        let f = fixture();
        f.staged
            .write(|s| s.insert_app_info("com.example.gone", Some("Gone"), Some(&[1u8, 2, 3][..])))
            .unwrap();

        merger(&f.primary, &[]).merge(&f.staged).unwrap();

        let primary = f.primary.lock();
        let apps = primary.list_app_infos().unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].application_name.as_deref(), Some("Gone"));
        assert_eq!(primary.get_app_icon("com.example.gone").unwrap(), None);
    }

    #[test]
    fn test_repeated_merge_creates_one_app_row() {
        let f = fixture();
        let app = f
            .staged
            .write(|s| s.insert_app_info("com.example.gone", Some("Gone"), None))
            .unwrap();
        f.staged
            .write(|s| s.insert_records(&[steps("s1", app, 1)], &InsertMode::Restore))
            .unwrap();

        let merger = merger(&f.primary, &[]);
        merger.merge(&f.staged).unwrap();
        f.staged
            .write(|s| s.insert_records(&[steps("s2", app, 2)], &InsertMode::Restore))
            .unwrap();
        let second = merger.merge(&f.staged).unwrap();

        assert_eq!(second.apps_created, 0);
        let primary = f.primary.lock();
        assert_eq!(primary.list_app_infos().unwrap().len(), 1);
        assert_eq!(primary.count_records(RecordType::Steps).unwrap(), 2);
    }

    #[test]
    fn test_exercise_session_keeps_planned_reference() {
        let f = fixture();
        let app = f
            .staged
            .write(|s| s.insert_app_info("com.example.fit", None, None))
            .unwrap();
        f.staged
            .write(|s| {
                s.insert_records(
                    &[
                        planned("plan-1", app, None),
                        session("session-1", app, Some("plan-1")),
                        session("session-2", app, None),
                    ],
                    &InsertMode::Restore,
                )
            })
            .unwrap();

        merger(&f.primary, &[]).merge(&f.staged).unwrap();

        let primary = f.primary.lock();
        let linked = primary
            .get_record(RecordType::ExerciseSession, "session-1")
            .unwrap()
            .unwrap();
        assert!(matches!(
            linked.data,
            RecordData::ExerciseSession { planned_exercise_session_id: Some(ref p), .. } if p == "plan-1"
        ));
        let unlinked = primary
            .get_record(RecordType::ExerciseSession, "session-2")
            .unwrap()
            .unwrap();
        assert!(matches!(
            unlinked.data,
            RecordData::ExerciseSession { planned_exercise_session_id: None, .. }
        ));
        // Back-reference regenerated on the primary side
        let plan = primary
            .get_record(RecordType::PlannedExerciseSession, "plan-1")
            .unwrap()
            .unwrap();
        assert!(matches!(
            plan.data,
            RecordData::PlannedExerciseSession { completed_exercise_session_id: Some(ref s), .. } if s == "session-1"
        ));
    }

    #[test]
    fn test_paging_moves_every_record() {
        let f = fixture();
        let app = f
            .staged
            .write(|s| s.insert_app_info("com.example.fit", None, None))
            .unwrap();
        let records: Vec<Record> = (0..7).map(|i| steps(&format!("s{i}"), app, i)).collect();
        f.staged
            .write(|s| s.insert_records(&records, &InsertMode::Restore))
            .unwrap();

        let stats = merger(&f.primary, &[])
            .with_page_size(3)
            .merge(&f.staged)
            .unwrap();

        assert_eq!(stats.records_migrated.get(&RecordType::Steps), Some(&7));
        assert_eq!(f.primary.lock().count_records(RecordType::Steps).unwrap(), 7);
    }

    #[test]
    fn test_usage_is_resynced() {
        let f = fixture();
        let app = f
            .staged
            .write(|s| s.insert_app_info("com.example.fit", None, None))
            .unwrap();
        f.staged
            .write(|s| s.insert_records(&[steps("s1", app, 1)], &InsertMode::Restore))
            .unwrap();

        merger(&f.primary, &[]).merge(&f.staged).unwrap();

        let primary = f.primary.lock();
        let id = primary.get_app_info_id("com.example.fit").unwrap().unwrap();
        assert_eq!(primary.record_types_used_by(id).unwrap(), vec![RecordType::Steps]);
    }

    #[test]
    fn test_union_priority_order() {
        assert_eq!(union_priority_order(&[1, 2], &[2, 3]), vec![1, 2, 3]);
        assert_eq!(union_priority_order(&[], &[5, 5, 4]), vec![5, 4]);
        assert_eq!(union_priority_order(&[1], &[]), vec![1]);
    }

    #[test]
    fn test_priority_lists_are_unioned() {
        let f = fixture();
        let (a, b) = {
            let mut primary = f.primary.lock();
            let a = primary.insert_app_info("com.example.a", None, None).unwrap();
            let b = primary.insert_app_info("com.example.b", None, None).unwrap();
            primary
                .set_priority_order(HealthDataCategory::Activity, &[a, b])
                .unwrap();
            (a, b)
        };
        f.staged
            .write(|s| -> crate::error::Result<()> {
                let staged_c = s.insert_app_info("com.example.c", None, None)?;
                let staged_b = s.insert_app_info("com.example.b", None, None)?;
                s.set_priority_order(HealthDataCategory::Activity, &[staged_b, staged_c])?;
                s.set_priority_order(HealthDataCategory::Sleep, &[])?;
                Ok(())
            })
            .unwrap();

        let stats = merger(&f.primary, &[]).merge(&f.staged).unwrap();

        let primary = f.primary.lock();
        let c = primary.get_app_info_id("com.example.c").unwrap().unwrap();
        assert_eq!(
            primary.get_priority_order(HealthDataCategory::Activity).unwrap(),
            vec![a, b, c]
        );
        assert!(primary
            .get_priority_order(HealthDataCategory::Sleep)
            .unwrap()
            .is_empty());
        assert_eq!(stats.categories_merged, 1);
    }

    #[test]
    fn test_priority_merge_can_be_disabled() {
        let f = fixture();
        f.staged
            .write(|s| -> crate::error::Result<()> {
                let staged_a = s.insert_app_info("com.example.a", None, None)?;
                s.set_priority_order(HealthDataCategory::Vitals, &[staged_a])?;
                Ok(())
            })
            .unwrap();

        let inventory = Arc::new(InstalledPackages::default());
        let stats = DatabaseMerger::new(f.primary.clone(), inventory, false)
            .merge(&f.staged)
            .unwrap();

        assert_eq!(stats.categories_merged, 0);
        assert!(f
            .primary
            .lock()
            .get_priority_order(HealthDataCategory::Vitals)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_record_with_unknown_app_aborts() {
        let f = fixture();
        let app = f
            .staged
            .write(|s| s.insert_app_info("com.example.fit", None, None))
            .unwrap();
        f.staged
            .write(|s| s.insert_records(&[steps("s1", app, 1)], &InsertMode::Restore))
            .unwrap();
        // Orphan the record by dropping its app row with foreign keys off
        f.staged.write(|s| {
            s.conn().execute_batch(
                "PRAGMA foreign_keys = OFF; DELETE FROM application_info_table; PRAGMA foreign_keys = ON;",
            )
        })
        .unwrap();

        let result = merger(&f.primary, &[]).merge(&f.staged);
        assert!(matches!(
            result,
            Err(MergeError::UnknownAppInfo { record_type: RecordType::Steps, .. })
        ));
        assert_eq!(f.staged.read(|s| s.count_records(RecordType::Steps)).unwrap(), 1);
    }

    #[test]
    fn test_failed_ordered_group_keeps_staged_rows() {
        let f = fixture();
        let (fit, gone) = f
            .staged
            .write(|s| {
                Ok::<_, crate::error::Error>((
                    s.insert_app_info("com.example.fit", None, None)?,
                    s.insert_app_info("com.example.gone", None, None)?,
                ))
            })
            .unwrap();
        f.staged
            .write(|s| {
                s.insert_records(
                    &[planned("plan-1", fit, None), session("session-1", gone, None)],
                    &InsertMode::Restore,
                )
            })
            .unwrap();
        // Orphan the exercise session only
        f.staged
            .write(|s| {
                s.conn().execute_batch(&format!(
                    "PRAGMA foreign_keys = OFF; DELETE FROM application_info_table WHERE row_id = {gone}; PRAGMA foreign_keys = ON;"
                ))
            })
            .unwrap();

        let result = merger(&f.primary, &[]).merge(&f.staged);

        assert!(matches!(
            result,
            Err(MergeError::UnknownAppInfo { record_type: RecordType::ExerciseSession, .. })
        ));
        let staged_planned = f
            .staged
            .read(|s| s.count_records(RecordType::PlannedExerciseSession))
            .unwrap();
        assert_eq!(staged_planned, 1);
        assert_eq!(
            f.staged.read(|s| s.count_records(RecordType::ExerciseSession)).unwrap(),
            1
        );
        let primary = f.primary.lock();
        assert!(primary
            .get_record(RecordType::PlannedExerciseSession, "plan-1")
            .unwrap()
            .is_some());
        assert_eq!(primary.count_records(RecordType::ExerciseSession).unwrap(), 0);
    }

    #[test]
    fn test_installed_app_in_staged_priority_list_is_kept() {
        let f = fixture();
        let a = {
            let mut primary = f.primary.lock();
            let a = primary.insert_app_info("com.example.a", None, None).unwrap();
            primary
                .set_priority_order(HealthDataCategory::Activity, &[a])
                .unwrap();
            a
        };
        // b is installed but wrote no records
        f.staged
            .write(|s| -> crate::error::Result<()> {
                let staged_b = s.insert_app_info("com.example.b", Some("Stale"), None)?;
                let staged_gone = s.insert_app_info("com.example.gone", None, None)?;
                s.set_priority_order(HealthDataCategory::Activity, &[staged_b, staged_gone])?;
                Ok(())
            })
            .unwrap();

        let stats = merger(&f.primary, &[("com.example.b", "B")])
            .merge(&f.staged)
            .unwrap();

        let primary = f.primary.lock();
        let b = primary.get_app_info_id("com.example.b").unwrap().unwrap();
        let gone = primary.get_app_info_id("com.example.gone").unwrap().unwrap();
        assert_eq!(
            primary.get_priority_order(HealthDataCategory::Activity).unwrap(),
            vec![a, b, gone]
        );
        let label = primary
            .list_app_infos()
            .unwrap()
            .into_iter()
            .find(|app| app.row_id == b)
            .and_then(|app| app.application_name);
        assert_eq!(label.as_deref(), Some("B"));
        assert_eq!(stats.categories_merged, 1);
    }

    #[test]
    fn test_merges_are_serialized_across_mergers() {
        let f = fixture();
        let app = f
            .staged
            .write(|s| s.insert_app_info("com.example.fit", None, None))
            .unwrap();
        f.staged
            .write(|s| s.insert_records(&[steps("s1", app, 1)], &InsertMode::Restore))
            .unwrap();
        let second = merger(&f.primary, &[]);

        let running = MERGE_LOCK.lock();
        std::thread::scope(|scope| {
            let handle = scope.spawn(|| second.merge(&f.staged));
            std::thread::sleep(Duration::from_millis(50));
            assert_eq!(f.primary.lock().count_records(RecordType::Steps).unwrap(), 0);
            drop(running);
            handle.join().unwrap().unwrap();
        });

        assert_eq!(f.primary.lock().count_records(RecordType::Steps).unwrap(), 1);
    }
}
