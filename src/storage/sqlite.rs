//! SQLite storage implementation.
//!
//! This module provides the primary health database: app identities,
//! records, priority lists, usage index and the device-local log tables.
//! Record writes follow the `mutate` transaction discipline so change logs
//! are committed atomically with the data they describe.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::backup::Backup;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::storage::records::{
    HealthDataCategory, HeartRateSample, InsertMode, PageCursor, PageToken, Record, RecordData,
    RecordPage, RecordType,
};
use crate::storage::schema::{
    apply_schema, ACCESS_LOGS_TABLE, APP_INFO_TABLE, CHANGE_LOGS_TABLE, HEART_RATE_SERIES_TABLE,
    LOG_TABLES, PRIORITY_TABLE, USAGE_TABLE,
};

/// Primary database handle shared by every transfer component.
///
/// One connection per process; components lock it per operation.
pub type SharedStorage = Arc<Mutex<HealthStorage>>;

/// Columns every record table has, in bind order.
const COMMON_COLUMNS: [&str; 7] = [
    "uuid",
    "app_info_id",
    "client_record_id",
    "last_modified_time",
    "start_time",
    "end_time",
    "zone_offset",
];

/// Answers whether a package is installed on this device.
pub trait PackageInventory: Send + Sync {
    fn is_installed(&self, package: &str) -> bool;

    /// Display label of an installed package.
    fn application_label(&self, package: &str) -> Option<String>;
}

/// An app identity row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    pub row_id: i64,
    pub package_name: String,
    pub application_name: Option<String>,
}

/// Kind of operation recorded in the log tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Upsert,
    Delete,
    Read,
}

impl OperationType {
    #[must_use]
    pub const fn id(self) -> i32 {
        match self {
            Self::Upsert => 0,
            Self::Delete => 1,
            Self::Read => 2,
        }
    }
}

/// A change log row waiting to be written.
#[derive(Debug, Clone)]
pub struct ChangeLogEntry {
    pub record_type: RecordType,
    pub app_info_id: i64,
    pub uuid: String,
    pub operation: OperationType,
}

/// An access log row waiting to be written.
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub app_info_id: i64,
    pub record_types: Vec<RecordType>,
    pub operation: OperationType,
}

/// Context for a mutation, collecting log rows written at commit.
pub struct MutationContext {
    /// Name of the operation being performed.
    pub op_name: String,
    pub changes: Vec<ChangeLogEntry>,
    pub accesses: Vec<AccessLogEntry>,
}

impl MutationContext {
    #[must_use]
    pub fn new(op_name: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            changes: Vec::new(),
            accesses: Vec::new(),
        }
    }

    pub fn record_change(
        &mut self,
        record_type: RecordType,
        app_info_id: i64,
        uuid: &str,
        operation: OperationType,
    ) {
        self.changes.push(ChangeLogEntry {
            record_type,
            app_info_id,
            uuid: uuid.to_string(),
            operation,
        });
    }

    pub fn record_access(
        &mut self,
        app_info_id: i64,
        record_types: Vec<RecordType>,
        operation: OperationType,
    ) {
        self.accesses.push(AccessLogEntry {
            app_info_id,
            record_types,
            operation,
        });
    }
}

/// SQLite-based health storage.
#[derive(Debug)]
pub struct HealthStorage {
    conn: Connection,
    path: PathBuf,
}

impl HealthStorage {
    /// Open a database at the given path, creating or migrating it as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established, the schema
    /// is newer than this build, or a migration fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Same as [`HealthStorage::open`].
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(timeout_ms.unwrap_or(5000)))?;
        apply_schema(&conn, path)?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let path = PathBuf::from(":memory:");
        apply_schema(&conn, &path)?;
        Ok(Self { conn, path })
    }

    /// Wrap this storage for sharing between components.
    #[must_use]
    pub fn into_shared(self) -> SharedStorage {
        Arc::new(Mutex::new(self))
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Execute a mutation inside an IMMEDIATE transaction.
    ///
    /// Change and access log rows collected in the [`MutationContext`] are
    /// written before commit. The transaction is rolled back on error.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails.
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let mut ctx = MutationContext::new(op);
        let result = f(&tx, &mut ctx)?;
        let now = chrono::Utc::now().timestamp_millis();

        for change in &ctx.changes {
            tx.execute(
                &format!(
                    "INSERT INTO {CHANGE_LOGS_TABLE}
                     (record_type, app_info_id, uuid, operation_type, change_time)
                     VALUES (?1, ?2, ?3, ?4, ?5)"
                ),
                params![
                    change.record_type.id(),
                    change.app_info_id,
                    change.uuid,
                    change.operation.id(),
                    now
                ],
            )?;
        }

        for access in &ctx.accesses {
            let types = access
                .record_types
                .iter()
                .map(|t| t.id().to_string())
                .collect::<Vec<_>>()
                .join(",");
            tx.execute(
                &format!(
                    "INSERT INTO {ACCESS_LOGS_TABLE}
                     (app_info_id, record_types, operation_type, access_time)
                     VALUES (?1, ?2, ?3, ?4)"
                ),
                params![access.app_info_id, types, access.operation.id(), now],
            )?;
        }

        tx.commit()?;
        debug!(
            op = ctx.op_name,
            changes = ctx.changes.len(),
            accesses = ctx.accesses.len(),
            "Mutation committed"
        );

        Ok(result)
    }

    /// Copy the whole database to `dest` with the online backup API.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be opened or the copy fails.
    pub fn backup_to(&self, dest: &Path) -> Result<()> {
        let mut dest_conn = Connection::open(dest)?;
        let backup = Backup::new(&self.conn, &mut dest_conn)?;
        backup.run_to_completion(256, Duration::ZERO, None)?;
        Ok(())
    }

    /// Empty the device-local log tables.
    ///
    /// # Errors
    ///
    /// Returns an error if a delete fails.
    pub fn clear_log_tables(&mut self) -> Result<usize> {
        let mut cleared = 0;
        for table in LOG_TABLES {
            cleared += self.conn.execute(&format!("DELETE FROM {table}"), [])?;
        }
        Ok(cleared)
    }

    /// Switch the journal back to a rollback journal so the main file holds
    /// every committed page.
    ///
    /// # Errors
    ///
    /// Returns an error if the pragma fails.
    pub fn checkpoint_to_single_file(&self) -> Result<()> {
        self.conn.pragma_update(None, "journal_mode", "DELETE")?;
        Ok(())
    }

    // ==================
    // App Info Operations
    // ==================

    /// Look up the local row id for a package.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_app_info_id(&self, package: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                &format!("SELECT row_id FROM {APP_INFO_TABLE} WHERE package_name = ?1"),
                [package],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Insert an app identity row, returning the existing id if the
    /// package already has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_app_info(
        &mut self,
        package: &str,
        label: Option<&str>,
        icon: Option<&[u8]>,
    ) -> Result<i64> {
        if let Some(id) = self.get_app_info_id(package)? {
            return Ok(id);
        }
        self.conn.execute(
            &format!(
                "INSERT INTO {APP_INFO_TABLE} (package_name, application_name, app_icon)
                 VALUES (?1, ?2, ?3)"
            ),
            params![package, label, icon],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Resolve a package to its row id, creating the row for installed apps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AppInfoNotFound`] if the package has no row and is
    /// not installed.
    pub fn get_or_insert_app_info_id(
        &mut self,
        package: &str,
        inventory: &dyn PackageInventory,
    ) -> Result<i64> {
        if let Some(id) = self.get_app_info_id(package)? {
            return Ok(id);
        }
        if !inventory.is_installed(package) {
            return Err(Error::AppInfoNotFound {
                package: package.to_string(),
            });
        }
        let label = inventory.application_label(package);
        self.insert_app_info(package, label.as_deref(), None)
    }

    /// List all app identities ordered by row id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_app_infos(&self) -> Result<Vec<AppInfo>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT row_id, package_name, application_name FROM {APP_INFO_TABLE} ORDER BY row_id"
        ))?;
        let infos = stmt
            .query_map([], |row| {
                Ok(AppInfo {
                    row_id: row.get(0)?,
                    package_name: row.get(1)?,
                    application_name: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(infos)
    }

    /// Icon bytes stored for a package, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_app_icon(&self, package: &str) -> Result<Option<Vec<u8>>> {
        let icon = self
            .conn
            .query_row(
                &format!("SELECT app_icon FROM {APP_INFO_TABLE} WHERE package_name = ?1"),
                [package],
                |row| row.get::<_, Option<Vec<u8>>>(0),
            )
            .optional()?;
        Ok(icon.flatten())
    }

    // ==================
    // Record Operations
    // ==================

    /// Upsert a batch of records keyed by UUID.
    ///
    /// In [`InsertMode::Client`] every record gets a new UUID, is attributed
    /// to the calling package and an access log row is written. In
    /// [`InsertMode::Restore`] UUIDs, app ids and timestamps are kept as given.
    /// Returns the UUIDs written, in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if the calling package is unknown or any write
    /// fails; nothing from the batch is committed in that case.
    pub fn insert_records(&mut self, records: &[Record], mode: &InsertMode) -> Result<Vec<String>> {
        let client_app_id = match mode {
            InsertMode::Client { package } => Some(self.get_app_info_id(package)?.ok_or_else(
                || Error::AppInfoNotFound {
                    package: package.clone(),
                },
            )?),
            InsertMode::Restore => None,
        };

        self.mutate("insert_records", |tx, ctx| {
            let now = chrono::Utc::now().timestamp_millis();
            let mut uuids = Vec::with_capacity(records.len());
            let mut types = Vec::new();

            for record in records {
                let mut record = record.clone();
                if let Some(app_id) = client_app_id {
                    record.uuid = uuid::Uuid::new_v4().to_string();
                    record.app_info_id = app_id;
                    record.last_modified_time = now;
                    if let RecordData::PlannedExerciseSession {
                        completed_exercise_session_id,
                        ..
                    } = &mut record.data
                    {
                        *completed_exercise_session_id = None;
                    }
                }

                upsert_record(tx, &record)?;
                ctx.record_change(
                    record.record_type(),
                    record.app_info_id,
                    &record.uuid,
                    OperationType::Upsert,
                );
                if !types.contains(&record.record_type()) {
                    types.push(record.record_type());
                }
                uuids.push(record.uuid);
            }

            if let Some(app_id) = client_app_id {
                ctx.record_access(app_id, types, OperationType::Upsert);
            }
            Ok(uuids)
        })
    }

    /// Read one page of a record table in row id order.
    ///
    /// Satellite rows are loaded with their parent record.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn read_records_page(
        &self,
        record_type: RecordType,
        token: PageToken,
        page_size: u32,
    ) -> Result<RecordPage> {
        let sql = select_records_sql(record_type, "row_id > ?1 ORDER BY row_id LIMIT ?2");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt
            .query_map(params![token.last_row_id, i64::from(page_size)], |row| {
                map_record_row(record_type, row)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for (row_id, record) in &mut rows {
            self.load_satellites(*row_id, record)?;
        }

        let next = match rows.last() {
            Some((row_id, _)) if rows.len() == page_size as usize => PageCursor::More(PageToken {
                last_row_id: *row_id,
            }),
            _ => PageCursor::End,
        };

        Ok(RecordPage {
            records: rows.into_iter().map(|(_, record)| record).collect(),
            next,
        })
    }

    /// Get a single record by UUID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_record(&self, record_type: RecordType, uuid: &str) -> Result<Option<Record>> {
        let sql = select_records_sql(record_type, "uuid = ?1");
        let found = self
            .conn
            .query_row(&sql, [uuid], |row| map_record_row(record_type, row))
            .optional()?;

        match found {
            Some((row_id, mut record)) => {
                self.load_satellites(row_id, &mut record)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Delete every row of a record table, satellites included.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_all_records(&mut self, record_type: RecordType) -> Result<usize> {
        if record_type == RecordType::HeartRate {
            self.conn
                .execute(&format!("DELETE FROM {HEART_RATE_SERIES_TABLE}"), [])?;
        }
        let deleted = self
            .conn
            .execute(&format!("DELETE FROM {}", record_type.table_name()), [])?;
        Ok(deleted)
    }

    /// Count rows in a record table.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_records(&self, record_type: RecordType) -> Result<usize> {
        self.count_rows(record_type.table_name())
    }

    /// Count rows in any table.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_rows(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn load_satellites(&self, row_id: i64, record: &mut Record) -> Result<()> {
        if let RecordData::HeartRate { samples } = &mut record.data {
            let mut stmt = self.conn.prepare_cached(&format!(
                "SELECT epoch_millis, beats_per_minute FROM {HEART_RATE_SERIES_TABLE}
                 WHERE parent_key = ?1 ORDER BY epoch_millis"
            ))?;
            *samples = stmt
                .query_map([row_id], |row| {
                    Ok(HeartRateSample {
                        epoch_millis: row.get(0)?,
                        beats_per_minute: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
        }
        Ok(())
    }

    // ==================
    // Usage Operations
    // ==================

    /// Recompute which record types each app has written.
    ///
    /// Full rebuild from the record tables. Returns the number of
    /// `(app, record type)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if the rebuild fails.
    pub fn resync_app_record_type_usage(&mut self) -> Result<usize> {
        self.mutate("resync_app_record_type_usage", |tx, _ctx| {
            tx.execute(&format!("DELETE FROM {USAGE_TABLE}"), [])?;
            let mut pairs = 0;
            for record_type in RecordType::ALL {
                pairs += tx.execute(
                    &format!(
                        "INSERT OR IGNORE INTO {USAGE_TABLE} (app_info_id, record_type)
                         SELECT DISTINCT app_info_id, ?1 FROM {}",
                        record_type.table_name()
                    ),
                    [record_type.id()],
                )?;
            }
            Ok(pairs)
        })
    }

    /// Record types an app has data for, per the usage index.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn record_types_used_by(&self, app_info_id: i64) -> Result<Vec<RecordType>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT record_type FROM {USAGE_TABLE} WHERE app_info_id = ?1 ORDER BY record_type"
        ))?;
        let ids = stmt
            .query_map([app_info_id], |row| row.get::<_, i32>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids.into_iter().filter_map(RecordType::from_id).collect())
    }

    // ==================
    // Priority Operations
    // ==================

    /// Ordered app ids for a category; empty if none stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored list is malformed.
    pub fn get_priority_order(&self, category: HealthDataCategory) -> Result<Vec<i64>> {
        let stored: Option<String> = self
            .conn
            .query_row(
                &format!(
                    "SELECT app_id_priority_order FROM {PRIORITY_TABLE}
                     WHERE health_data_category = ?1"
                ),
                [category.id()],
                |row| row.get(0),
            )
            .optional()?;
        stored.map_or_else(|| Ok(Vec::new()), |s| decode_priority_order(&s))
    }

    /// Replace the ordered app ids for a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_priority_order(&mut self, category: HealthDataCategory, app_ids: &[i64]) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO {PRIORITY_TABLE} (health_data_category, app_id_priority_order)
                 VALUES (?1, ?2)
                 ON CONFLICT(health_data_category)
                 DO UPDATE SET app_id_priority_order = excluded.app_id_priority_order"
            ),
            params![category.id(), encode_priority_order(app_ids)],
        )?;
        Ok(())
    }

    /// Every stored priority list, by category.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored list is malformed.
    pub fn list_priority_orders(&self) -> Result<Vec<(HealthDataCategory, Vec<i64>)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT health_data_category, app_id_priority_order FROM {PRIORITY_TABLE}
             ORDER BY health_data_category"
        ))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i32>(0)?, row.get::<_, String>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut orders = Vec::with_capacity(rows.len());
        for (category_id, encoded) in rows {
            match HealthDataCategory::from_id(category_id) {
                Some(category) => orders.push((category, decode_priority_order(&encoded)?)),
                None => warn!(category_id, "Skipping priority list for unknown category"),
            }
        }
        Ok(orders)
    }
}

/// Encode an app id list as stored in the priority table.
#[must_use]
pub fn encode_priority_order(app_ids: &[i64]) -> String {
    app_ids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode a stored priority list.
///
/// # Errors
///
/// Returns an error if an element is not an integer.
pub fn decode_priority_order(encoded: &str) -> Result<Vec<i64>> {
    encoded
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| Error::Other(format!("Malformed priority list entry: {s}")))
        })
        .collect()
}

fn select_records_sql(record_type: RecordType, filter: &str) -> String {
    let columns: Vec<&str> = COMMON_COLUMNS
        .iter()
        .chain(record_type.payload_columns())
        .copied()
        .collect();
    format!(
        "SELECT row_id, {} FROM {} WHERE {filter}",
        columns.join(", "),
        record_type.table_name()
    )
}

fn map_record_row(record_type: RecordType, row: &rusqlite::Row) -> rusqlite::Result<(i64, Record)> {
    let row_id: i64 = row.get(0)?;
    let record = Record {
        uuid: row.get(1)?,
        app_info_id: row.get(2)?,
        client_record_id: row.get(3)?,
        last_modified_time: row.get(4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        zone_offset: row.get(7)?,
        data: RecordData::from_row(record_type, row, 8)?,
    };
    Ok((row_id, record))
}

/// Upsert one record and its satellite rows.
fn upsert_record(tx: &Transaction, record: &Record) -> Result<()> {
    let record_type = record.record_type();
    let columns: Vec<&str> = COMMON_COLUMNS
        .iter()
        .chain(record_type.payload_columns())
        .copied()
        .collect();
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let updates = columns
        .iter()
        .filter(|c| **c != "uuid")
        .map(|c| format!("{c} = excluded.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({placeholders}) ON CONFLICT(uuid) DO UPDATE SET {updates}",
        record_type.table_name(),
        columns.join(", ")
    );

    let mut values = vec![
        Value::Text(record.uuid.clone()),
        Value::Integer(record.app_info_id),
        record
            .client_record_id
            .clone()
            .map_or(Value::Null, Value::Text),
        Value::Integer(record.last_modified_time),
        Value::Integer(record.start_time),
        Value::Integer(record.end_time),
        record
            .zone_offset
            .map_or(Value::Null, |z| Value::Integer(i64::from(z))),
    ];
    values.extend(record.data.payload_values());
    tx.execute(&sql, params_from_iter(values))?;

    match &record.data {
        RecordData::HeartRate { samples } => {
            let row_id: i64 = tx.query_row(
                &format!("SELECT row_id FROM {} WHERE uuid = ?1", record_type.table_name()),
                [&record.uuid],
                |row| row.get(0),
            )?;
            tx.execute(
                &format!("DELETE FROM {HEART_RATE_SERIES_TABLE} WHERE parent_key = ?1"),
                [row_id],
            )?;
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT INTO {HEART_RATE_SERIES_TABLE} (parent_key, epoch_millis, beats_per_minute)
                 VALUES (?1, ?2, ?3)"
            ))?;
            for sample in samples {
                stmt.execute(params![row_id, sample.epoch_millis, sample.beats_per_minute])?;
            }
        }
        RecordData::ExerciseSession {
            planned_exercise_session_id: Some(planned),
            ..
        } => {
            // Link the plan back to the session that completed it.
            tx.execute(
                &format!(
                    "UPDATE {} SET completed_exercise_session_id = ?1 WHERE uuid = ?2",
                    RecordType::PlannedExerciseSession.table_name()
                ),
                params![record.uuid, planned],
            )?;
        }
        _ => {}
    }

    Ok(())
}
