//! Database schema definitions.
//!
//! The base (version 1) DDL lives here; later versions are applied by
//! [`super::migrations`]. The schema version is tracked with SQLite's
//! `user_version` pragma so a raw read-only handle can inspect it without
//! touching any table.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::error::{Error, Result};

/// Schema version written by this build.
///
/// A staged database with a higher version is never merged.
pub const DATABASE_VERSION: i32 = 3;

pub const APP_INFO_TABLE: &str = "application_info_table";
pub const ACCESS_LOGS_TABLE: &str = "access_logs_table";
pub const CHANGE_LOGS_TABLE: &str = "change_logs_table";
pub const PRIORITY_TABLE: &str = "health_data_category_priority_table";
pub const USAGE_TABLE: &str = "app_record_type_usage_table";
pub const HEART_RATE_SERIES_TABLE: &str = "heart_rate_record_series_table";

/// Log tables that never leave the device.
pub const LOG_TABLES: [&str; 2] = [ACCESS_LOGS_TABLE, CHANGE_LOGS_TABLE];

/// Version 1 schema.
///
/// Timestamps are INTEGER Unix milliseconds.
pub const SCHEMA_SQL: &str = r"
-- ====================
-- App identities
-- ====================

CREATE TABLE IF NOT EXISTS application_info_table (
    row_id INTEGER PRIMARY KEY AUTOINCREMENT,
    package_name TEXT NOT NULL UNIQUE,
    application_name TEXT,
    app_icon BLOB
);

-- ====================
-- Records
-- ====================

CREATE TABLE IF NOT EXISTS steps_record_table (
    row_id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT NOT NULL UNIQUE,
    app_info_id INTEGER NOT NULL,
    client_record_id TEXT,
    last_modified_time INTEGER NOT NULL,
    start_time INTEGER NOT NULL,
    end_time INTEGER NOT NULL,
    zone_offset INTEGER,
    count INTEGER NOT NULL,
    FOREIGN KEY (app_info_id) REFERENCES application_info_table(row_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_steps_start ON steps_record_table(start_time);

CREATE TABLE IF NOT EXISTS weight_record_table (
    row_id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT NOT NULL UNIQUE,
    app_info_id INTEGER NOT NULL,
    client_record_id TEXT,
    last_modified_time INTEGER NOT NULL,
    start_time INTEGER NOT NULL,
    end_time INTEGER NOT NULL,
    zone_offset INTEGER,
    weight_grams REAL NOT NULL,
    FOREIGN KEY (app_info_id) REFERENCES application_info_table(row_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_weight_start ON weight_record_table(start_time);

CREATE TABLE IF NOT EXISTS heart_rate_record_table (
    row_id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT NOT NULL UNIQUE,
    app_info_id INTEGER NOT NULL,
    client_record_id TEXT,
    last_modified_time INTEGER NOT NULL,
    start_time INTEGER NOT NULL,
    end_time INTEGER NOT NULL,
    zone_offset INTEGER,
    FOREIGN KEY (app_info_id) REFERENCES application_info_table(row_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_heart_rate_start ON heart_rate_record_table(start_time);

-- Samples belonging to one heart rate series
CREATE TABLE IF NOT EXISTS heart_rate_record_series_table (
    parent_key INTEGER NOT NULL,
    epoch_millis INTEGER NOT NULL,
    beats_per_minute INTEGER NOT NULL,
    FOREIGN KEY (parent_key) REFERENCES heart_rate_record_table(row_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_heart_rate_series_parent ON heart_rate_record_series_table(parent_key);

-- ====================
-- Device-local logs
-- ====================

CREATE TABLE IF NOT EXISTS access_logs_table (
    row_id INTEGER PRIMARY KEY AUTOINCREMENT,
    app_info_id INTEGER NOT NULL,
    record_types TEXT NOT NULL,
    operation_type INTEGER NOT NULL,
    access_time INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS change_logs_table (
    row_id INTEGER PRIMARY KEY AUTOINCREMENT,
    record_type INTEGER NOT NULL,
    app_info_id INTEGER NOT NULL,
    uuid TEXT NOT NULL,
    operation_type INTEGER NOT NULL,
    change_time INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_change_logs_time ON change_logs_table(change_time);
";

/// Apply pragmas, the base schema and all pending migrations.
///
/// # Errors
///
/// Returns [`Error::SchemaTooNew`] if the database was written by a newer
/// build, or a database error if any statement fails.
pub fn apply_schema(conn: &Connection, path: &Path) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    let version = user_version(conn)?;
    if version > DATABASE_VERSION {
        return Err(Error::SchemaTooNew {
            path: path.to_path_buf(),
            found: version,
            supported: DATABASE_VERSION,
        });
    }

    if version == 0 {
        conn.execute_batch(SCHEMA_SQL)?;
        set_user_version(conn, 1)?;
    }

    super::migrations::run_migrations(conn)?;
    Ok(())
}

/// Read the `user_version` pragma.
///
/// # Errors
///
/// Returns an error if the pragma cannot be read.
pub fn user_version(conn: &Connection) -> rusqlite::Result<i32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

pub(crate) fn set_user_version(conn: &Connection, version: i32) -> rusqlite::Result<()> {
    conn.pragma_update(None, "user_version", version)
}

/// Read the schema version of a database file through a raw read-only handle.
///
/// Returns `None` if the file does not exist or cannot be opened as SQLite.
#[must_use]
pub fn read_database_version(path: &Path) -> Option<i32> {
    if !path.exists() {
        return None;
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .ok()?;
    user_version(&conn).ok()
}
