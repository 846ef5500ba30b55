//! Database migrations embedded at compile time.
//!
//! Migrations are sourced from `/migrations/` at the repo root and
//! embedded into the binary using `include_str!`. Each one moves the
//! database from `version - 1` to `version`; the reached version is stored
//! in the `user_version` pragma.

use rusqlite::Connection;
use tracing::info;

use super::schema::{set_user_version, user_version, DATABASE_VERSION};

/// A single migration with its target version and SQL content.
struct Migration {
    version: i32,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order, embedded at compile time.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 2,
        name: "002_exercise_sessions",
        sql: include_str!("../../migrations/002_exercise_sessions.sql"),
    },
    Migration {
        version: 3,
        name: "003_priority_and_usage",
        sql: include_str!("../../migrations/003_priority_and_usage.sql"),
    },
];

/// Run all pending migrations on the database.
///
/// Migrations above the current `user_version` are applied in order, each
/// inside its own transaction together with the version bump. Safe to call
/// on every open.
///
/// # Errors
///
/// Returns an error if a migration fails to apply.
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    let current = user_version(conn)?;

    for migration in MIGRATIONS {
        if migration.version <= current || migration.version > DATABASE_VERSION {
            continue;
        }

        info!(version = migration.version, name = migration.name, "Applying migration");

        conn.execute_batch("BEGIN IMMEDIATE")?;
        let applied = conn
            .execute_batch(migration.sql)
            .and_then(|()| set_user_version(conn, migration.version));
        match applied {
            Ok(()) => conn.execute_batch("COMMIT")?,
            Err(e) => {
                conn.execute_batch("ROLLBACK")?;
                return Err(e);
            }
        }

        info!(version = migration.version, "Migration complete");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::SCHEMA_SQL;

    /// Create a database frozen at version 1.
    fn setup_v1(conn: &Connection) {
        conn.execute_batch(SCHEMA_SQL).expect("Base schema should apply");
        set_user_version(conn, 1).unwrap();
    }

    #[test]
    fn test_migrations_compile() {
        assert_eq!(MIGRATIONS.len(), 2);
        assert_eq!(
            MIGRATIONS.last().map(|m| m.version),
            Some(DATABASE_VERSION)
        );
    }

    #[test]
    fn test_run_migrations_from_v1() {
        let conn = Connection::open_in_memory().unwrap();
        setup_v1(&conn);
        run_migrations(&conn).expect("Migrations should apply to a v1 database");

        assert_eq!(user_version(&conn).unwrap(), DATABASE_VERSION);
        let has_exercise: bool = conn
            .prepare("SELECT 1 FROM sqlite_master WHERE name = 'exercise_session_record_table'")
            .unwrap()
            .exists([])
            .unwrap();
        assert!(has_exercise);
    }

    #[test]
    fn test_run_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_v1(&conn);

        run_migrations(&conn).expect("First run should succeed");
        run_migrations(&conn).expect("Second run should succeed (idempotent)");
        assert_eq!(user_version(&conn).unwrap(), DATABASE_VERSION);
    }
}
