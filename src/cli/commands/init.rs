//! Create or migrate the primary health database.
//!
//! Opening the database applies the base schema and any pending
//! migrations, so running `htx init` again on an existing database only
//! brings it up to date.

use crate::cli::commands::Runtime;
use crate::error::Result;
use crate::storage::{HealthStorage, DATABASE_VERSION};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Serialize)]
struct InitOutput {
    data_dir: PathBuf,
    database: PathBuf,
    schema_version: i32,
    created: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the directory or database cannot be created, or if
/// the existing database was written by a newer schema.
pub fn execute(runtime: &Runtime, json: bool) -> Result<()> {
    let created = !runtime.db_path.exists();
    if let Some(parent) = runtime.db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir_all(runtime.user_dir())?;

    HealthStorage::open(&runtime.db_path)?;

    if json {
        let output = InitOutput {
            data_dir: runtime.data_root.clone(),
            database: runtime.db_path.clone(),
            schema_version: DATABASE_VERSION,
            created,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        if created {
            println!("Initialized health database");
        } else {
            println!("Health database is up to date");
        }
        println!("  Database: {}", runtime.db_path.display());
        println!("  Schema:   v{DATABASE_VERSION}");
        if created {
            println!();
            println!("Next: Run 'htx configure --destination <uri> --period 7' to schedule exports.");
        }
    }

    Ok(())
}
