//! Status command implementation.

use crate::cli::commands::{format_time, Runtime};
use crate::config::ExportImportSettings;
use crate::error::Result;
use crate::storage::{AppInfo, RecordType};
use crate::transfer::{JobInfo, JobScheduler, JOB_NAMESPACE};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Output for status command.
#[derive(Serialize)]
struct StatusOutput {
    user: u32,
    database: PathBuf,
    initialized: bool,
    settings: ExportImportSettings,
    jobs: Vec<JobInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<BTreeMap<RecordType, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    apps: Option<Vec<AppInfo>>,
}

/// Execute status command.
///
/// Settings and jobs are shown even before `htx init`; record counts need
/// the database.
///
/// # Errors
///
/// Returns an error if settings, jobs or the database cannot be read.
pub fn execute(runtime: &Runtime, json: bool) -> Result<()> {
    let settings = runtime.settings.load()?;
    let jobs = runtime.job_scheduler().pending(JOB_NAMESPACE)?;

    let initialized = runtime.db_path.exists();
    let (records, apps) = if initialized {
        let storage = runtime.open_storage()?;
        let storage = storage.lock();
        let mut records = BTreeMap::new();
        for record_type in RecordType::ALL {
            records.insert(record_type, storage.count_records(record_type)?);
        }
        (Some(records), Some(storage.list_app_infos()?))
    } else {
        (None, None)
    };

    if json {
        let output = StatusOutput {
            user: runtime.user,
            database: runtime.db_path.clone(),
            initialized,
            settings,
            jobs,
            records,
            apps,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("{}", "Health Transfer Status".bold());
    println!("======================");
    println!();
    println!("User:     {}", runtime.user);
    println!("Database: {}", runtime.db_path.display());
    println!();

    println!("{}", "Export".cyan().bold());
    if settings.export_period_days > 0 {
        println!("  Period:      every {} day(s)", settings.export_period_days);
    } else {
        println!("  Period:      disabled");
    }
    println!(
        "  Destination: {}",
        settings.destination_uri.as_deref().unwrap_or("(none)")
    );
    match &settings.last_successful_export {
        Some(last) => println!("  Last export: {} to {}", format_time(last.time_ms), last.uri),
        None => println!("  Last export: never"),
    }
    if let Some(err) = &settings.last_export_error {
        println!(
            "  Last error:  {} at {}",
            err.code.as_str().red(),
            format_time(err.time_ms)
        );
    }
    for job in &jobs {
        println!(
            "  Next window: {}{}",
            format_time(job.next_window_start_ms()),
            if job.extras.is_first_export {
                " (first export)"
            } else {
                ""
            }
        );
    }
    println!();

    println!("{}", "Import".cyan().bold());
    match &settings.last_import {
        Some(last) => println!(
            "  Last import: {} at {}",
            last.outcome,
            format_time(last.time_ms)
        ),
        None => println!("  Last import: never"),
    }
    println!();

    match (records, apps) {
        (Some(records), Some(apps)) => {
            println!("{}", "Records".cyan().bold());
            for (record_type, count) in &records {
                let name = record_type.to_string();
                println!("  {name:<26} {count:>8}");
            }
            println!("  Apps: {}", apps.len());
        }
        _ => {
            println!("No database yet.");
            println!();
            println!("Create one with: htx init");
        }
    }

    Ok(())
}
