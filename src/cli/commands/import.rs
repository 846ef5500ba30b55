//! Import an export archive into the primary database.

use std::collections::BTreeMap;

use crate::cli::commands::Runtime;
use crate::error::{Error, Result};
use crate::storage::{RecordType, SharedStorage};
use crate::transfer::ImportOutcome;
use colored::Colorize;

fn record_counts(storage: &SharedStorage) -> Result<BTreeMap<RecordType, usize>> {
    let storage = storage.lock();
    RecordType::ALL
        .into_iter()
        .map(|t| Ok((t, storage.count_records(t)?)))
        .collect()
}

/// Execute the import command.
///
/// # Errors
///
/// Returns [`Error::ImportFailed`] with the persisted outcome if nothing was
/// merged.
pub fn execute(runtime: &Runtime, uri: &str, json: bool) -> Result<()> {
    let storage = runtime.open_storage()?;
    let before = record_counts(&storage)?;
    let importer = runtime.import_manager(storage.clone())?;

    if !importer.run_import(uri) {
        let outcome = runtime
            .settings
            .load()?
            .last_import
            .map_or(ImportOutcome::CopyFailed, |i| i.outcome);
        return Err(Error::ImportFailed { outcome });
    }

    let after = record_counts(&storage)?;
    let added: BTreeMap<RecordType, usize> = after
        .iter()
        .map(|(t, n)| (*t, n.saturating_sub(before.get(t).copied().unwrap_or(0))))
        .collect();

    if json {
        let output = serde_json::json!({
            "success": true,
            "source": uri,
            "records": after,
            "added": added,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", "Import complete".green().bold());
        println!("  Source: {uri}");
        println!();
        for (record_type, count) in &after {
            let name = record_type.to_string();
            let delta = added.get(record_type).copied().unwrap_or(0);
            if delta > 0 {
                println!("  {name:<26} {count:>8}  (+{delta})");
            } else {
                println!("  {name:<26} {count:>8}");
            }
        }
    }

    Ok(())
}
