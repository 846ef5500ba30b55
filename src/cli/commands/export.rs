//! Run one export cycle now.

use crate::cli::commands::Runtime;
use crate::error::{Error, Result};
use crate::transfer::ExportErrorCode;
use colored::Colorize;

/// Execute the export command.
///
/// # Errors
///
/// Returns [`Error::ExportFailed`] with the persisted error code if the
/// archive did not reach its destination.
pub fn execute(runtime: &Runtime, json: bool) -> Result<()> {
    let storage = runtime.open_storage()?;
    let exporter = runtime.export_manager(storage);

    if !exporter.run_export() {
        let settings = runtime.settings.load()?;
        let code = settings
            .last_export_error
            .map_or(ExportErrorCode::Unknown, |e| e.code);
        return Err(Error::ExportFailed { code });
    }

    let settings = runtime.settings.load()?;
    let destination = settings.last_successful_export.map(|e| e.uri);

    if json {
        let output = serde_json::json!({
            "success": true,
            "destination": destination,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", "Export complete".green().bold());
        if let Some(uri) = destination {
            println!("  Destination: {uri}");
        }
    }

    Ok(())
}
