//! List document providers that can receive an export archive.

use crate::cli::commands::Runtime;
use crate::config::DOCUMENT_PROVIDERS_FILE_NAME;
use crate::error::Result;
use crate::transfer::{query_document_providers, JsonDocumentsBackend};
use colored::Colorize;

/// Execute the providers command.
///
/// # Errors
///
/// Returns an error if the provider registry cannot be read.
pub fn execute(runtime: &Runtime, json: bool) -> Result<()> {
    let backend = JsonDocumentsBackend::load(&runtime.data_root.join(DOCUMENT_PROVIDERS_FILE_NAME))?;
    let providers = query_document_providers(&backend);

    if json {
        println!("{}", serde_json::to_string(&providers)?);
        return Ok(());
    }

    if providers.is_empty() {
        println!("No document providers can receive exports.");
        return Ok(());
    }

    for provider in &providers {
        println!("{}", provider.title.bold());
        if let Some(summary) = &provider.summary {
            println!("  {summary}");
        }
        println!("  {}", provider.root_uri.dimmed());
    }

    Ok(())
}
