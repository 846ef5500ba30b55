//! Discovery of document providers that can receive an export archive.
//!
//! A provider exposes one or more roots. Each root row is a column map; a
//! root qualifies when it can create documents, is not local-only, and does
//! not exclude `application/zip` through a mime allowlist.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Root can create new documents.
pub const FLAG_SUPPORTS_CREATE: i64 = 1;
/// Root stores data on this device only.
pub const FLAG_LOCAL_ONLY: i64 = 1 << 1;

pub const ZIP_MIME_TYPE: &str = "application/zip";

pub const COLUMN_ROOT_ID: &str = "root_id";
pub const COLUMN_TITLE: &str = "title";
pub const COLUMN_SUMMARY: &str = "summary";
pub const COLUMN_ICON: &str = "icon";
pub const COLUMN_FLAGS: &str = "flags";
/// Newline separated list of accepted mime types.
pub const COLUMN_MIME_TYPES: &str = "mime_types";

/// One row of a provider's roots listing.
pub type RootRow = BTreeMap<String, Value>;

/// Failure while querying a provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider process died mid-query; worth one retry.
    #[error("Provider died: {0}")]
    DeadObject(String),

    #[error("Provider query failed: {0}")]
    Query(String),
}

/// Source of document providers and their roots.
pub trait DocumentsBackend: Send + Sync {
    /// Authorities of every provider advertising the documents capability.
    fn document_providers(&self) -> Vec<String>;

    /// Query the roots listing of one provider.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the provider cannot answer.
    fn query_roots(&self, authority: &str) -> std::result::Result<Vec<RootRow>, ProviderError>;
}

/// A root that can receive export archives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentProvider {
    pub title: String,
    pub summary: Option<String>,
    pub icon: i64,
    pub root_uri: String,
    pub authority: String,
}

/// List supported roots across every provider.
///
/// A provider that keeps failing is dropped; the others are still listed.
pub fn query_document_providers(backend: &dyn DocumentsBackend) -> Vec<DocumentProvider> {
    let mut providers = Vec::new();

    for authority in backend.document_providers() {
        let rows = match query_roots_with_retry(backend, &authority) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(authority = %authority, error = %e, "Skipping document provider");
                continue;
            }
        };

        for row in &rows {
            if !is_supported_root(row) {
                continue;
            }
            match parse_root(&authority, row) {
                Some(provider) => providers.push(provider),
                None => debug!(authority = %authority, "Skipping root with missing columns"),
            }
        }
    }

    info!(count = providers.len(), "Document providers discovered");
    providers
}

fn query_roots_with_retry(
    backend: &dyn DocumentsBackend,
    authority: &str,
) -> std::result::Result<Vec<RootRow>, ProviderError> {
    match backend.query_roots(authority) {
        Err(ProviderError::DeadObject(reason)) => {
            warn!(authority, reason = %reason, "Provider died, retrying once");
            backend.query_roots(authority)
        }
        other => other,
    }
}

/// Whether a root can hold export archives.
#[must_use]
pub fn is_supported_root(row: &RootRow) -> bool {
    let flags = row.get(COLUMN_FLAGS).and_then(Value::as_i64).unwrap_or(0);
    if flags & FLAG_LOCAL_ONLY != 0 || flags & FLAG_SUPPORTS_CREATE == 0 {
        return false;
    }

    match row.get(COLUMN_MIME_TYPES).and_then(Value::as_str) {
        Some(mime_types) => mime_types
            .split('\n')
            .any(|m| m.trim().eq_ignore_ascii_case(ZIP_MIME_TYPE)),
        None => true,
    }
}

fn parse_root(authority: &str, row: &RootRow) -> Option<DocumentProvider> {
    let title = row.get(COLUMN_TITLE)?.as_str()?.to_string();
    let icon = row.get(COLUMN_ICON)?.as_i64()?;
    let root_id = row.get(COLUMN_ROOT_ID)?.as_str()?;
    let summary = row
        .get(COLUMN_SUMMARY)
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(DocumentProvider {
        title,
        summary,
        icon,
        root_uri: format!("content://{authority}/root/{root_id}"),
        authority: authority.to_string(),
    })
}

/// A provider entry in the JSON registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub authority: String,
    #[serde(default)]
    pub roots: Vec<RootRow>,
}

/// Documents backend read from a JSON registry file.
///
/// The file holds an array of `{ "authority": ..., "roots": [ {column: value} ] }`.
#[derive(Debug, Clone, Default)]
pub struct JsonDocumentsBackend {
    providers: Vec<ProviderEntry>,
}

impl JsonDocumentsBackend {
    /// Load the registry; a missing file means no providers.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let providers = serde_json::from_str(&content)?;
        Ok(Self { providers })
    }

    #[must_use]
    pub fn new(providers: Vec<ProviderEntry>) -> Self {
        Self { providers }
    }
}

impl DocumentsBackend for JsonDocumentsBackend {
    fn document_providers(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.authority.clone()).collect()
    }

    fn query_roots(&self, authority: &str) -> std::result::Result<Vec<RootRow>, ProviderError> {
        self.providers
            .iter()
            .find(|p| p.authority == authority)
            .map(|p| p.roots.clone())
            .ok_or_else(|| ProviderError::Query(format!("Unknown authority: {authority}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::HashMap;

    fn root(value: Value) -> RootRow {
        serde_json::from_value(value).unwrap()
    }

    fn cloud_root(id: &str) -> RootRow {
        root(json!({
            "root_id": id,
            "title": "Drive",
            "summary": "user@example.com",
            "icon": 7,
            "flags": FLAG_SUPPORTS_CREATE,
        }))
    }

    /// Backend whose providers fail a scripted number of times first.
    struct FlakyBackend {
        roots: Vec<(String, Vec<RootRow>)>,
        failures: Mutex<HashMap<String, usize>>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl FlakyBackend {
        fn new(roots: Vec<(&str, Vec<RootRow>)>, failures: &[(&str, usize)]) -> Self {
            Self {
                roots: roots.into_iter().map(|(a, r)| (a.to_string(), r)).collect(),
                failures: Mutex::new(failures.iter().map(|(a, n)| ((*a).to_string(), *n)).collect()),
                calls: Mutex::new(HashMap::new()),
            }
        }

        fn calls(&self, authority: &str) -> usize {
            self.calls.lock().get(authority).copied().unwrap_or(0)
        }
    }

    impl DocumentsBackend for FlakyBackend {
        fn document_providers(&self) -> Vec<String> {
            self.roots.iter().map(|(a, _)| a.clone()).collect()
        }

        fn query_roots(&self, authority: &str) -> std::result::Result<Vec<RootRow>, ProviderError> {
            *self.calls.lock().entry(authority.to_string()).or_default() += 1;
            let mut failures = self.failures.lock();
            if let Some(remaining) = failures.get_mut(authority) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(ProviderError::DeadObject(authority.to_string()));
                }
            }
            Ok(self
                .roots
                .iter()
                .find(|(a, _)| a == authority)
                .map(|(_, r)| r.clone())
                .unwrap_or_default())
        }
    }

    #[test]
    fn test_root_without_create_is_excluded() {
        let row = root(json!({"root_id": "r", "title": "T", "icon": 1, "flags": 0}));
        assert!(!is_supported_root(&row));
    }

    #[test]
    fn test_local_only_root_is_excluded() {
        let row = root(json!({
            "root_id": "r", "title": "T", "icon": 1,
            "flags": FLAG_SUPPORTS_CREATE | FLAG_LOCAL_ONLY,
        }));
        assert!(!is_supported_root(&row));
    }

    #[test]
    fn test_mime_allowlist() {
        let mut row = cloud_root("r");
        row.insert(COLUMN_MIME_TYPES.into(), json!("image/*\ntext/plain"));
        assert!(!is_supported_root(&row));

        row.insert(COLUMN_MIME_TYPES.into(), json!("image/*\nAPPLICATION/ZIP"));
        assert!(is_supported_root(&row));

        row.remove(COLUMN_MIME_TYPES);
        assert!(is_supported_root(&row));
    }

    #[test]
    fn test_query_builds_root_uri_and_skips_incomplete_rows() {
        let backend = JsonDocumentsBackend::new(vec![ProviderEntry {
            authority: "com.example.docs".into(),
            roots: vec![
                cloud_root("primary"),
                root(json!({"root_id": "no-title", "icon": 1, "flags": FLAG_SUPPORTS_CREATE})),
            ],
        }]);

        let providers = query_document_providers(&backend);
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].root_uri, "content://com.example.docs/root/primary");
        assert_eq!(providers[0].summary.as_deref(), Some("user@example.com"));
    }

    #[test]
    fn test_dead_provider_is_retried_once() {
        let backend = FlakyBackend::new(vec![("com.example.flaky", vec![cloud_root("a")])], &[(
            "com.example.flaky",
            1,
        )]);

        let providers = query_document_providers(&backend);
        assert_eq!(providers.len(), 1);
        assert_eq!(backend.calls("com.example.flaky"), 2);
    }

    #[test]
    fn test_persistently_dead_provider_does_not_hide_others() {
        let backend = FlakyBackend::new(
            vec![
                ("com.example.dead", vec![cloud_root("a")]),
                ("com.example.ok", vec![cloud_root("b")]),
            ],
            &[("com.example.dead", 5)],
        );

        let providers = query_document_providers(&backend);
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].authority, "com.example.ok");
        assert_eq!(backend.calls("com.example.dead"), 2);
    }
}
