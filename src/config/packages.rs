//! Packages installed on this device.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::storage::PackageInventory;

/// Package name to display label, as installed on this device.
///
/// Loaded from a JSON object `{ "com.example.app": "Example" }`.
#[derive(Debug, Clone, Default)]
pub struct InstalledPackages {
    labels: BTreeMap<String, String>,
}

impl InstalledPackages {
    /// Load the inventory; a missing file means nothing is installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let labels = serde_json::from_str(&content)?;
        Ok(Self { labels })
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            labels: pairs
                .into_iter()
                .map(|(package, label)| (package.to_string(), label.to_string()))
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl PackageInventory for InstalledPackages {
    fn is_installed(&self, package: &str) -> bool {
        self.labels.contains_key(package)
    }

    fn application_label(&self, package: &str) -> Option<String> {
        self.labels.get(package).cloned()
    }
}
