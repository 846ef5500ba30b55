//! Configuration management.
//!
//! This module resolves where the engine keeps its files and which optional
//! behaviours are switched on.
//!
//! # Layout
//!
//! Everything lives under one data root (default `~/.healthtransfer/`):
//! - **Database**: `data/healthconnect.db`, the primary health database
//! - **Per-user state**: `users/<user>/` for settings, staged databases,
//!   metrics and job registrations
//! - **Device inventory**: `installed_packages.json` and
//!   `document_providers.json`

mod packages;
mod settings;

pub use packages::InstalledPackages;
pub use settings::{
    ExportImportSettings, LastExport, LastExportError, LastImport, SettingsStore,
    SETTINGS_FILE_NAME,
};

use std::path::{Path, PathBuf};

use serde::Serialize;

pub const DATA_DIR_ENV: &str = "HTX_DATA_DIR";
pub const DB_ENV: &str = "HTX_DB";
pub const FAST_FOLLOW_ENV: &str = "HTX_FAST_FOLLOW";
pub const MERGE_PRIORITIES_ENV: &str = "HTX_MERGE_PRIORITIES";

pub const INSTALLED_PACKAGES_FILE_NAME: &str = "installed_packages.json";
pub const DOCUMENT_PROVIDERS_FILE_NAME: &str = "document_providers.json";

/// Get the default data root, `~/.healthtransfer/`.
#[must_use]
pub fn global_data_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".healthtransfer"))
}

/// Resolve the data root.
///
/// Priority:
/// 1. If `explicit_dir` is provided, use it directly
/// 2. `HTX_DATA_DIR` environment variable
/// 3. Global location: `~/.healthtransfer/`
#[must_use]
pub fn resolve_data_dir(explicit_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = explicit_dir {
        return Some(dir.to_path_buf());
    }

    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(dir));
        }
    }

    global_data_dir()
}

/// Resolve the primary database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `HTX_DB` environment variable
/// 3. `<data_root>/data/healthconnect.db`
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>, data_root: &Path) -> PathBuf {
    if let Some(path) = explicit_path {
        return path.to_path_buf();
    }

    if let Ok(db_path) = std::env::var(DB_ENV) {
        if !db_path.trim().is_empty() {
            return PathBuf::from(db_path);
        }
    }

    data_root.join("data").join("healthconnect.db")
}

/// Parse a boolean environment value: set and not empty, `0` or `false`.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0" && value.to_lowercase() != "false"
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name).map_or(default, |v| is_truthy(&v))
}

/// Optional behaviours of the transfer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureFlags {
    /// Notify about failed exports and about import progress and results.
    pub export_import_fast_follow: bool,
    /// Union category priority lists during merge.
    pub merge_priority_lists: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            export_import_fast_follow: true,
            merge_priority_lists: true,
        }
    }
}

impl FeatureFlags {
    /// Read flags from `HTX_FAST_FOLLOW` and `HTX_MERGE_PRIORITIES`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            export_import_fast_follow: env_flag(FAST_FOLLOW_ENV, defaults.export_import_fast_follow),
            merge_priority_lists: env_flag(MERGE_PRIORITIES_ENV, defaults.merge_priority_lists),
        }
    }
}
