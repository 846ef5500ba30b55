//! The secondary database an import merges from.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Result;
use crate::storage::HealthStorage;

/// A staged database owned by a single import.
///
/// The handle is not safe for concurrent cursor use, so every access goes
/// through [`StagedDatabase::read`] or [`StagedDatabase::write`], which
/// serialize on an internal lock.
#[derive(Debug)]
pub struct StagedDatabase {
    storage: Mutex<HealthStorage>,
    path: PathBuf,
}

impl StagedDatabase {
    /// Open a staged database file through the storage layer.
    ///
    /// Older schemas are migrated forward on open.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is newer than this
    /// build understands.
    pub fn open(path: &Path) -> Result<Self> {
        let storage = HealthStorage::open(path)?;
        Ok(Self::from_storage(storage))
    }

    /// Wrap an already open storage handle.
    #[must_use]
    pub fn from_storage(storage: HealthStorage) -> Self {
        let path = storage.path().to_path_buf();
        Self {
            storage: Mutex::new(storage),
            path,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a read against the staged database.
    pub fn read<T>(&self, f: impl FnOnce(&HealthStorage) -> T) -> T {
        let storage = self.storage.lock();
        f(&storage)
    }

    /// Run a write against the staged database.
    pub fn write<T>(&self, f: impl FnOnce(&mut HealthStorage) -> T) -> T {
        let mut storage = self.storage.lock();
        f(&mut storage)
    }
}
