//! Per-user, per-purpose locations for staged database files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Suffixes SQLite may create next to a database file.
const SIDECAR_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

/// Directory holding the private data of one user.
#[must_use]
pub fn user_dir(data_root: &Path, user: u32) -> PathBuf {
    data_root.join("users").join(user.to_string())
}

/// A directory scoped to one purpose (export, import) and one user.
///
/// Constructed per operation; two users never share a directory.
#[derive(Debug, Clone)]
pub struct DatabaseContext {
    dir: PathBuf,
}

impl DatabaseContext {
    /// Resolve the directory, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(data_root: &Path, purpose: &str, user: u32) -> io::Result<Self> {
        let dir = user_dir(data_root, user).join(purpose);
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a named file inside the directory.
    #[must_use]
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

/// Delete a database file together with its journal sidecars.
///
/// Missing files are not an error.
///
/// # Errors
///
/// Returns the first error other than "not found".
pub fn delete_database_files(path: &Path) -> io::Result<()> {
    remove_if_exists(path)?;
    for suffix in SIDECAR_SUFFIXES {
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(suffix);
        remove_if_exists(Path::new(&sidecar))?;
    }
    Ok(())
}

/// Delete a file, treating "not found" as success.
///
/// # Errors
///
/// Returns any other I/O error.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Deleted");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
