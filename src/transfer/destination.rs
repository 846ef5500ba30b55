//! Opaque document URIs.
//!
//! Exports are written and imports read through [`ContentResolver`], never
//! through a POSIX path the caller picked. [`FileContentResolver`] backs the
//! trait with the local file system for `file://` URIs and bare paths.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use crate::transfer::types::{TransferError, TransferResult};

/// Opens streams for document URIs.
pub trait ContentResolver: Send + Sync {
    /// Open a stream that replaces the document's content.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::FileNotFound`] if the document is gone or
    /// access to it was revoked.
    fn open_output(&self, uri: &str) -> TransferResult<Box<dyn Write + Send>>;

    /// Open a stream over the document's content.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::FileNotFound`] if the document cannot be opened.
    fn open_input(&self, uri: &str) -> TransferResult<Box<dyn Read + Send>>;
}

/// Resolver for `file://` URIs and plain paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileContentResolver;

impl FileContentResolver {
    fn path_for(uri: &str) -> TransferResult<PathBuf> {
        if let Some(path) = uri.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if uri.contains("://") {
            return Err(TransferError::UnsupportedUri(uri.to_string()));
        }
        Ok(PathBuf::from(uri))
    }
}

/// Map "gone" and "revoked" conditions to [`TransferError::FileNotFound`].
fn classify_open_error(uri: &str, err: io::Error) -> TransferError {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            TransferError::FileNotFound(uri.to_string())
        }
        _ => TransferError::Io(err),
    }
}

impl ContentResolver for FileContentResolver {
    fn open_output(&self, uri: &str) -> TransferResult<Box<dyn Write + Send>> {
        let path = Self::path_for(uri)?;
        let file = File::create(&path).map_err(|e| classify_open_error(uri, e))?;
        Ok(Box::new(file))
    }

    fn open_input(&self, uri: &str) -> TransferResult<Box<dyn Read + Send>> {
        let path = Self::path_for(uri)?;
        let file = File::open(&path).map_err(|e| classify_open_error(uri, e))?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_uri_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("export.zip");
        let uri = format!("file://{}", path.display());

        let resolver = FileContentResolver;
        resolver.open_output(&uri).unwrap().write_all(b"zip").unwrap();

        let mut content = Vec::new();
        resolver.open_input(&uri).unwrap().read_to_end(&mut content).unwrap();
        assert_eq!(content, b"zip");
    }

    #[test]
    fn test_missing_parent_is_lost_file_access() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("revoked/export.zip");

        let result = FileContentResolver.open_output(&path.display().to_string());
        assert!(matches!(result, Err(TransferError::FileNotFound(_))));
    }

    #[test]
    fn test_foreign_scheme_is_rejected() {
        let result = FileContentResolver.open_input("content://com.example.docs/root/1");
        assert!(matches!(result, Err(TransferError::UnsupportedUri(_))));
    }
}
