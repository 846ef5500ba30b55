//! Durable file writes.
//!
//! - Atomic writes: write to temp file, sync to disk, then rename
//! - JSONL appending with fsync for durability

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

/// Write content to a file atomically.
///
/// The content goes to a sibling `.tmp` file which is synced and then
/// renamed over the target. If any step fails the original file (if any)
/// remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = Path::new(&temp_name);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    {
        let file = File::create(temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(temp_path, path)
}

/// Append one value as a JSON line, syncing after the write.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub fn append_jsonl<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let line = serde_json::to_string(value).map_err(io::Error::other)?;
    writeln!(file, "{line}")?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/settings.json");

        atomic_write(&path, "{\"a\":1}").unwrap();
        atomic_write(&path, "{\"a\":2}").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":2}");
        assert!(!temp_dir.path().join("nested/settings.json.tmp").exists());
    }

    #[test]
    fn test_append_jsonl_adds_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("metrics.jsonl");

        append_jsonl(&path, &serde_json::json!({"n": 1})).unwrap();
        append_jsonl(&path, &serde_json::json!({"n": 2})).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
