//! Single-entry zip archives.
//!
//! An export archive holds exactly one entry: the database file. On any
//! failure the partially written output is removed so no truncated archive
//! or database survives.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::transfer::types::CompressError;

/// Write `source` into a new zip at `destination` as the single entry
/// `entry_name`, replacing any existing file.
///
/// Returns the size of the archive in bytes.
///
/// # Errors
///
/// Returns an error if the source cannot be read or the archive cannot be
/// written. The destination is deleted in that case.
pub fn compress(source: &Path, entry_name: &str, destination: &Path) -> Result<u64, CompressError> {
    let result = write_archive(source, entry_name, destination);
    if result.is_err() {
        remove_partial(destination);
    }
    result
}

fn write_archive(source: &Path, entry_name: &str, destination: &Path) -> Result<u64, CompressError> {
    let mut input = File::open(source)?;
    let mut writer = ZipWriter::new(File::create(destination)?);
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .large_file(true);

    writer.start_file(entry_name, options)?;
    io::copy(&mut input, &mut writer)?;
    let file = writer.finish()?;
    file.sync_all()?;

    let size = file.metadata()?.len();
    debug!(entry = entry_name, size, "Archive written");
    Ok(size)
}

/// Stream an archive from `source`, writing the first entry named exactly
/// `entry_name` to `destination`.
///
/// Entries are scanned in archive order. The destination is only created
/// once the entry is found. Returns the number of bytes extracted.
///
/// # Errors
///
/// Returns [`CompressError::EntryNotFound`] if the stream ends without a
/// matching entry, or an I/O or zip error. The destination is deleted in
/// every failure case.
pub fn decompress<R: Read>(
    source: &mut R,
    entry_name: &str,
    destination: &Path,
) -> Result<u64, CompressError> {
    let result = extract_entry(source, entry_name, destination);
    if result.is_err() {
        remove_partial(destination);
    }
    result
}

fn extract_entry<R: Read>(
    source: &mut R,
    entry_name: &str,
    destination: &Path,
) -> Result<u64, CompressError> {
    while let Some(mut entry) = zip::read::read_zipfile_from_stream(source)? {
        if entry.name() != entry_name {
            continue;
        }

        let mut output = File::create(destination)?;
        let copied = io::copy(&mut entry, &mut output)?;
        output.sync_all()?;
        debug!(entry = entry_name, bytes = copied, "Archive entry extracted");
        return Ok(copied);
    }

    Err(CompressError::EntryNotFound(entry_name.to_string()))
}

fn remove_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
    }
}
