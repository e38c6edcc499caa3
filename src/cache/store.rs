// Cache store for reading and writing files under the data directory.
// Handles pretty JSON serialization and atomic replacement via temp files.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;

use crate::error::Result;

/// Read JSON from a file, `None` if the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match read_text(path)? {
        Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
        None => Ok(None),
    }
}

/// Write data as pretty-printed JSON, replacing any existing file.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    write_text(path, &json)
}

/// Write raw text, replacing any existing file.
pub fn write_text(path: &Path, text: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    // Write atomically via a uniquely named temp file in the same directory
    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(text.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;

    Ok(())
}

/// Read raw text, `None` if the file does not exist.
pub fn read_text(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    Ok(Some(contents))
}

/// Check if a cache file exists.
pub fn exists(path: &Path) -> bool {
    path.is_file()
}

/// Delete a file if present.
pub fn delete(path: &Path) -> Result<()> {
    if path.is_file() {
        fs::remove_file(path)?;
    }
    Ok(())
}
