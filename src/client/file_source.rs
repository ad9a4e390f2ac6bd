//! File source - metadata for a local file picked for sharing
//!
//! Only the file system metadata is read. The bytes are left for the
//! transport to stream.

use anyhow::{anyhow, Context, Result};
use std::path::Path;

/// What the file picker reports about a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub file_name: String,
    pub byte_size: i64,
    pub mime_type: String,
}

/// Inspect a local file without reading its contents
pub fn probe(path: &Path) -> Result<PickedFile> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Cannot access {}", path.display()))?;
    if !metadata.is_file() {
        return Err(anyhow!("{} is not a regular file", path.display()));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} has no file name", path.display()))?;

    Ok(PickedFile {
        mime_type: mime_type_for(path),
        byte_size: i64::try_from(metadata.len()).unwrap_or(i64::MAX),
        file_name,
    })
}

/// Guess a MIME type from the file extension, falling back to
/// `application/octet-stream`
pub fn mime_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}
