//! Attachment metadata derived from a file the user picked.
//!
//! Only metadata lives here. The bytes stay with the file source and are
//! handed to the transport separately.

use serde::{Deserialize, Serialize};

use super::error::{Result, SessionError};

/// Units used by [`human_size`], smallest first.
const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// MIME types classified as documents.
const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/vnd.oasis.opendocument.text",
    "application/rtf",
    "text/plain",
    "text/csv",
    "text/markdown",
];

/// Broad kind of an attachment, used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MimeCategory {
    Image,
    Video,
    Audio,
    Document,
    Other,
}

impl MimeCategory {
    /// Classify a MIME type by prefix (case-insensitive, parameters ignored).
    pub fn classify(mime_type: &str) -> Self {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence.starts_with("image/") {
            MimeCategory::Image
        } else if essence.starts_with("video/") {
            MimeCategory::Video
        } else if essence.starts_with("audio/") {
            MimeCategory::Audio
        } else if DOCUMENT_MIME_TYPES.contains(&essence.as_str()) {
            MimeCategory::Document
        } else {
            MimeCategory::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MimeCategory::Image => "image",
            MimeCategory::Video => "video",
            MimeCategory::Audio => "audio",
            MimeCategory::Document => "document",
            MimeCategory::Other => "file",
        }
    }
}

/// Read-only view of a shared file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentDescriptor {
    pub file_name: String,
    pub byte_size: u64,
    pub human_size: String,
    pub mime_type: String,
    pub mime_category: MimeCategory,
}

impl AttachmentDescriptor {
    /// Derive the descriptor for a file. Fails only on a negative size.
    pub fn describe(file_name: &str, byte_size: i64, mime_type: &str) -> Result<Self> {
        let byte_size =
            u64::try_from(byte_size).map_err(|_| SessionError::InvalidSize(byte_size))?;

        Ok(Self {
            file_name: file_name.to_string(),
            byte_size,
            human_size: human_size(byte_size),
            mime_type: mime_type.to_string(),
            mime_category: MimeCategory::classify(mime_type),
        })
    }
}

/// Format a byte count as `"<value> <unit>"` with at most two decimals.
///
/// `0 -> "0 Bytes"`, `1536 -> "1.5 KB"`, `1572864 -> "1.5 MB"`. Sizes past
/// the largest unit stay in GB.
pub fn human_size(bytes: u64) -> String {
    let mut unit = 0;
    let mut scale: u64 = 1;
    while unit + 1 < SIZE_UNITS.len() && bytes / scale >= 1024 {
        scale *= 1024;
        unit += 1;
    }

    if unit == 0 {
        return format!("{} {}", bytes, SIZE_UNITS[0]);
    }

    let value = bytes as f64 / scale as f64;
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}
