//! Attachment upload policy and the [`UploadSink`] seam.
//!
//! The engine never touches files itself. It checks the declared MIME type
//! and size against policy, hands the payload to a sink, and keeps only the
//! returned [`StoredFileHandle`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default maximum attachment size (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Accepted attachment MIME types.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
];

/// Longest stem kept from the original file name when building a stored name.
const MAX_STEM_CHARS: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Unsupported file type '{mime_type}'. Allowed: PDF, JPG, PNG, WEBP")]
    UnsupportedType { mime_type: String },

    #[error("File of {size_bytes} bytes exceeds the {max_bytes} byte limit")]
    TooLarge { size_bytes: u64, max_bytes: u64 },

    /// The request body was cut off before the file could be measured.
    #[error("Request body too large; files are limited to {max_bytes} bytes")]
    BodyTooLarge { max_bytes: u64 },

    #[error("Failed to store upload: {0}")]
    StorageFailure(String),
}

/// An attachment as received from the caller.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub original_name: String,
    pub declared_mime_type: String,
    pub payload: Vec<u8>,
}

/// Where and what a sink stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFileHandle {
    pub stored_path: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
}

/// Persists attachment payloads.
#[async_trait]
pub trait UploadSink: Send + Sync {
    /// Validate against policy and store the payload.
    async fn store(
        &self,
        request: UploadRequest,
        max_size_bytes: u64,
    ) -> Result<StoredFileHandle, UploadError>;

    /// Remove a previously stored payload. Missing files are not an error.
    async fn remove(&self, stored_path: &str) -> Result<(), UploadError>;
}

/// Lowercase the MIME type and drop parameters such as `; charset=...`.
pub fn normalize_mime_type(declared: &str) -> String {
    declared
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Check the declared type and payload size against policy.
///
/// Type is checked before size, so an oversized file of a forbidden type
/// reports `UnsupportedType`.
pub fn check_upload_policy(
    declared_mime_type: &str,
    size_bytes: u64,
    max_size_bytes: u64,
) -> Result<String, UploadError> {
    let mime_type = normalize_mime_type(declared_mime_type);
    if !ALLOWED_MIME_TYPES.contains(&mime_type.as_str()) {
        return Err(UploadError::UnsupportedType {
            mime_type: declared_mime_type.to_string(),
        });
    }
    if size_bytes > max_size_bytes {
        return Err(UploadError::TooLarge {
            size_bytes,
            max_bytes: max_size_bytes,
        });
    }
    Ok(mime_type)
}

/// Build a stored file name from the original name and a unique token.
///
/// The stem is lowercased, whitespace becomes `_`, anything outside
/// `[a-z0-9_-]` is dropped and the result is capped at 50 characters.
/// The extension is kept (lowercased) when it is alphanumeric.
pub fn stored_file_name(original_name: &str, unique: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);

    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            (stem, Some(ext.to_ascii_lowercase()))
        }
        _ => (base, None),
    };

    let mut clean: String = stem
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c.to_ascii_lowercase() })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(MAX_STEM_CHARS)
        .collect();
    if clean.is_empty() {
        clean.push_str("document");
    }

    match ext {
        Some(ext) if !ext.is_empty() => format!("{clean}-{unique}.{ext}"),
        _ => format!("{clean}-{unique}"),
    }
}
