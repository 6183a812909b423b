//! Mail merge types

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use super::error::MergeError;

// ============================================================================
// Constants
// ============================================================================

/// File name of the bulk download archive
pub const ARCHIVE_FILE_NAME: &str = "merged_documents.zip";

/// Content type used for document and archive downloads
pub const DOWNLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// Default URL prefix of preview image links
pub const DEFAULT_IMAGE_ROUTE: &str = "/mail-merge/image";

/// File name of the document at `index` (0-based), e.g. `Merged_Letter_1.docx`
pub fn document_file_name(index: usize) -> String {
    format!("Merged_Letter_{}.docx", index + 1)
}

// ============================================================================
// Row
// ============================================================================

/// One spreadsheet data row: column header -> cell text, in column order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value; an existing key is overwritten in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Fields in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// Opaque session identifier (UUID v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Allocate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier received from a client
    ///
    /// Anything that isn't a UUID can't name a session, so it's reported as
    /// not found rather than as a malformed request.
    pub fn parse(id: &str) -> Result<Self, MergeError> {
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|_| MergeError::SessionNotFound(id.to_string()))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Serialized `.docx` bytes of one merged document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    bytes: Vec<u8>,
}

impl GeneratedDocument {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// An image extracted during preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Position of the document the image was found in
    pub document_index: usize,
    /// MIME type guessed from the image part name
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A file handed back to the caller for download
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    /// Suggested file name
    pub file_name: String,
    pub content_type: &'static str,
    pub data: Vec<u8>,
}
