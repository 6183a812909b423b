//! Mail merge error types

use thiserror::Error;

use crate::docx::DocxError;

/// Errors raised by the merge engine and the session store
#[derive(Debug, Error)]
pub enum MergeError {
    /// The spreadsheet could not be read
    #[error("Invalid spreadsheet: {0}")]
    InvalidTable(String),

    /// The Word template could not be read
    #[error("Invalid template: {0}")]
    InvalidTemplate(#[source] DocxError),

    /// Generating the document for one row failed; the merge is aborted
    #[error("Failed to generate document for row {row}: {source}")]
    RowFailed {
        /// 1-based data row number
        row: usize,
        #[source]
        source: DocxError,
    },

    /// No session with this id (never created, consumed, or expired)
    #[error("No documents found for session: {0}")]
    SessionNotFound(String),

    #[error("No document found for session: {session_id}, index: {index} ({count} documents)")]
    IndexOutOfRange {
        session_id: String,
        index: i64,
        count: usize,
    },

    #[error("Image {image_id} not found for session: {session_id}, document: {document_index}")]
    ImageNotFound {
        session_id: String,
        document_index: usize,
        image_id: String,
    },

    /// Rendering one document's preview failed
    #[error("Failed to render document {index}: {reason}")]
    Render { index: usize, reason: String },

    /// Building the download archive failed
    #[error("Failed to build archive: {0}")]
    Archive(String),
}

impl MergeError {
    /// True for errors caused by unreadable input files
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidTable(_) | Self::InvalidTemplate(_) | Self::RowFailed { .. }
        )
    }

    /// True for lookups of sessions, documents or images that don't exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SessionNotFound(_) | Self::IndexOutOfRange { .. } | Self::ImageNotFound { .. }
        )
    }
}

/// Result type alias for merge operations
pub type Result<T> = std::result::Result<T, MergeError>;
