//! DOCX package error types

use thiserror::Error;

/// Errors raised while reading or writing a `.docx` package
#[derive(Debug, Error)]
pub enum DocxError {
    /// The bytes are not a readable ZIP container
    #[error("Invalid DOCX container: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A part could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A part is not well-formed XML
    #[error("XML error in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },

    /// A required part is missing from the package
    #[error("Missing part: {0}")]
    MissingPart(String),
}

impl DocxError {
    pub(crate) fn xml(part: &str, source: impl Into<quick_xml::Error>) -> Self {
        DocxError::Xml {
            part: part.to_string(),
            source: source.into(),
        }
    }
}

/// Result type alias for DOCX operations
pub type Result<T> = std::result::Result<T, DocxError>;
