//! Reader error type.

use canform_core::ExtractError;
use thiserror::Error;

/// Errors from the raw field reader.
///
/// Every variant is fatal for the document being read; it converts into
/// [`ExtractError::UnreadableDocument`] at the pipeline boundary.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// The bytes are not a parseable PDF.
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// I/O error reading PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The XFA datasets packet exists but its XML is malformed.
    #[error("XFA XML error: {0}")]
    Xml(String),

    /// The PDF opened fine but carries neither an XFA datasets packet nor
    /// AcroForm fields.
    #[error("document has no form-data container")]
    NoFormData,
}

impl From<ReaderError> for ExtractError {
    fn from(err: ReaderError) -> Self {
        ExtractError::UnreadableDocument(err.to_string())
    }
}
