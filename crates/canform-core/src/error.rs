//! Error types for form extraction.
//!
//! Two tiers, mirroring the split between conditions that abort a document
//! and conditions that do not: [`ExtractError`] is fatal for the document in
//! hand (no record is produced), while [`FieldError`]s accumulate in the
//! output record so a single bad field never discards the rest of a form.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Fatal extraction errors. No [`ExtractionRecord`](crate::ExtractionRecord)
/// is produced when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The bytes are not a parseable PDF, or the PDF carries no form-data
    /// container (neither XFA datasets nor AcroForm fields).
    #[error("unreadable document: {0}")]
    UnreadableDocument(String),

    /// The form type or revision could not be determined, or no alias table
    /// is registered for it.
    #[error("unsupported form: {0}")]
    UnsupportedForm(String),

    /// Invalid alias-table configuration (ambiguous patterns, dangling
    /// group references, unparsable JSON). Raised at load time, never while
    /// processing a document.
    #[error("alias table configuration error: {0}")]
    Config(String),
}

/// The kind of a non-fatal, per-field issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    /// A raw path matched no alias pattern for the selected revision.
    UnresolvedField,
    /// A repeated-entry instance is inconsistent (a declared-required member
    /// is missing). The partial instance is kept.
    MalformedGroup,
    /// The raw value could not be coerced to the declared kind; the value is
    /// omitted from the typed output.
    TypeMismatch,
    /// The typed value failed a declared validation rule (enum membership,
    /// cross-field check).
    ValidationFailure,
    /// A declared-required canonical field never resolved to a usable value.
    MissingRequiredField,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldErrorKind::UnresolvedField => "unresolved field",
            FieldErrorKind::MalformedGroup => "malformed group",
            FieldErrorKind::TypeMismatch => "type mismatch",
            FieldErrorKind::ValidationFailure => "validation failure",
            FieldErrorKind::MissingRequiredField => "missing required field",
        };
        f.write_str(s)
    }
}

/// A non-fatal, per-field issue collected into the extraction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// The canonical field identifier, or the raw path for unresolved
    /// fields, or the rule name for cross-field rule failures.
    pub field: String,
    pub kind: FieldErrorKind,
    /// Human-readable detail.
    pub detail: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, kind: FieldErrorKind, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.kind, self.detail)
    }
}
