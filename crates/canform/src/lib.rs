//! canform: canonical field extraction from Canadian visa-application PDF
//! forms (IMM 5257E and IMM 5645E).
//!
//! A filled form names its fields differently across layouts and revisions;
//! downstream consumers want one stable schema. The pipeline gets there in
//! five stages, each a pure function over the previous stage's output:
//!
//! 1. **Read** — `canform-parse` turns PDF bytes into a flat set of raw
//!    (path, value) pairs, from either the XFA datasets packet or flat
//!    AcroForm fields.
//! 2. **Resolve** — the selected revision's alias table maps raw paths to
//!    canonical field identifiers.
//! 3. **Expand** — repeated sections (family members, previous residences)
//!    are reassembled into ordered group entries.
//! 4. **Coerce** — raw strings become typed values per the declared kind;
//!    failures are collected, never fatal.
//! 5. **Assemble** — the [`ExtractionRecord`], with every field-level issue
//!    in its error list.
//!
//! # Example
//!
//! ```no_run
//! use canform::Extractor;
//!
//! # fn main() -> Result<(), canform::ExtractError> {
//! let extractor = Extractor::builtin()?;
//! let bytes = std::fs::read("application.pdf").map_err(canform::ReaderError::from)?;
//! let record = extractor.extract(&bytes, None)?;
//! println!("{} fields, {} errors", record.fields.len(), record.errors.len());
//! # Ok(())
//! # }
//! ```

mod extractor;
pub mod tables;

pub use canform_core;
pub use canform_parse;

pub use canform_core::{
    AliasRegistry, AliasRule, AliasTable, ExtractError, ExtractionRecord, FieldError,
    FieldErrorKind, FormKind, GroupInstance, TypedValue, ValueKind,
};
pub use canform_parse::{ReaderError, ReaderOptions, read_raw_fields};
pub use extractor::Extractor;
