//! canform-core: data model and pipeline algorithms for visa-form
//! extraction, independent of any PDF backend.
//!
//! The pipeline stages live here as pure functions over the data model:
//! [`resolve`](resolve::resolve) maps raw paths to canonical fields via the
//! declarative [`AliasTable`], [`expand`](group::expand) reassembles
//! repeated sections, [`coerce_document`](coerce::coerce_document) types and
//! validates values, and [`assemble`](record::assemble) produces the final
//! [`ExtractionRecord`]. Reading raw fields out of PDF bytes is the
//! `canform-parse` crate's job.

pub use chrono;

pub mod alias;
pub mod coerce;
pub mod error;
pub mod group;
pub mod path;
pub mod raw;
pub mod record;
pub mod resolve;
pub mod value;

pub use alias::{
    AliasRegistry, AliasRule, AliasTable, CrossCheck, CrossFieldRule, FormKind, GapPolicy,
    GroupSpec, PathPattern, RevisionMarker,
};
pub use error::{ExtractError, FieldError, FieldErrorKind};
pub use path::{FieldPath, PathSegment};
pub use raw::{RawField, RawFieldSet, RawValue};
pub use record::{ExtractionRecord, GroupInstance};
pub use value::{TypedValue, ValueKind};
