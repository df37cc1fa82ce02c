//! PDF form-data reader for canform.
//!
//! This crate turns PDF bytes into a [`RawFieldSet`](canform_core::RawFieldSet):
//! dotted raw paths mapped to raw values, independent of which layout the
//! document uses. Two layouts are understood:
//!
//! - **XFA datasets** — the native layout of both supported form families;
//!   the filled values live in an XML packet inside the `/XFA` entry.
//! - **Flat AcroForm** — the fallback for flattened copies; hierarchical
//!   partial names are joined into the same dotted convention.
//!
//! The entry point is [`read_raw_fields`]. Everything downstream of the raw
//! field set (alias resolution, group expansion, typing) lives in
//! `canform-core` and the `canform` facade.

mod acroform;
mod error;
mod reader;
mod xfa;

pub use acroform::extract_acroform_fields;
pub use error::ReaderError;
pub use reader::{ReaderOptions, read_raw_fields};
pub use xfa::{XmlElement, extract_datasets_xml, flatten_datasets, parse_tree};
