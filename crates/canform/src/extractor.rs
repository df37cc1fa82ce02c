//! The extraction pipeline, end to end.

use std::path::Path;

use canform_core::{
    AliasRegistry, ExtractError, ExtractionRecord, FormKind, coerce::coerce_document,
    group::expand, record::assemble, resolve::resolve,
};
use canform_parse::{ReaderError, ReaderOptions, read_raw_fields};
use tracing::debug;

/// Stateless extraction engine: a validated alias-table registry plus the
/// pipeline that runs documents through it.
///
/// The registry is immutable after construction, so one `Extractor` can be
/// shared across threads and documents; per-document state lives entirely in
/// the pipeline's intermediate values.
#[derive(Debug, Clone)]
pub struct Extractor {
    registry: AliasRegistry,
}

impl Extractor {
    /// Build an extractor over an already-loaded registry.
    pub fn new(registry: AliasRegistry) -> Result<Self, ExtractError> {
        if registry.is_empty() {
            return Err(ExtractError::Config(
                "registry holds no alias tables".to_string(),
            ));
        }
        Ok(Self { registry })
    }

    /// Build an extractor over the builtin alias tables.
    pub fn builtin() -> Result<Self, ExtractError> {
        Self::new(crate::tables::builtin_registry()?)
    }

    pub fn registry(&self) -> &AliasRegistry {
        &self.registry
    }

    /// Run one document through the pipeline: read raw fields, detect the
    /// form kind, select the revision's alias table, then resolve, expand,
    /// coerce, and assemble.
    ///
    /// An `Err` means no record could be produced at all (unreadable bytes,
    /// unsupported form). Everything field-level lands in the returned
    /// record's error list instead.
    pub fn extract(
        &self,
        bytes: &[u8],
        hint: Option<FormKind>,
    ) -> Result<ExtractionRecord, ExtractError> {
        let options = ReaderOptions {
            skip_subtrees: self.registry.skip_subtrees(),
        };
        let raw = read_raw_fields(bytes, &options)?;
        let kind = self.registry.detect_form(&raw, hint)?;
        let table = self.registry.select_revision(kind, &raw)?;
        debug!(
            form = %kind,
            revision = %table.revision,
            raw_fields = raw.len(),
            "selected alias table"
        );

        let resolution = resolve(table, &raw);
        let expanded = expand(table, resolution.fields);
        let typed = coerce_document(table, expanded);
        let record = assemble(table, resolution.errors, typed);
        debug!(
            fields = record.fields.len(),
            groups = record.groups.len(),
            errors = record.errors.len(),
            "assembled extraction record"
        );
        Ok(record)
    }

    /// Read a PDF from disk and extract it.
    pub fn extract_file(
        &self,
        path: &Path,
        hint: Option<FormKind>,
    ) -> Result<ExtractionRecord, ExtractError> {
        let bytes = std::fs::read(path).map_err(ReaderError::from)?;
        self.extract(&bytes, hint)
    }
}
