//! The raw field reader: PDF bytes in, layout-agnostic raw fields out.

use canform_core::RawFieldSet;
use tracing::debug;

use crate::acroform::extract_acroform_fields;
use crate::error::ReaderError;
use crate::xfa::{extract_datasets_xml, flatten_datasets, parse_tree};

/// Reader configuration.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// XFA element subtrees to skip wholesale. The default covers the
    /// list-of-values file the 5257E embeds next to its data.
    pub skip_subtrees: Vec<String>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            skip_subtrees: vec!["LOVFile".to_string()],
        }
    }
}

/// Open a PDF and extract its raw form fields.
///
/// XFA datasets are checked first (both supported form families are XFA
/// forms); flat AcroForm fields are the fallback for flattened copies. A
/// document with neither is unreadable for this engine's purposes. The
/// parsed document is dropped on every exit path; nothing is cached.
pub fn read_raw_fields(bytes: &[u8], options: &ReaderOptions) -> Result<RawFieldSet, ReaderError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| ReaderError::Parse(e.to_string()))?;

    if let Some(xml) = extract_datasets_xml(&doc)? {
        let tree = parse_tree(&xml)?;
        let set = flatten_datasets(&tree, &options.skip_subtrees);
        if !set.is_empty() {
            debug!(fields = set.len(), layout = "xfa", "extracted raw fields");
            return Ok(set);
        }
    }

    let set = extract_acroform_fields(&doc)?;
    if set.is_empty() {
        return Err(ReaderError::NoFormData);
    }
    debug!(fields = set.len(), layout = "acroform", "extracted raw fields");
    Ok(set)
}
