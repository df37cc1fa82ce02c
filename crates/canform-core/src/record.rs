//! The canonical extraction record and its assembler.
//!
//! The assembler is the single enforcement point of the "no silent field
//! loss" invariant: every canonical field the revision declares required
//! either appears in the record with a usable value or contributes a
//! `MissingRequiredField` error.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::alias::{AliasTable, FormKind};
use crate::coerce::Typed;
use crate::error::{FieldError, FieldErrorKind};
use crate::value::TypedValue;

/// One entry of a repeating form section, typed and canonical-keyed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupInstance {
    /// Repetition index in the source document.
    pub index: usize,
    pub fields: BTreeMap<String, TypedValue>,
}

impl GroupInstance {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            fields: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The final output of one extraction: typed scalar fields, ordered group
/// sequences, and every non-fatal issue encountered along the way.
///
/// A record is always produced when the document itself was readable and
/// its form supported; callers inspect [`errors`](Self::errors) to decide
/// acceptance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionRecord {
    pub form: FormKind,
    /// The alias-table revision the document was resolved against.
    pub revision: String,
    pub fields: BTreeMap<String, TypedValue>,
    pub groups: BTreeMap<String, Vec<GroupInstance>>,
    pub errors: Vec<FieldError>,
}

impl ExtractionRecord {
    /// Errors of a given kind, in occurrence order.
    pub fn errors_of_kind(&self, kind: FieldErrorKind) -> impl Iterator<Item = &FieldError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    /// Whether any required field never produced a usable value. Surfaced
    /// separately because callers typically reject on exactly this.
    pub fn has_missing_required(&self) -> bool {
        self.errors_of_kind(FieldErrorKind::MissingRequiredField)
            .next()
            .is_some()
    }
}

/// Merge the typed output into the final record, appending resolver-stage
/// errors first and sweeping declared-required scalar fields last.
///
/// A required field counts as missing when it never resolved, failed
/// coercion (and was therefore omitted), or normalized to `Absent` — the
/// slot existed but carried no data.
pub fn assemble(
    table: &AliasTable,
    mut prior_errors: Vec<FieldError>,
    typed: Typed,
) -> ExtractionRecord {
    let Typed {
        fields,
        groups,
        errors,
    } = typed;
    prior_errors.extend(errors);

    for rule in &table.rules {
        if !rule.required {
            continue;
        }
        let usable = fields.get(&rule.canonical).is_some_and(|v| !v.is_absent());
        if !usable {
            prior_errors.push(FieldError::new(
                rule.canonical.clone(),
                FieldErrorKind::MissingRequiredField,
                format!(
                    "required by {} revision {} but no usable value was extracted",
                    table.form, table.revision
                ),
            ));
        }
    }

    ExtractionRecord {
        form: table.form,
        revision: table.revision.clone(),
        fields,
        groups,
        errors: prior_errors,
    }
}
