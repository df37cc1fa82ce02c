//! Field path resolution: raw paths to canonical fields.
//!
//! Works entirely against the selected revision's [`AliasTable`]; the
//! algorithm knows nothing about any specific form revision. Unmatched paths
//! are reported and skipped; they never abort the document.

use crate::alias::{AliasRule, AliasTable};
use crate::error::{FieldError, FieldErrorKind};
use crate::path::FieldPath;
use crate::raw::{RawFieldSet, RawValue};

/// One raw field resolved to its canonical rule.
#[derive(Debug, Clone)]
pub struct ResolvedField<'a> {
    pub rule: &'a AliasRule,
    pub raw_path: &'a FieldPath,
    pub value: &'a RawValue,
    /// Repetition index: captured by the pattern's `[*]` wildcard, or the
    /// rule's fixed slot for name-encoded rows. `None` for scalar fields.
    pub index: Option<usize>,
}

impl ResolvedField<'_> {
    pub fn canonical(&self) -> &str {
        &self.rule.canonical
    }
}

/// Output of the resolver stage.
#[derive(Debug, Default)]
pub struct Resolution<'a> {
    pub fields: Vec<ResolvedField<'a>>,
    pub errors: Vec<FieldError>,
}

/// Resolve every raw field against the table.
///
/// Emits exactly one `UnresolvedField` error per distinct unmatched path
/// (the raw set already deduplicates paths). The table's revision-marker
/// field, when declared, is recognized and silently consumed; it stamps the
/// document rather than carrying applicant data.
pub fn resolve<'a>(table: &'a AliasTable, raw: &'a RawFieldSet) -> Resolution<'a> {
    let mut resolution = Resolution::default();
    for (raw_path, value) in raw.iter() {
        let stripped = table.strip(raw_path);
        if let Some((rule, outcome)) = table.lookup(&stripped) {
            resolution.fields.push(ResolvedField {
                rule,
                raw_path,
                value,
                index: outcome.captured.or(rule.slot),
            });
            continue;
        }
        let is_marker = table
            .revision_marker
            .as_ref()
            .is_some_and(|m| m.path.match_path(&stripped).is_some());
        if is_marker {
            continue;
        }
        resolution.errors.push(FieldError::new(
            raw_path.to_string(),
            FieldErrorKind::UnresolvedField,
            format!(
                "no alias pattern in {} revision {} matches this path",
                table.form, table.revision
            ),
        ));
    }
    resolution
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::alias::{FormKind, GroupSpec, RevisionMarker};
    use crate::value::ValueKind;

    fn path(s: &str) -> FieldPath {
        s.parse().unwrap()
    }

    fn table() -> AliasTable {
        let json = r#"{
            "form": "imm5645e",
            "revision": "01-2023",
            "strip_prefixes": ["form1"],
            "rules": [
                { "pattern": "page1.SecA.Sps.SpsDOB", "canonical": "spouse_dob", "kind": "date" },
                {
                    "pattern": "page1.SecB.Chd.[*].ChdRel",
                    "canonical": "child_relationship",
                    "kind": "text",
                    "group": "children"
                }
            ],
            "groups": { "children": {} }
        }"#;
        let table: AliasTable = serde_json::from_str(json).unwrap();
        table.validate().unwrap();
        table
    }

    #[test]
    fn resolves_scalar_and_grouped_fields() {
        let table = table();
        let mut raw = RawFieldSet::new();
        raw.insert(
            path("form1.page1.SecA.Sps.SpsDOB"),
            RawValue::Text("1990-01-02".into()),
        );
        raw.insert(
            path("form1.page1.SecB.Chd.[2].ChdRel"),
            RawValue::Text("Daughter".into()),
        );

        let res = resolve(&table, &raw);
        assert!(res.errors.is_empty());
        assert_eq!(res.fields.len(), 2);

        let spouse = res
            .fields
            .iter()
            .find(|f| f.canonical() == "spouse_dob")
            .unwrap();
        assert_eq!(spouse.index, None);
        assert_eq!(spouse.rule.kind, ValueKind::Date);

        let child = res
            .fields
            .iter()
            .find(|f| f.canonical() == "child_relationship")
            .unwrap();
        assert_eq!(child.index, Some(2));
    }

    #[test]
    fn unmatched_path_yields_one_unresolved_error() {
        let table = table();
        let mut raw = RawFieldSet::new();
        raw.insert(path("form1.page1.Unknown.Field"), RawValue::Text("x".into()));

        let res = resolve(&table, &raw);
        assert!(res.fields.is_empty());
        assert_eq!(res.errors.len(), 1);
        assert_eq!(res.errors[0].kind, FieldErrorKind::UnresolvedField);
        assert_eq!(res.errors[0].field, "form1.page1.Unknown.Field");
    }

    #[test]
    fn fixed_slot_rule_supplies_index() {
        let json = r#"{
            "form": "imm5257e",
            "revision": "10-2023",
            "rules": [
                {
                    "pattern": "Page1.PrevCOR.Row2.Country",
                    "canonical": "prev_country",
                    "kind": "text",
                    "group": "previous_residences",
                    "slot": 0
                }
            ],
            "groups": { "previous_residences": {} }
        }"#;
        let table: AliasTable = serde_json::from_str(json).unwrap();
        table.validate().unwrap();

        let mut raw = RawFieldSet::new();
        raw.insert(
            path("Page1.PrevCOR.Row2.Country"),
            RawValue::Text("IRAN".into()),
        );
        let res = resolve(&table, &raw);
        assert_eq!(res.fields[0].index, Some(0));
    }

    #[test]
    fn revision_marker_path_is_consumed_silently() {
        let mut table = table();
        table.revision_marker = Some(RevisionMarker {
            path: "page1.FormVersion".parse().unwrap(),
            value: None,
        });
        // Group map untouched; marker is not a rule.
        assert_eq!(table.groups, {
            let mut m = BTreeMap::new();
            m.insert("children".to_string(), GroupSpec::default());
            m
        });

        let mut raw = RawFieldSet::new();
        raw.insert(path("form1.page1.FormVersion"), RawValue::Text("01-2023".into()));
        let res = resolve(&table, &raw);
        assert!(res.fields.is_empty());
        assert!(res.errors.is_empty());
        assert_eq!(table.form, FormKind::Imm5645e);
    }
}
