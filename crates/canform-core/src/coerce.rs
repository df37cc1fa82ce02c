//! Type coercion and field-local validation.
//!
//! Converts raw string/token values into [`TypedValue`]s per the declared
//! kind. Every failure is collected as a [`FieldError`]; nothing here ever
//! propagates an error out of the pipeline, so a document is always fully
//! processed.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::alias::{AliasRule, AliasTable, CrossCheck};
use crate::error::{FieldError, FieldErrorKind};
use crate::group::Expanded;
use crate::raw::RawValue;
use crate::record::GroupInstance;
use crate::value::{TypedValue, ValueKind};

/// Accepted source date formats, tried in order; the forms are not
/// consistent about date spelling across revisions. First parse wins.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%m/%d/%Y", "%Y/%m/%d", "%b %d, %Y"];

/// Tokens normalized to the explicit `Absent` value (compared
/// case-insensitively after trimming).
const ABSENT_TOKENS: &[&str] = &["", "N/A", "NA", "NONE", "-", "--"];

/// Checkbox/radio on-tokens seen across the two form families.
const TRUE_TOKENS: &[&str] = &["Y", "YES", "1", "ON", "TRUE", "CHECKED"];
const FALSE_TOKENS: &[&str] = &["N", "NO", "0", "OFF", "FALSE", "UNCHECKED"];

/// Output of the coercion stage: typed scalars, typed group instances, and
/// the accumulated field errors.
#[derive(Debug, Default)]
pub struct Typed {
    pub fields: BTreeMap<String, TypedValue>,
    pub groups: BTreeMap<String, Vec<GroupInstance>>,
    pub errors: Vec<FieldError>,
}

fn is_absent_token(trimmed: &str) -> bool {
    ABSENT_TOKENS
        .iter()
        .any(|t| trimmed.eq_ignore_ascii_case(t))
}

/// Coerce one raw value to the rule's declared kind.
///
/// A blank or N/A-equivalent token is `Absent` for every kind: an empty
/// form slot is absence of data, not a malformed value.
pub fn coerce_value(
    rule: &AliasRule,
    value: &RawValue,
) -> Result<TypedValue, (FieldErrorKind, String)> {
    let trimmed = value.as_str().trim();
    if is_absent_token(trimmed) {
        return Ok(TypedValue::Absent);
    }
    match rule.kind {
        ValueKind::Text => Ok(TypedValue::Text(trimmed.to_string())),
        ValueKind::Bool => {
            if TRUE_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t)) {
                Ok(TypedValue::Bool(true))
            } else if FALSE_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t)) {
                Ok(TypedValue::Bool(false))
            } else {
                Err((
                    FieldErrorKind::TypeMismatch,
                    format!("unrecognized boolean token {trimmed:?}"),
                ))
            }
        }
        ValueKind::Date => DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
            .map(TypedValue::Date)
            .ok_or_else(|| {
                (
                    FieldErrorKind::TypeMismatch,
                    format!("{trimmed:?} matches none of the accepted date formats"),
                )
            }),
        ValueKind::Enum => rule
            .allowed
            .iter()
            .find(|member| member.eq_ignore_ascii_case(trimmed))
            .map(|member| TypedValue::Enum(member.clone()))
            .ok_or_else(|| {
                (
                    FieldErrorKind::ValidationFailure,
                    format!(
                        "{trimmed:?} is not in the allowed set [{}]",
                        rule.allowed.join(", ")
                    ),
                )
            }),
        ValueKind::Integer => trimmed
            .parse::<i64>()
            .map(TypedValue::Integer)
            .map_err(|_| {
                (
                    FieldErrorKind::TypeMismatch,
                    format!("{trimmed:?} is not an integer"),
                )
            }),
    }
}

/// Coerce the expanded document: scalars, then group slots, then the
/// table's declared cross-field rules.
///
/// Failed values are omitted from the typed output (never left malformed);
/// the corresponding error carries the canonical field id.
pub fn coerce_document(table: &AliasTable, expanded: Expanded<'_>) -> Typed {
    let mut typed = Typed {
        errors: expanded.errors,
        ..Typed::default()
    };

    for field in &expanded.scalars {
        match coerce_value(field.rule, field.value) {
            Ok(value) => {
                typed.fields.insert(field.canonical().to_string(), value);
            }
            Err((kind, detail)) => {
                typed
                    .errors
                    .push(FieldError::new(field.canonical(), kind, detail));
            }
        }
    }

    for (name, slots) in &expanded.groups {
        let mut instances = Vec::with_capacity(slots.len());
        for slot in slots {
            let mut instance = GroupInstance::new(slot.index);
            for member in &slot.members {
                match coerce_value(member.rule, member.value) {
                    Ok(value) => {
                        instance.fields.insert(member.canonical().to_string(), value);
                    }
                    Err((kind, detail)) => {
                        typed.errors.push(FieldError::new(
                            member.canonical(),
                            kind,
                            format!("{detail} (group {name:?}, entry index {})", slot.index),
                        ));
                    }
                }
            }
            instances.push(instance);
        }
        typed.groups.insert(name.clone(), instances);
    }

    check_cross_field_rules(table, &mut typed);
    typed
}

/// Evaluate declared cross-field rules over the typed scalar map. Runs only
/// after all fields are typed; a failure is attributed to the rule, and the
/// participating values stay in the record.
fn check_cross_field_rules(table: &AliasTable, typed: &mut Typed) {
    for rule in &table.cross_field_rules {
        let CrossCheck::DateOrder { from, to } = &rule.check;
        let (Some(TypedValue::Date(from_date)), Some(TypedValue::Date(to_date))) =
            (typed.fields.get(from), typed.fields.get(to))
        else {
            // One side missing, absent, or failed coercion: nothing to
            // compare, and that condition is already reported elsewhere.
            continue;
        };
        if from_date > to_date {
            typed.errors.push(FieldError::new(
                rule.name.clone(),
                FieldErrorKind::ValidationFailure,
                format!("{from} ({from_date}) is later than {to} ({to_date})"),
            ));
        }
    }
}
