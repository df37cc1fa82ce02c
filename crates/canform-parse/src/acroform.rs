//! Flat AcroForm field extraction.
//!
//! Walks the catalog's `/AcroForm` → `/Fields` tree, joining hierarchical
//! partial names into dotted raw paths. Only fields carrying a `/V` value
//! land in the raw set; unfilled widgets contribute nothing (the pipeline's
//! required-field sweep reports what should have been there).

use canform_core::{FieldPath, RawFieldSet, RawValue};

use crate::error::ReaderError;

/// Circular-reference guard for the `/Kids` recursion.
const MAX_FIELD_DEPTH: usize = 64;

/// Extract every valued terminal form field from the document's AcroForm.
///
/// Returns an empty set (not an error) when the document has no AcroForm;
/// the caller decides whether that means "no form data".
pub fn extract_acroform_fields(doc: &lopdf::Document) -> Result<RawFieldSet, ReaderError> {
    let mut set = RawFieldSet::new();

    let Some(acroform) = acroform_dict(doc) else {
        return Ok(set);
    };
    let Some(fields_array) = resolve(doc, acroform.get(b"Fields").ok()).and_then(as_array) else {
        return Ok(set);
    };

    for entry in fields_array {
        if let lopdf::Object::Reference(id) = entry {
            walk_field_tree(doc, *id, &FieldPath::default(), 0, &mut set);
        }
    }
    Ok(set)
}

/// Locate the `/AcroForm` dictionary, following one level of indirection.
pub(crate) fn acroform_dict(doc: &lopdf::Document) -> Option<&lopdf::Dictionary> {
    let catalog = resolve(doc, doc.trailer.get(b"Root").ok())?.as_dict().ok()?;
    resolve(doc, catalog.get(b"AcroForm").ok())?.as_dict().ok()
}

pub(crate) fn resolve<'a>(
    doc: &'a lopdf::Document,
    obj: Option<&'a lopdf::Object>,
) -> Option<&'a lopdf::Object> {
    match obj? {
        lopdf::Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn as_array(obj: &lopdf::Object) -> Option<&[lopdf::Object]> {
    obj.as_array().ok().map(Vec::as_slice)
}

/// Recursively collect valued terminal fields, accumulating the dotted
/// hierarchical name. Intermediate nodes contribute their partial name;
/// `/Kids` holding only widget annotations (no `/T`) do not recurse.
fn walk_field_tree(
    doc: &lopdf::Document,
    field_id: lopdf::ObjectId,
    parent: &FieldPath,
    depth: usize,
    set: &mut RawFieldSet,
) {
    if depth >= MAX_FIELD_DEPTH {
        return;
    }
    let Ok(field_dict) = doc.get_object(field_id).and_then(|o| o.as_dict()) else {
        return;
    };

    let mut path = parent.clone();
    if let Some(partial) = partial_name(doc, field_dict) {
        append_partial_name(&mut path, &partial);
    }

    if let Some(kids) = resolve(doc, field_dict.get(b"Kids").ok()).and_then(as_array) {
        let has_child_fields = kids.iter().any(|kid| {
            resolve(doc, Some(kid))
                .and_then(|o| o.as_dict().ok())
                .is_some_and(|d| d.get(b"T").is_ok())
        });
        if has_child_fields {
            for kid in kids {
                if let lopdf::Object::Reference(kid_id) = kid {
                    walk_field_tree(doc, *kid_id, &path, depth + 1, set);
                }
            }
            return;
        }
        // Widget-only kids: fall through, this is a terminal field.
    }

    if path.is_empty() {
        return;
    }
    if let Some(value) = field_value(doc, field_dict) {
        set.insert(path, value);
    }
}

/// The `/T` partial name, decoded.
fn partial_name(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Option<String> {
    match resolve(doc, dict.get(b"T").ok())? {
        lopdf::Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

/// Append a partial name to the path, honoring AcroForm index suffixes
/// (`Chd[2]` splits into a name and a repetition-index segment). Partial
/// names that do not parse as path syntax are kept verbatim as one segment.
fn append_partial_name(path: &mut FieldPath, partial: &str) {
    match partial.parse::<FieldPath>() {
        Ok(parsed) => {
            for seg in parsed.segments() {
                match seg {
                    canform_core::PathSegment::Name(n) => path.push_name(n.clone()),
                    canform_core::PathSegment::Index(i) => path.push_index(*i),
                }
            }
        }
        Err(_) => path.push_name(partial),
    }
}

/// The `/V` value: literal strings become text, PDF names (checkbox and
/// radio export tokens) become tokens. Multi-select arrays join on `; `.
fn field_value(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Option<RawValue> {
    match resolve(doc, dict.get(b"V").ok())? {
        lopdf::Object::String(bytes, _) => Some(RawValue::Text(decode_pdf_string(bytes))),
        lopdf::Object::Name(name) => {
            Some(RawValue::Token(String::from_utf8_lossy(name).into_owned()))
        }
        lopdf::Object::Array(items) => {
            let vals: Vec<String> = items
                .iter()
                .filter_map(|item| match resolve(doc, Some(item))? {
                    lopdf::Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
                    lopdf::Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
                    _ => None,
                })
                .collect();
            if vals.is_empty() {
                None
            } else {
                Some(RawValue::Text(vals.join("; ")))
            }
        }
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16 BE with BOM, otherwise Latin-1-ish
/// bytes through lossy UTF-8.
pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}
