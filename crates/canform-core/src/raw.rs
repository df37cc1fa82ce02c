//! Raw form fields, the layout-agnostic output of the reader stage.

use std::collections::BTreeMap;
use std::fmt;

use crate::path::FieldPath;

/// An untyped field value as stored in the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Free text from a text or choice field.
    Text(String),
    /// A checkbox/radio export token (a PDF name such as `Yes`, `Off`, `1`).
    Token(String),
}

impl RawValue {
    /// The underlying string, whatever the source representation.
    pub fn as_str(&self) -> &str {
        match self {
            RawValue::Text(s) | RawValue::Token(s) => s,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw (path, value) pair extracted from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub path: FieldPath,
    pub value: RawValue,
}

/// The flat set of raw fields extracted from one document.
///
/// Keys are unique; iteration is in path order, so downstream stages are
/// deterministic regardless of how the source document was traversed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFieldSet {
    fields: BTreeMap<FieldPath, RawValue>,
}

impl RawFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw field. The first value seen for a path wins; returns
    /// `false` when the path was already present and the value was dropped.
    pub fn insert(&mut self, path: FieldPath, value: RawValue) -> bool {
        match self.fields.entry(path) {
            std::collections::btree_map::Entry::Vacant(e) => {
                e.insert(value);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, path: &FieldPath) -> Option<&RawValue> {
        self.fields.get(path)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &RawValue)> {
        self.fields.iter()
    }
}

impl FromIterator<RawField> for RawFieldSet {
    fn from_iter<T: IntoIterator<Item = RawField>>(iter: T) -> Self {
        let mut set = RawFieldSet::new();
        for field in iter {
            set.insert(field.path, field.value);
        }
        set
    }
}
