//! Typed values and declared value kinds.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The value kind an alias rule declares for its canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Bool,
    Date,
    /// Token restricted to the rule's allowed set.
    Enum,
    Integer,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Text => "text",
            ValueKind::Bool => "bool",
            ValueKind::Date => "date",
            ValueKind::Enum => "enum",
            ValueKind::Integer => "integer",
        };
        f.write_str(s)
    }
}

/// A coerced, validated field value.
///
/// `Absent` is the explicit "present but empty" marker: the form slot
/// resolved, but its content was blank or an N/A-equivalent token. It is
/// never conflated with a zero-length text value, which coercion normalizes
/// away entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Absent,
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    /// The canonical-cased member of the field's allowed set.
    Enum(String),
    Integer(i64),
}

impl TypedValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, TypedValue::Absent)
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Absent => f.write_str("<absent>"),
            TypedValue::Text(s) => f.write_str(s),
            TypedValue::Bool(b) => write!(f, "{b}"),
            TypedValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            TypedValue::Enum(s) => f.write_str(s),
            TypedValue::Integer(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for TypedValue {
    /// JSON: `Absent` → null, dates → ISO `YYYY-MM-DD` strings, the rest
    /// map to their native JSON types.
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypedValue::Absent => serializer.serialize_none(),
            TypedValue::Text(s) | TypedValue::Enum(s) => serializer.serialize_str(s),
            TypedValue::Bool(b) => serializer.serialize_bool(*b),
            TypedValue::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
            TypedValue::Integer(n) => serializer.serialize_i64(*n),
        }
    }
}
