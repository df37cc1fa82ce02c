//! Raw field paths.
//!
//! Both form-data layouts (flat AcroForm names and flattened XFA XML trees)
//! are normalized into dotted [`FieldPath`]s such as
//! `Page1.PersonalDetails.Name.FamilyName` or, for repeated sections,
//! `page1.SecB.Chd.[2].ChdDOB` where `[2]` is the repetition index.

use std::fmt;
use std::str::FromStr;

/// One segment of a raw field path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// A named element or field-dictionary partial name.
    Name(String),
    /// A repetition index distinguishing repeated sibling entries.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Name(name) => write!(f, "{name}"),
            PathSegment::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// An ordered sequence of path segments identifying one raw field.
///
/// Paths are totally ordered (derived `Ord`) so field sets iterate
/// deterministically regardless of source-document traversal order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Build a path from segments.
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// The path's segments in order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a name segment.
    pub fn push_name(&mut self, name: impl Into<String>) {
        self.segments.push(PathSegment::Name(name.into()));
    }

    /// Append a repetition-index segment.
    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    /// Return the sub-path that follows the first segment named `name`,
    /// or `None` if no segment carries that name.
    ///
    /// Used to strip version-specific wrapper prefixes (e.g. everything up
    /// to and including `form1`) before alias matching.
    pub fn after_name(&self, name: &str) -> Option<FieldPath> {
        let pos = self
            .segments
            .iter()
            .position(|s| matches!(s, PathSegment::Name(n) if n == name))?;
        Some(FieldPath::new(self.segments[pos + 1..].to_vec()))
    }

    /// Whether the dotted rendering of this path contains `needle`.
    ///
    /// Form-type detection markers are plain substrings of the rendered path.
    pub fn contains_str(&self, needle: &str) -> bool {
        self.to_string().contains(needle)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = InvalidPath;

    /// Parse a dotted path. A segment of the form `[n]` becomes an index
    /// segment; a trailing `[n]` on a name (AcroForm style `Chd[2]`) splits
    /// into a name segment followed by an index segment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        for part in s.split('.') {
            if part.is_empty() {
                return Err(InvalidPath(s.to_string()));
            }
            if let Some(inner) = part.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
                let idx: usize = inner.parse().map_err(|_| InvalidPath(s.to_string()))?;
                segments.push(PathSegment::Index(idx));
            } else if let Some(open) = part.find('[') {
                if !part.ends_with(']') {
                    return Err(InvalidPath(s.to_string()));
                }
                let name = &part[..open];
                let idx: usize = part[open + 1..part.len() - 1]
                    .parse()
                    .map_err(|_| InvalidPath(s.to_string()))?;
                if name.is_empty() {
                    return Err(InvalidPath(s.to_string()));
                }
                segments.push(PathSegment::Name(name.to_string()));
                segments.push(PathSegment::Index(idx));
            } else {
                segments.push(PathSegment::Name(part.to_string()));
            }
        }
        if segments.is_empty() {
            return Err(InvalidPath(s.to_string()));
        }
        Ok(FieldPath::new(segments))
    }
}

/// A path string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid field path: {0:?}")]
pub struct InvalidPath(pub String);

impl serde::Serialize for FieldPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for FieldPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> FieldPath {
        s.parse().expect("test path should parse")
    }

    #[test]
    fn parse_plain_dotted_path() {
        let p = path("Page1.PersonalDetails.Name.FamilyName");
        assert_eq!(p.segments().len(), 4);
        assert_eq!(p.to_string(), "Page1.PersonalDetails.Name.FamilyName");
    }

    #[test]
    fn parse_bracket_segment_as_index() {
        let p = path("page1.SecB.Chd.[2].ChdDOB");
        assert_eq!(p.segments()[3], PathSegment::Index(2));
        assert_eq!(p.to_string(), "page1.SecB.Chd.[2].ChdDOB");
    }

    #[test]
    fn parse_acroform_style_suffix_index() {
        let p = path("Chd[2].ChdDOB");
        assert_eq!(
            p.segments(),
            &[
                PathSegment::Name("Chd".to_string()),
                PathSegment::Index(2),
                PathSegment::Name("ChdDOB".to_string()),
            ]
        );
    }

    #[test]
    fn parse_rejects_empty_and_malformed() {
        assert!("".parse::<FieldPath>().is_err());
        assert!("a..b".parse::<FieldPath>().is_err());
        assert!("a.[x]".parse::<FieldPath>().is_err());
        assert!("a.b[".parse::<FieldPath>().is_err());
    }

    #[test]
    fn after_name_strips_wrapper_prefix() {
        let p = path("form1.Page1.PersonalDetails.ServiceIn");
        let stripped = p.after_name("form1").unwrap();
        assert_eq!(stripped.to_string(), "Page1.PersonalDetails.ServiceIn");
        assert!(p.after_name("form2").is_none());
    }

    #[test]
    fn ordering_sorts_indices_numerically() {
        let a = path("SecB.Chd.[2].ChdDOB");
        let b = path("SecB.Chd.[10].ChdDOB");
        assert!(a < b);
    }

    #[test]
    fn contains_str_sees_rendered_form() {
        let p = path("form1.Page1.FormVersion");
        assert!(p.contains_str("FormVersion"));
        assert!(!p.contains_str("IMM5645"));
    }

    #[test]
    fn serde_round_trip_as_string() {
        let p = path("p1.SecA.Sps.SpsDOB");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"p1.SecA.Sps.SpsDOB\"");
        let back: FieldPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
