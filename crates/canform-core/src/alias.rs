//! Alias tables: declarative, per-revision mappings from raw field paths to
//! canonical field identifiers.
//!
//! A raw path such as `Page1.PersonalDetails.Name.FamilyName` varies across
//! form revisions; the canonical identifier (`family_name`) does not. Each
//! [`AliasTable`] covers one (form kind, revision) pair and is plain data:
//! adding a new revision means adding a table, never touching pipeline code.
//! Tables are validated once at load time and are read-only afterwards, so a
//! registry can be shared freely across concurrent extractions.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::path::{FieldPath, PathSegment};
use crate::raw::RawFieldSet;
use crate::value::ValueKind;

/// The supported form families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    /// IMM 5257E — application for a temporary resident visa.
    Imm5257e,
    /// IMM 5645E — family information.
    Imm5645e,
}

impl FormKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::Imm5257e => "imm5257e",
            FormKind::Imm5645e => "imm5645e",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormKind::Imm5257e => f.write_str("IMM 5257E"),
            FormKind::Imm5645e => f.write_str("IMM 5645E"),
        }
    }
}

impl FromStr for FormKind {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "imm5257e" | "imm5257" | "5257" => Ok(FormKind::Imm5257e),
            "imm5645e" | "imm5645" | "5645" => Ok(FormKind::Imm5645e),
            other => Err(ExtractError::UnsupportedForm(format!(
                "unknown form kind {other:?}"
            ))),
        }
    }
}

/// One segment of an alias path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// Matches a name segment with exactly this name.
    Name(String),
    /// Matches exactly this repetition index.
    Index(usize),
    /// `[*]` — matches any repetition index and captures it.
    AnyIndex,
}

/// A pattern matched against whole raw paths.
///
/// Written in the same dotted syntax paths use, with `[*]` as the
/// repetition-index wildcard: `page1.SecB.Chd.[*].ChdDOB`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// Match against a full path. On success returns the repetition index
    /// captured by the `[*]` wildcard, if the pattern has one.
    pub fn match_path(&self, path: &FieldPath) -> Option<MatchOutcome> {
        let segs = path.segments();
        if segs.len() != self.segments.len() {
            return None;
        }
        let mut captured = None;
        for (pat, seg) in self.segments.iter().zip(segs) {
            match (pat, seg) {
                (PatternSegment::Name(a), PathSegment::Name(b)) if a == b => {}
                (PatternSegment::Index(i), PathSegment::Index(j)) if i == j => {}
                (PatternSegment::AnyIndex, PathSegment::Index(j)) => captured = Some(*j),
                _ => return None,
            }
        }
        Some(MatchOutcome { captured })
    }

    /// Whether some concrete path could match both `self` and `other`.
    ///
    /// Used by table validation: overlapping patterns make resolution
    /// ambiguous, which is a configuration error.
    pub fn overlaps(&self, other: &PathPattern) -> bool {
        if self.segments.len() != other.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(&other.segments)
            .all(|(a, b)| match (a, b) {
                (PatternSegment::Name(x), PatternSegment::Name(y)) => x == y,
                (PatternSegment::Index(x), PatternSegment::Index(y)) => x == y,
                (PatternSegment::AnyIndex, PatternSegment::AnyIndex) => true,
                (PatternSegment::AnyIndex, PatternSegment::Index(_)) => true,
                (PatternSegment::Index(_), PatternSegment::AnyIndex) => true,
                _ => false,
            })
    }

    fn wildcard_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, PatternSegment::AnyIndex))
            .count()
    }
}

/// Result of a successful pattern match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Repetition index captured by the `[*]` wildcard, if any.
    pub captured: Option<usize>,
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            match seg {
                PatternSegment::Name(n) => write!(f, "{n}")?,
                PatternSegment::Index(idx) => write!(f, "[{idx}]")?,
                PatternSegment::AnyIndex => write!(f, "[*]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for PathPattern {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ExtractError::Config(format!("invalid path pattern {s:?}"));
        let mut segments = Vec::new();
        for part in s.split('.') {
            if part.is_empty() {
                return Err(bad());
            }
            if part == "[*]" {
                segments.push(PatternSegment::AnyIndex);
            } else if let Some(inner) = part.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
                segments.push(PatternSegment::Index(inner.parse().map_err(|_| bad())?));
            } else if part.contains('[') {
                return Err(bad());
            } else {
                segments.push(PatternSegment::Name(part.to_string()));
            }
        }
        if segments.is_empty() {
            return Err(bad());
        }
        Ok(PathPattern { segments })
    }
}

impl Serialize for PathPattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PathPattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// How a group treats missing repetition indices (spec'd per group, never
/// inferred from the data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Drop empty indices; instances keep their source index but the
    /// sequence has no holes.
    #[default]
    Compact,
    /// Keep an empty instance for every index up to the highest populated
    /// one. For forms where position is meaningful (printed family-member
    /// rows).
    Preserve,
}

/// Declaration of one repeating group.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupSpec {
    #[serde(default)]
    pub gap_policy: GapPolicy,
    /// Canonical member ids that every populated instance must carry;
    /// absentees produce a `MalformedGroup` field error.
    #[serde(default)]
    pub required_members: Vec<String>,
}

/// An explicit revision stamp: when a raw field matching `path` exists (and
/// carries `value`, when given), the table is selected outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionMarker {
    pub path: PathPattern,
    #[serde(default)]
    pub value: Option<String>,
}

/// A declared cross-field check, evaluated after all fields are typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossFieldRule {
    /// Rule name; failures are attributed to it in the error list.
    pub name: String,
    #[serde(flatten)]
    pub check: CrossCheck,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum CrossCheck {
    /// `from` must not be a later date than `to`.
    DateOrder { from: String, to: String },
}

/// One alias rule: a raw path pattern and the canonical field it feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRule {
    pub pattern: PathPattern,
    /// Stable canonical identifier, unique per table (grouped members may
    /// repeat across distinct fixed slots).
    pub canonical: String,
    pub kind: ValueKind,
    /// Allowed set for `enum` fields (canonical casing; matching is
    /// case-insensitive).
    #[serde(default)]
    pub allowed: Vec<String>,
    /// Grouping key for repeated-section members.
    #[serde(default)]
    pub group: Option<String>,
    /// Fixed repetition index for forms that encode slots as distinct names
    /// (`PrevCOR.Row2`, `PrevCOR.Row3`, ...). Slot numbering is 0-based.
    #[serde(default)]
    pub slot: Option<usize>,
    /// Scalar fields only; grouped requirements live on the group spec.
    #[serde(default)]
    pub required: bool,
}

/// The alias table for one (form kind, revision) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasTable {
    pub form: FormKind,
    /// Revision token, e.g. `"10-2023"`.
    pub revision: String,
    /// Raw-path substrings identifying this form kind when the caller gives
    /// no hint.
    #[serde(default)]
    pub markers: Vec<String>,
    #[serde(default)]
    pub revision_marker: Option<RevisionMarker>,
    /// Wrapper names stripped (with everything before them) from raw paths
    /// before matching, e.g. `form1`.
    #[serde(default)]
    pub strip_prefixes: Vec<String>,
    /// Element subtrees the reader should skip for this form (ballast such
    /// as the 5257E's embedded list-of-values file).
    #[serde(default)]
    pub skip_subtrees: Vec<String>,
    pub rules: Vec<AliasRule>,
    #[serde(default)]
    pub groups: BTreeMap<String, GroupSpec>,
    #[serde(default)]
    pub cross_field_rules: Vec<CrossFieldRule>,
}

impl AliasTable {
    /// Check the table's internal consistency. Called once at load time;
    /// any failure here is a configuration error, never a per-document one.
    pub fn validate(&self) -> Result<(), ExtractError> {
        let cfg = |msg: String| ExtractError::Config(format!("{} {}: {msg}", self.form, self.revision));

        let mut seen: BTreeMap<&str, &AliasRule> = BTreeMap::new();
        for rule in &self.rules {
            if rule.pattern.wildcard_count() > 1 {
                return Err(cfg(format!(
                    "pattern {} has more than one [*] wildcard",
                    rule.pattern
                )));
            }
            let has_wildcard = rule.pattern.wildcard_count() == 1;
            match (&rule.group, rule.slot, has_wildcard) {
                (None, Some(_), _) => {
                    return Err(cfg(format!("rule {} sets slot without group", rule.canonical)));
                }
                (None, None, true) => {
                    return Err(cfg(format!(
                        "rule {} uses [*] but names no group",
                        rule.canonical
                    )));
                }
                (Some(_), None, false) => {
                    return Err(cfg(format!(
                        "grouped rule {} needs a [*] wildcard or a fixed slot",
                        rule.canonical
                    )));
                }
                (Some(_), Some(_), true) => {
                    return Err(cfg(format!(
                        "grouped rule {} has both [*] and a fixed slot",
                        rule.canonical
                    )));
                }
                _ => {}
            }
            if rule.required && rule.group.is_some() {
                return Err(cfg(format!(
                    "grouped rule {} cannot be required; use the group's required_members",
                    rule.canonical
                )));
            }
            if let Some(group) = &rule.group {
                if !self.groups.contains_key(group) {
                    return Err(cfg(format!(
                        "rule {} references undeclared group {group:?}",
                        rule.canonical
                    )));
                }
            }
            if rule.kind == ValueKind::Enum && rule.allowed.is_empty() {
                return Err(cfg(format!("enum rule {} has an empty allowed set", rule.canonical)));
            }
            if rule.kind != ValueKind::Enum && !rule.allowed.is_empty() {
                return Err(cfg(format!(
                    "rule {} declares an allowed set but is not an enum",
                    rule.canonical
                )));
            }

            // Duplicate canonical ids are only legal for the same grouped
            // member split across distinct fixed slots.
            if let Some(prev) = seen.insert(rule.canonical.as_str(), rule) {
                let same_member = prev.group.is_some()
                    && prev.group == rule.group
                    && prev.slot != rule.slot
                    && prev.slot.is_some()
                    && rule.slot.is_some();
                if !same_member {
                    return Err(cfg(format!("duplicate canonical id {}", rule.canonical)));
                }
            }
        }

        for (i, a) in self.rules.iter().enumerate() {
            for b in &self.rules[i + 1..] {
                if a.pattern.overlaps(&b.pattern) {
                    return Err(cfg(format!(
                        "ambiguous patterns: {} and {} can match the same path",
                        a.pattern, b.pattern
                    )));
                }
            }
        }

        let canonical_ids: BTreeSet<&str> =
            self.rules.iter().map(|r| r.canonical.as_str()).collect();
        for (name, spec) in &self.groups {
            for member in &spec.required_members {
                let declared = self
                    .rules
                    .iter()
                    .any(|r| r.group.as_deref() == Some(name) && &r.canonical == member);
                if !declared {
                    return Err(cfg(format!(
                        "group {name:?} requires undeclared member {member:?}"
                    )));
                }
            }
        }
        for rule in &self.cross_field_rules {
            let CrossCheck::DateOrder { from, to } = &rule.check;
            for id in [from, to] {
                if !canonical_ids.contains(id.as_str()) {
                    return Err(cfg(format!(
                        "cross-field rule {:?} references unknown field {id:?}",
                        rule.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Strip the first matching wrapper prefix from a raw path.
    pub fn strip(&self, path: &FieldPath) -> FieldPath {
        for prefix in &self.strip_prefixes {
            if let Some(stripped) = path.after_name(prefix) {
                if !stripped.is_empty() {
                    return stripped;
                }
            }
        }
        path.clone()
    }

    /// Find the rule matching a (stripped) raw path. Validation guarantees
    /// at most one rule can match.
    pub fn lookup(&self, path: &FieldPath) -> Option<(&AliasRule, MatchOutcome)> {
        self.rules
            .iter()
            .find_map(|rule| rule.pattern.match_path(path).map(|m| (rule, m)))
    }

    /// Fraction of raw paths this table resolves; the revision-selection
    /// score for documents without an explicit revision stamp.
    pub fn score(&self, raw: &RawFieldSet) -> f64 {
        if raw.is_empty() {
            return 0.0;
        }
        let matched = raw
            .iter()
            .filter(|(path, _)| self.lookup(&self.strip(path)).is_some())
            .count();
        matched as f64 / raw.len() as f64
    }

    /// Whether this table's revision marker is present in the raw set.
    pub fn revision_marker_matches(&self, raw: &RawFieldSet) -> bool {
        let Some(marker) = &self.revision_marker else {
            return false;
        };
        raw.iter().any(|(path, value)| {
            marker.path.match_path(&self.strip(path)).is_some()
                && marker
                    .value
                    .as_deref()
                    .is_none_or(|expected| value.as_str().trim() == expected)
        })
    }

    fn marker_hits(&self, raw: &RawFieldSet) -> usize {
        self.markers
            .iter()
            .filter(|marker| raw.iter().any(|(path, _)| path.contains_str(marker)))
            .count()
    }
}

/// All loaded alias tables, in declaration order.
///
/// Declaration order doubles as recency order: when revision scores tie, the
/// later-declared table wins. The registry is immutable after loading and
/// safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct AliasRegistry {
    tables: Vec<AliasTable>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add a table. Oldest revisions should be pushed first.
    pub fn push(&mut self, table: AliasTable) -> Result<(), ExtractError> {
        table.validate()?;
        self.tables.push(table);
        Ok(())
    }

    pub fn tables(&self) -> &[AliasTable] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Union of subtree skip lists across all tables, for the reader (which
    /// runs before the form kind is known).
    pub fn skip_subtrees(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .tables
            .iter()
            .flat_map(|t| t.skip_subtrees.iter().map(String::as_str))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Determine the form kind for a raw field set: an explicit hint wins,
    /// otherwise content markers decide. No match is an unsupported form.
    pub fn detect_form(
        &self,
        raw: &RawFieldSet,
        hint: Option<FormKind>,
    ) -> Result<FormKind, ExtractError> {
        if let Some(kind) = hint {
            if self.tables.iter().any(|t| t.form == kind) {
                return Ok(kind);
            }
            return Err(ExtractError::UnsupportedForm(format!(
                "no alias tables loaded for {kind}"
            )));
        }

        // Highest marker hit count wins; later-declared tables win ties.
        let mut best: Option<(usize, FormKind)> = None;
        for table in &self.tables {
            let hits = table.marker_hits(raw);
            if hits > 0 && best.is_none_or(|(b, _)| hits >= b) {
                best = Some((hits, table.form));
            }
        }
        match best {
            Some((_, kind)) => Ok(kind),
            None => Err(ExtractError::UnsupportedForm(
                "no form-type marker matched and no hint was given".to_string(),
            )),
        }
    }

    /// Select the alias table (revision) for a document of known form kind.
    ///
    /// An explicit revision-marker match wins; otherwise the table resolving
    /// the highest fraction of raw paths is selected, ties broken toward the
    /// most recently declared revision.
    pub fn select_revision(
        &self,
        kind: FormKind,
        raw: &RawFieldSet,
    ) -> Result<&AliasTable, ExtractError> {
        let candidates: Vec<&AliasTable> =
            self.tables.iter().filter(|t| t.form == kind).collect();
        if candidates.is_empty() {
            return Err(ExtractError::UnsupportedForm(format!(
                "no alias tables loaded for {kind}"
            )));
        }
        if let Some(stamped) = candidates
            .iter()
            .rev()
            .find(|t| t.revision_marker_matches(raw))
        {
            return Ok(stamped);
        }
        // `>=` with forward iteration keeps the last (most recent) of equal
        // scores, which is the documented tie-break.
        let mut best = candidates[0];
        let mut best_score = best.score(raw);
        for table in &candidates[1..] {
            let score = table.score(raw);
            if score >= best_score {
                best = table;
                best_score = score;
            }
        }
        Ok(best)
    }
}
