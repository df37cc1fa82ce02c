//! Group expansion: repeated form sections reassembled into ordered slots.
//!
//! Grouped fields arrive from the resolver as independent (member, index)
//! pairs; this stage partitions them by repetition index and rebuilds the
//! per-entry structure (one slot per family member, previous address, and so
//! on), ordered by ascending index regardless of source traversal order.

use std::collections::BTreeMap;

use crate::alias::{AliasTable, GapPolicy};
use crate::error::{FieldError, FieldErrorKind};
use crate::resolve::ResolvedField;

/// One repeated-section entry before coercion: the members found at a single
/// repetition index.
#[derive(Debug, Clone, Default)]
pub struct GroupSlot<'a> {
    /// The repetition index in the source document. Preserved-gap groups
    /// may contain empty slots whose index never occurred.
    pub index: usize,
    pub members: Vec<ResolvedField<'a>>,
}

impl GroupSlot<'_> {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Output of the expander stage: scalar fields untouched, grouped fields
/// reassembled into ordered slot sequences.
#[derive(Debug, Default)]
pub struct Expanded<'a> {
    pub scalars: Vec<ResolvedField<'a>>,
    pub groups: BTreeMap<String, Vec<GroupSlot<'a>>>,
    pub errors: Vec<FieldError>,
}

/// Partition resolved fields into scalars and ordered group slots.
///
/// Gap handling follows each group's declared policy: `preserve` emits an
/// empty slot for every missing index below the highest populated one,
/// `compact` emits populated slots only. A populated slot missing one of the
/// group's required members produces a `MalformedGroup` error and is kept as
/// a partial entry.
pub fn expand<'a>(table: &AliasTable, fields: Vec<ResolvedField<'a>>) -> Expanded<'a> {
    let mut expanded = Expanded::default();
    let mut by_group: BTreeMap<String, BTreeMap<usize, Vec<ResolvedField<'a>>>> = BTreeMap::new();

    for field in fields {
        match &field.rule.group {
            None => expanded.scalars.push(field),
            Some(group) => {
                // Table validation guarantees grouped rules carry a wildcard
                // capture or a fixed slot.
                let index = field.index.unwrap_or(0);
                by_group
                    .entry(group.clone())
                    .or_default()
                    .entry(index)
                    .or_default()
                    .push(field);
            }
        }
    }

    for (name, slots) in by_group {
        let spec = table.groups.get(&name).cloned().unwrap_or_default();
        let mut ordered = Vec::new();
        match spec.gap_policy {
            GapPolicy::Compact => {
                for (index, members) in slots {
                    ordered.push(GroupSlot { index, members });
                }
            }
            GapPolicy::Preserve => {
                let max = slots.keys().next_back().copied().unwrap_or(0);
                for index in 0..=max {
                    let members = slots.get(&index).cloned().unwrap_or_default();
                    ordered.push(GroupSlot { index, members });
                }
            }
        }

        for slot in &ordered {
            if slot.is_empty() {
                continue;
            }
            for member in &spec.required_members {
                if !slot.members.iter().any(|f| f.canonical() == member) {
                    expanded.errors.push(FieldError::new(
                        member.clone(),
                        FieldErrorKind::MalformedGroup,
                        format!(
                            "group {name:?} entry at index {} is missing required member {member:?}; partial entry kept",
                            slot.index
                        ),
                    ));
                }
            }
        }

        expanded.groups.insert(name, ordered);
    }

    expanded
}
