//! Derived views over the flat field array.
//!
//! Fields are stored as a flat, order-keyed sequence with parent
//! back-references. The hierarchy is always derived from that sequence on
//! demand rather than kept as a second, synchronised structure.

use std::{
    collections::{BTreeSet, HashMap, HashSet, VecDeque},
    ops::Range,
};

use crate::domain::field::{Field, FieldId, MAX_NESTING_LEVEL};

/// Finds a field by id.
#[must_use]
pub fn find<'a>(fields: &'a [Field], id: &FieldId) -> Option<&'a Field> {
    fields.iter().find(|field| &field.id == id)
}

/// Index of a field in the sequence.
#[must_use]
pub fn position_of(fields: &[Field], id: &FieldId) -> Option<usize> {
    fields.iter().position(|field| &field.id == id)
}

/// Direct children of a field, by `parentFieldId`, in ascending `order`.
///
/// Ties in `order` keep their array position.
#[must_use]
pub fn direct_children<'a>(fields: &'a [Field], id: &FieldId) -> Vec<&'a Field> {
    let mut children: Vec<&Field> = fields
        .iter()
        .filter(|field| field.parent_id() == Some(id))
        .collect();
    children.sort_by_key(|field| field.order);
    children
}

/// Every descendant of a field: children, grandchildren and so on.
///
/// Follows both `parentFieldId` and `childFields`, so a field reachable by
/// either link is included. Ids listed in `childFields` that name no field
/// are skipped. Cycles in malformed data terminate.
#[must_use]
pub fn descendants(fields: &[Field], id: &FieldId) -> BTreeSet<FieldId> {
    let index = ChildIndex::new(fields);
    index.descendants(id)
}

/// The index range covered by the field at `index` and all of its
/// descendants.
///
/// When the hierarchy is well formed this is exactly the field's subtree
/// block. A field without descendants yields `index..index + 1`.
///
/// # Panics
///
/// Panics if `index` is out of bounds.
#[must_use]
pub fn subtree_range(fields: &[Field], index: usize) -> Range<usize> {
    let members = descendants(fields, &fields[index].id);
    let end = fields
        .iter()
        .enumerate()
        .filter(|(_, field)| members.contains(&field.id))
        .map(|(position, _)| position)
        .fold(index, usize::max);
    index..end + 1
}

/// Reassigns `order` from array position: `0..n-1`, no gaps or duplicates.
pub fn normalize_order(fields: &mut [Field]) {
    for (position, field) in fields.iter_mut().enumerate() {
        field.order = i64::try_from(position).unwrap_or(i64::MAX);
    }
}

/// Fields whose descendants do not form a contiguous block immediately
/// after them, in sequence order.
#[must_use]
pub fn split_subtrees(fields: &[Field]) -> Vec<FieldId> {
    let index = ChildIndex::new(fields);
    let positions: HashMap<&FieldId, usize> = fields
        .iter()
        .enumerate()
        .map(|(position, field)| (&field.id, position))
        .collect();

    fields
        .iter()
        .enumerate()
        .filter_map(|(position, field)| {
            let members = index.descendants(&field.id);
            if members.is_empty() {
                return None;
            }
            let block_end = position + members.len();
            let contiguous = members.iter().all(|member| {
                positions
                    .get(member)
                    .is_some_and(|&at| at > position && at <= block_end)
            });
            (!contiguous).then(|| field.id.clone())
        })
        .collect()
}

/// A violated structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityIssue {
    /// Two fields share an id.
    #[error("duplicate field id {0}")]
    DuplicateId(FieldId),

    /// A field names a parent that does not exist.
    #[error("field {field} references missing parent {parent}")]
    DanglingParent {
        /// The orphaned field.
        field: FieldId,
        /// The missing parent id.
        parent: FieldId,
    },

    /// A parent's `childFields` does not list a field that points at it.
    #[error("parent {parent} does not list its child {child}")]
    MissingChildLink {
        /// The parent field.
        parent: FieldId,
        /// The unlisted child.
        child: FieldId,
    },

    /// A parent's `childFields` lists a field that does not point back.
    #[error("parent {parent} lists {child}, which does not reference it")]
    StaleChildLink {
        /// The parent field.
        parent: FieldId,
        /// The listed id.
        child: FieldId,
    },

    /// A field's `nestingLevel` disagrees with its depth.
    #[error("field {field} has nesting level {actual}, expected {expected}")]
    NestingMismatch {
        /// The field.
        field: FieldId,
        /// Depth derived from ancestry.
        expected: u8,
        /// Stored nesting level.
        actual: u8,
    },

    /// A field sits deeper than the maximum nesting level.
    #[error("field {field} is nested {level} levels deep")]
    TooDeep {
        /// The field.
        field: FieldId,
        /// Its stored nesting level.
        level: u8,
    },

    /// Following parent links from a field loops back on itself.
    #[error("field {0} is part of a parent cycle")]
    Cycle(FieldId),

    /// A child is positioned at or before its parent.
    #[error("field {field} is positioned before its parent {parent}")]
    ChildBeforeParent {
        /// The misplaced child.
        field: FieldId,
        /// Its parent.
        parent: FieldId,
    },

    /// A field's descendants are interleaved with unrelated fields.
    #[error("descendants of field {0} are not contiguous")]
    SplitSubtree(FieldId),

    /// Two fields share an `order` value.
    #[error("order value {0} is used more than once")]
    DuplicateOrder(i64),
}

/// Checks every structural invariant, reporting each violation found.
///
/// The sequence is not modified.
#[must_use]
pub fn check_integrity(fields: &[Field]) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();
    let mut by_id: HashMap<&FieldId, (usize, &Field)> = HashMap::new();
    for (position, field) in fields.iter().enumerate() {
        if by_id.insert(&field.id, (position, field)).is_some() {
            issues.push(IntegrityIssue::DuplicateId(field.id.clone()));
        }
    }

    for (position, field) in fields.iter().enumerate() {
        if let Some(parent_id) = field.parent_id() {
            match by_id.get(parent_id) {
                None => issues.push(IntegrityIssue::DanglingParent {
                    field: field.id.clone(),
                    parent: parent_id.clone(),
                }),
                Some(&(parent_position, parent)) => {
                    if !parent.child_ids().contains(&field.id) {
                        issues.push(IntegrityIssue::MissingChildLink {
                            parent: parent_id.clone(),
                            child: field.id.clone(),
                        });
                    }
                    if position <= parent_position {
                        issues.push(IntegrityIssue::ChildBeforeParent {
                            field: field.id.clone(),
                            parent: parent_id.clone(),
                        });
                    }
                }
            }
        }

        for child in field.child_ids() {
            let points_back = by_id
                .get(child)
                .is_some_and(|(_, child)| child.parent_id() == Some(&field.id));
            if !points_back {
                issues.push(IntegrityIssue::StaleChildLink {
                    parent: field.id.clone(),
                    child: child.clone(),
                });
            }
        }

        match depth(&by_id, field) {
            None => issues.push(IntegrityIssue::Cycle(field.id.clone())),
            Some(expected) => {
                let actual = field.nesting_level();
                if actual > MAX_NESTING_LEVEL {
                    issues.push(IntegrityIssue::TooDeep {
                        field: field.id.clone(),
                        level: actual,
                    });
                }
                if expected != actual {
                    issues.push(IntegrityIssue::NestingMismatch {
                        field: field.id.clone(),
                        expected,
                        actual,
                    });
                }
            }
        }
    }

    issues.extend(
        split_subtrees(fields)
            .into_iter()
            .map(IntegrityIssue::SplitSubtree),
    );

    let mut seen = HashSet::new();
    let mut duplicated = BTreeSet::new();
    for field in fields {
        if !seen.insert(field.order) {
            duplicated.insert(field.order);
        }
    }
    issues.extend(duplicated.into_iter().map(IntegrityIssue::DuplicateOrder));

    issues
}

/// Depth derived by walking parent links. `None` on a cycle.
///
/// A dangling parent ends the walk; that is reported separately.
fn depth(by_id: &HashMap<&FieldId, (usize, &Field)>, field: &Field) -> Option<u8> {
    let mut visited = HashSet::from([&field.id]);
    let mut current = field;
    let mut depth: u8 = 0;
    while let Some(parent_id) = current.parent_id() {
        let Some(&(_, parent)) = by_id.get(parent_id) else {
            break;
        };
        if !visited.insert(&parent.id) {
            return None;
        }
        depth = depth.saturating_add(1);
        current = parent;
    }
    Some(depth)
}

/// Parent-to-children lookup built once per pass.
pub(crate) struct ChildIndex<'a> {
    children: HashMap<&'a FieldId, Vec<&'a FieldId>>,
}

impl<'a> ChildIndex<'a> {
    pub(crate) fn new(fields: &'a [Field]) -> Self {
        let known: HashSet<&FieldId> = fields.iter().map(|field| &field.id).collect();
        let mut children: HashMap<&FieldId, Vec<&FieldId>> = HashMap::new();
        for field in fields {
            if let Some(parent) = field.parent_id() {
                children.entry(parent).or_default().push(&field.id);
            }
            for child in field.child_ids() {
                if known.contains(child) {
                    let entry = children.entry(&field.id).or_default();
                    if !entry.contains(&child) {
                        entry.push(child);
                    }
                }
            }
        }
        Self { children }
    }

    pub(crate) fn descendants(&self, id: &FieldId) -> BTreeSet<FieldId> {
        let mut found = BTreeSet::new();
        let mut queue: VecDeque<&FieldId> = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for &child in self.children.get(current).into_iter().flatten() {
                if child != id && found.insert(child.clone()) {
                    queue.push_back(child);
                }
            }
        }
        found
    }
}
