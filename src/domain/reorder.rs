//! Hierarchy-preserving reordering.
//!
//! Both the sortable list and the manual drop zones move fields through
//! [`check_move`] and [`apply_move`]. A moved field always carries its
//! descendant block with it.
//!
//! `target_index` has array-move semantics: it is the index of the element
//! the field is dropped over in the current sequence. Moving forward lands
//! after that element, moving backward lands before it. Indices past the end
//! are clamped to the last element.

use std::{collections::HashSet, ops::Range};

use tracing::{debug, instrument};

use crate::domain::{
    field::{Field, FieldId},
    hierarchy::{normalize_order, position_of, split_subtrees, subtree_range},
};

/// Why a move was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// The moved field does not exist.
    #[error("field {0} not found")]
    FieldNotFound(FieldId),

    /// A child was dropped at or before its parent.
    #[error("field {field} cannot be placed at or before its parent {parent}")]
    ChildBeforeParent {
        /// The moved child.
        field: FieldId,
        /// Its parent.
        parent: FieldId,
    },

    /// A parent was dropped in the middle of its own descendants.
    #[error("field {0} cannot be dropped inside its own subtree")]
    InsideOwnSubtree(FieldId),

    /// The move would interleave fields into another field's subtree, or
    /// carry a child out of its parent's block.
    #[error("moving field {field} would split the subtree of {parent}")]
    SplitsSubtree {
        /// The moved field.
        field: FieldId,
        /// The field whose subtree would no longer be contiguous.
        parent: FieldId,
    },
}

/// Whether moving `moved` to `target_index` keeps the hierarchy intact.
#[must_use]
pub fn can_move(fields: &[Field], moved: &FieldId, target_index: usize) -> bool {
    check_move(fields, moved, target_index).is_ok()
}

/// Validates a move without performing it.
///
/// # Errors
///
/// Returns the first rule the move breaks, see [`MoveError`].
pub fn check_move(fields: &[Field], moved: &FieldId, target_index: usize) -> Result<(), MoveError> {
    plan(fields, moved, target_index).map(|_| ())
}

/// Moves a field (and its descendants) and renumbers `order` to `0..n-1`.
///
/// The input is left untouched; the reordered sequence is returned.
///
/// # Errors
///
/// Returns the first rule the move breaks, see [`MoveError`].
#[instrument(level = "debug", skip(fields), fields(moved = %moved))]
pub fn apply_move(
    fields: &[Field],
    moved: &FieldId,
    target_index: usize,
) -> Result<Vec<Field>, MoveError> {
    let mut result = plan(fields, moved, target_index)?;
    normalize_order(&mut result);
    debug!("field moved");
    Ok(result)
}

/// Checks the rules in order and builds the reordered sequence.
fn plan(fields: &[Field], moved: &FieldId, target_index: usize) -> Result<Vec<Field>, MoveError> {
    let from = position_of(fields, moved).ok_or_else(|| MoveError::FieldNotFound(moved.clone()))?;
    let target = target_index.min(fields.len() - 1);
    let field = &fields[from];

    if let Some(parent) = field.parent_id() {
        if let Some(parent_index) = position_of(fields, parent) {
            if target <= parent_index {
                return Err(MoveError::ChildBeforeParent {
                    field: moved.clone(),
                    parent: parent.clone(),
                });
            }
        }
    }

    let block = subtree_range(fields, from);
    if target > from && target < block.end - 1 {
        return Err(MoveError::InsideOwnSubtree(moved.clone()));
    }

    let result = relocate(fields, &block, target);

    let already_split: HashSet<FieldId> = split_subtrees(fields).into_iter().collect();
    if let Some(parent) = split_subtrees(&result)
        .into_iter()
        .find(|id| !already_split.contains(id))
    {
        return Err(MoveError::SplitsSubtree {
            field: moved.clone(),
            parent,
        });
    }

    Ok(result)
}

/// Moves the `block` so that its head lands where a single-element move to
/// `target` would put it.
fn relocate(fields: &[Field], block: &Range<usize>, target: usize) -> Vec<Field> {
    let insert_at = if target < block.start {
        target
    } else if target < block.end {
        // dropped onto itself or its own last descendant
        block.start
    } else {
        target + 1 - block.len()
    };

    let rest: Vec<&Field> = fields[..block.start]
        .iter()
        .chain(&fields[block.end..])
        .collect();

    let mut result = Vec::with_capacity(fields.len());
    result.extend(rest[..insert_at].iter().map(|&field| field.clone()));
    result.extend_from_slice(&fields[block.clone()]);
    result.extend(rest[insert_at..].iter().map(|&field| field.clone()));
    result
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::{
        hierarchy::check_integrity,
        testing::{sequence, tree},
    };

    /// `r, p[a[g], b], q`
    fn form() -> Vec<Field> {
        tree(&[
            ("r", None),
            ("p", None),
            ("a", Some("p")),
            ("g", Some("a")),
            ("b", Some("p")),
            ("q", None),
        ])
    }

    #[test_case("q", 0, &["q", "r", "p", "a", "g", "b"]; "root to front")]
    #[test_case("r", 5, &["p", "a", "g", "b", "q", "r"]; "root to back")]
    #[test_case("r", 4, &["p", "a", "g", "b", "r", "q"]; "root after subtree")]
    #[test_case("p", 0, &["p", "a", "g", "b", "r", "q"]; "parent carries subtree backward")]
    #[test_case("p", 5, &["r", "q", "p", "a", "g", "b"]; "parent carries subtree forward")]
    #[test_case("p", 4, &["r", "p", "a", "g", "b", "q"]; "parent onto last descendant")]
    #[test_case("p", 99, &["r", "q", "p", "a", "g", "b"]; "target clamped")]
    #[test_case("b", 2, &["r", "p", "b", "a", "g", "q"]; "child before sibling")]
    #[test_case("a", 4, &["r", "p", "b", "a", "g", "q"]; "child carries grandchild")]
    fn accepted_moves(moved: &str, target: usize, expected: &[&str]) {
        let fields = form();

        let result = apply_move(&fields, &moved.into(), target).unwrap();

        assert_eq!(sequence(&result), expected);
        assert_eq!(check_integrity(&result), Vec::new());
    }

    #[test_case("a", 1; "child onto parent")]
    #[test_case("a", 0; "child before parent")]
    #[test_case("g", 2; "grandchild onto parent")]
    fn child_before_parent_is_rejected(moved: &str, target: usize) {
        let fields = form();

        let error = check_move(&fields, &moved.into(), target).unwrap_err();

        assert!(matches!(error, MoveError::ChildBeforeParent { .. }));
        assert!(!can_move(&fields, &moved.into(), target));
    }

    #[test_case(2; "onto first child")]
    #[test_case(3; "onto grandchild")]
    fn parent_inside_own_subtree_is_rejected(target: usize) {
        let fields = form();

        let error = check_move(&fields, &"p".into(), target).unwrap_err();

        assert_eq!(error, MoveError::InsideOwnSubtree("p".into()));
    }

    #[test_case("r", 2, "p"; "root into subtree")]
    #[test_case("q", 3, "p"; "root backward into subtree")]
    #[test_case("b", 5, "p"; "child out of parent block")]
    #[test_case("b", 3, "a"; "child into sibling subtree")]
    fn splitting_moves_are_rejected(moved: &str, target: usize, split: &str) {
        let fields = form();

        let error = check_move(&fields, &moved.into(), target).unwrap_err();

        assert_eq!(
            error,
            MoveError::SplitsSubtree {
                field: moved.into(),
                parent: split.into()
            }
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        let error = check_move(&form(), &"nope".into(), 0).unwrap_err();
        assert_eq!(error, MoveError::FieldNotFound("nope".into()));
    }

    #[test]
    fn move_renumbers_order() {
        let mut fields = form();
        for field in &mut fields {
            field.order *= 10;
        }

        let result = apply_move(&fields, &"q".into(), 0).unwrap();

        let orders: Vec<i64> = result.iter().map(|f| f.order).collect();
        assert_eq!(orders, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn rejected_move_leaves_input_untouched() {
        let fields = form();
        let before = fields.clone();

        assert!(apply_move(&fields, &"a".into(), 0).is_err());
        assert_eq!(fields, before);
    }

    #[test]
    fn pre_existing_damage_does_not_block_unrelated_moves() {
        let mut fields = tree(&[("p", None), ("a", Some("p")), ("x", None), ("y", None)]);
        // a's block is already split by x
        fields.swap(1, 2);

        let result = apply_move(&fields, &"y".into(), 0).unwrap();

        assert_eq!(sequence(&result), ["y", "p", "x", "a"]);
    }
}
