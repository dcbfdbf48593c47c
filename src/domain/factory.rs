//! Creating and removing fields while keeping the hierarchy consistent.

use tracing::{debug, instrument};

use crate::domain::{
    field::{ConditionalLogic, Field, FieldId, FieldType, MAX_NESTING_LEVEL},
    hierarchy::{descendants, find, normalize_order, position_of, subtree_range},
};

/// Why a child field could not be created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CreateChildError {
    /// The requested parent does not exist.
    #[error("parent field {0} not found")]
    ParentNotFound(FieldId),

    /// The parent's type cannot own children.
    #[error("{field_type} field {parent} cannot have conditional children")]
    IneligibleParentType {
        /// The requested parent.
        parent: FieldId,
        /// Its type.
        field_type: FieldType,
    },

    /// The parent is already at the deepest nesting level.
    #[error("field {parent} is nested {nesting_level} levels deep and cannot have children")]
    MaxDepthReached {
        /// The requested parent.
        parent: FieldId,
        /// Its nesting level.
        nesting_level: u8,
    },
}

/// Error returned when deleting a field that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field {0} not found")]
pub struct FieldNotFound(pub FieldId);

/// A new field and the sequence that contains it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCreated {
    /// The updated sequence, with `order` renumbered.
    pub fields: Vec<Field>,
    /// Id of the field that was added.
    pub new_field_id: FieldId,
}

/// The sequence left after deleting a field and its descendants.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRemoved {
    /// The updated sequence, with `order` renumbered.
    pub fields: Vec<Field>,
    /// Ids of every field removed, the requested one first.
    pub removed: Vec<FieldId>,
}

/// Creates a new field nested directly under `parent_id`.
///
/// The child is inserted immediately after its parent, ahead of any existing
/// children. The parent's `childFields` gains the new id and its conditional
/// logic is switched on.
///
/// # Errors
///
/// The parent must exist, be of a conditional-capable type, and sit above
/// the deepest nesting level. Each failure has its own [`CreateChildError`].
#[instrument(level = "debug", skip(fields), fields(parent = %parent_id))]
pub fn create_child(
    fields: &[Field],
    parent_id: &FieldId,
    field_type: FieldType,
) -> Result<FieldCreated, CreateChildError> {
    let parent_index = position_of(fields, parent_id)
        .ok_or_else(|| CreateChildError::ParentNotFound(parent_id.clone()))?;
    let parent = &fields[parent_index];

    if !parent.field_type.can_own_children() {
        return Err(CreateChildError::IneligibleParentType {
            parent: parent_id.clone(),
            field_type: parent.field_type,
        });
    }

    let nesting_level = parent.nesting_level();
    if nesting_level >= MAX_NESTING_LEVEL {
        return Err(CreateChildError::MaxDepthReached {
            parent: parent_id.clone(),
            nesting_level,
        });
    }

    let mut child = Field::new(FieldId::generate(), field_type);
    child.conditional_logic = Some(ConditionalLogic {
        enabled: true,
        parent_field_id: Some(parent_id.clone()),
        conditions: Vec::new(),
        child_fields: Vec::new(),
        nesting_level: nesting_level + 1,
    });
    let new_field_id = child.id.clone();

    let mut updated = fields.to_vec();
    let logic = updated[parent_index].logic_mut();
    logic.enabled = true;
    logic.child_fields.push(new_field_id.clone());
    updated.insert(parent_index + 1, child);
    normalize_order(&mut updated);

    debug!(child = %new_field_id, level = nesting_level + 1, "created child field");
    Ok(FieldCreated {
        fields: updated,
        new_field_id,
    })
}

/// Inserts a new root field.
///
/// Without an index the field is appended. An index that would land between
/// a field and its descendants is moved past the end of that block.
#[must_use]
pub fn insert_field(
    fields: &[Field],
    field_type: FieldType,
    insert_index: Option<usize>,
) -> FieldCreated {
    let field = Field::new(FieldId::generate(), field_type);
    let new_field_id = field.id.clone();
    let at = insert_index.map_or(fields.len(), |index| snap_out_of_blocks(fields, index));

    let mut updated = fields.to_vec();
    updated.insert(at, field);
    normalize_order(&mut updated);

    debug!(field = %new_field_id, index = at, "inserted field");
    FieldCreated {
        fields: updated,
        new_field_id,
    }
}

/// Moves an insertion point forward until it is not inside any subtree block.
fn snap_out_of_blocks(fields: &[Field], index: usize) -> usize {
    let mut at = index.min(fields.len());
    let mut position = 0;
    while position < at {
        let block = subtree_range(fields, position);
        if block.end > at {
            at = block.end;
        }
        position = block.end;
    }
    at
}

/// Deletes a field together with all of its descendants.
///
/// Every removed id is also dropped from the `childFields` of the fields
/// that remain.
///
/// # Errors
///
/// Returns [`FieldNotFound`] if no field has the given id.
#[instrument(level = "debug", skip(fields), fields(field = %id))]
pub fn remove_field(fields: &[Field], id: &FieldId) -> Result<FieldRemoved, FieldNotFound> {
    if find(fields, id).is_none() {
        return Err(FieldNotFound(id.clone()));
    }

    let mut removed = vec![id.clone()];
    removed.extend(descendants(fields, id));

    let mut updated: Vec<Field> = fields
        .iter()
        .filter(|field| !removed.contains(&field.id))
        .cloned()
        .collect();
    // a stale link can pull in a field owned by a parent that survives
    for field in &mut updated {
        if let Some(logic) = field.conditional_logic.as_mut() {
            logic.child_fields.retain(|child| !removed.contains(child));
        }
    }
    normalize_order(&mut updated);

    debug!(count = removed.len(), "removed fields");
    Ok(FieldRemoved {
        fields: updated,
        removed,
    })
}
