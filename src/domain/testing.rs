//! Fixtures shared by the domain tests.

use crate::domain::{
    field::{Field, FieldType},
    hierarchy::normalize_order,
};

/// Builds a well formed sequence from `(id, parent)` pairs, in order.
///
/// Every field is a dropdown. Parents get conditional logic enabled and the
/// child linked in both directions.
pub fn tree(spec: &[(&str, Option<&str>)]) -> Vec<Field> {
    let mut fields: Vec<Field> = spec
        .iter()
        .map(|(id, _)| Field::new(*id, FieldType::Dropdown))
        .collect();
    for (id, parent) in spec {
        let Some(parent) = parent else { continue };
        let parent_field = fields
            .iter_mut()
            .find(|f| f.id.as_str() == *parent)
            .expect("parent must precede child");
        let level = parent_field.nesting_level() + 1;
        parent_field.logic_mut().enabled = true;
        parent_field.logic_mut().child_fields.push((*id).into());

        let child = fields.iter_mut().find(|f| f.id.as_str() == *id).unwrap();
        let logic = child.logic_mut();
        logic.parent_field_id = Some((*parent).into());
        logic.nesting_level = level;
        logic.enabled = true;
    }
    normalize_order(&mut fields);
    fields
}

/// The ids of a list of field references.
pub fn ids(fields: &[&Field]) -> Vec<String> {
    fields.iter().map(|f| f.id.to_string()).collect()
}

/// The ids of a field sequence, in array order.
pub fn sequence(fields: &[Field]) -> Vec<String> {
    fields.iter().map(|f| f.id.to_string()).collect()
}
