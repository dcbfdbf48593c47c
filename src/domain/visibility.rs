//! Visibility evaluation for conditional fields.
//!
//! The evaluator walks the hierarchy depth first from the roots, so every
//! visible child appears directly beneath its parent regardless of how the
//! flat sequence is stored. Anything malformed is hidden rather than shown.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{instrument, warn};

use crate::domain::{
    answers::AnswerSet,
    field::{Field, FieldId},
};

/// The outcome of one evaluation pass.
#[derive(Debug, Clone)]
pub struct Evaluation<'a> {
    visible: Vec<&'a Field>,
    ids: HashSet<&'a FieldId>,
}

impl<'a> Evaluation<'a> {
    /// Evaluates the field set against the current answers.
    #[must_use]
    #[instrument(level = "trace", skip_all, fields(fields = fields.len(), answers = answers.len()))]
    pub fn new(fields: &'a [Field], answers: &AnswerSet) -> Self {
        let walker = Walker::new(fields, answers);
        let mut visible = Vec::with_capacity(fields.len());
        let mut seen = HashSet::new();
        for &root in &walker.roots {
            walker.visit(root, &mut seen, &mut visible);
        }
        let ids = visible.iter().map(|field| &field.id).collect();
        Self { visible, ids }
    }

    /// Visible fields in render order.
    #[must_use]
    pub fn visible(&self) -> &[&'a Field] {
        &self.visible
    }

    /// Consumes the evaluation, returning the visible fields in render order.
    #[must_use]
    pub fn into_visible(self) -> Vec<&'a Field> {
        self.visible
    }

    /// Whether a field is visible.
    #[must_use]
    pub fn is_visible(&self, id: &FieldId) -> bool {
        self.ids.contains(id)
    }
}

/// Computes which fields are visible, in render order.
///
/// Roots come in ascending `order`; each visible child is followed by its own
/// visible subtree before the next sibling. A non-root field is shown only if
/// its parent is shown, the parent has conditional logic enabled, and every
/// one of its conditions holds.
#[must_use]
pub fn evaluate<'a>(fields: &'a [Field], answers: &AnswerSet) -> Vec<&'a Field> {
    Evaluation::new(fields, answers).into_visible()
}

/// Fields shown under `before` that are no longer shown under `after`.
///
/// Their answers should be cleared before the form is submitted.
#[must_use]
pub fn fields_to_hide(
    fields: &[Field],
    before: &AnswerSet,
    after: &AnswerSet,
) -> BTreeSet<FieldId> {
    let before = Evaluation::new(fields, before);
    let after = Evaluation::new(fields, after);
    before
        .visible()
        .iter()
        .filter(|field| !after.is_visible(&field.id))
        .map(|field| field.id.clone())
        .collect()
}

/// Copies the fields with the `hidden` render hint filled in.
///
/// Array order is preserved.
#[must_use]
pub fn with_render_hints(fields: &[Field], answers: &AnswerSet) -> Vec<Field> {
    let evaluation = Evaluation::new(fields, answers);
    fields
        .iter()
        .map(|field| Field {
            hidden: !evaluation.is_visible(&field.id),
            ..field.clone()
        })
        .collect()
}

struct Walker<'a, 'b> {
    fields: &'a [Field],
    answers: &'b AnswerSet,
    roots: Vec<usize>,
    children: HashMap<&'a FieldId, Vec<usize>>,
}

impl<'a, 'b> Walker<'a, 'b> {
    fn new(fields: &'a [Field], answers: &'b AnswerSet) -> Self {
        let mut by_id: HashMap<&FieldId, usize> = HashMap::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            if by_id.contains_key(&field.id) {
                warn!(field = %field.id, "duplicate field id, later copy hidden");
            } else {
                by_id.insert(&field.id, index);
            }
        }

        let mut roots = Vec::new();
        let mut children: HashMap<&FieldId, Vec<usize>> = HashMap::new();
        for (index, field) in fields.iter().enumerate() {
            if by_id.get(&field.id) != Some(&index) {
                continue;
            }
            let Some(parent_id) = field.parent_id() else {
                roots.push(index);
                continue;
            };
            match by_id.get(parent_id) {
                None => {
                    warn!(field = %field.id, parent = %parent_id, "parent not found, field hidden");
                }
                Some(&parent) if !fields[parent].child_ids().contains(&field.id) => {
                    warn!(
                        field = %field.id,
                        parent = %parent_id,
                        "parent does not list field as a child, field hidden"
                    );
                }
                Some(_) => children.entry(parent_id).or_default().push(index),
            }
        }

        let by_order = |a: &usize, b: &usize| fields[*a].order.cmp(&fields[*b].order).then(a.cmp(b));
        roots.sort_by(by_order);
        for siblings in children.values_mut() {
            siblings.sort_by(by_order);
        }

        Self {
            fields,
            answers,
            roots,
            children,
        }
    }

    fn visit(&self, index: usize, seen: &mut HashSet<usize>, out: &mut Vec<&'a Field>) {
        if !seen.insert(index) {
            return;
        }
        let fields = self.fields;
        let field = &fields[index];
        out.push(field);

        if !field.logic_enabled() {
            return;
        }
        for &child in self.children.get(&field.id).into_iter().flatten() {
            if self.conditions_hold(&fields[child]) {
                self.visit(child, seen, out);
            }
        }
    }

    fn conditions_hold(&self, field: &Field) -> bool {
        field
            .conditions()
            .iter()
            .all(|condition| condition.is_satisfied_by(self.answers.get(&condition.field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        answers::AnswerValue,
        condition::{Condition, ConditionOperator},
        testing::{ids, tree},
    };

    fn answers(pairs: &[(&str, &str)]) -> AnswerSet {
        pairs
            .iter()
            .map(|(id, value)| (FieldId::from(*id), AnswerValue::from(*value)))
            .collect()
    }

    fn gate(fields: &mut [Field], id: &str, condition: Condition) {
        let field = fields.iter_mut().find(|f| f.id.as_str() == id).unwrap();
        field.logic_mut().conditions.push(condition);
    }

    #[test]
    fn children_render_directly_under_parent() {
        // stored with the second root first, and a child ahead of its sibling
        let mut fields = tree(&[
            ("p", None),
            ("a", Some("p")),
            ("g", Some("a")),
            ("b", Some("p")),
            ("q", None),
        ]);
        fields[0].order = 5;
        fields[4].order = 1;
        fields[3].order = 0;
        fields.reverse();

        let visible = evaluate(&fields, &AnswerSet::new());

        assert_eq!(ids(&visible), ["q", "p", "b", "a", "g"]);
    }

    #[test]
    fn child_follows_parent_answer() {
        let mut fields = tree(&[("device", None), ("model", Some("device")), ("notes", None)]);
        gate(&mut fields, "model", Condition::equals("device", "Laptop"));

        let before = answers(&[("device", "Laptop")]);
        let after = answers(&[("device", "Desktop")]);

        assert_eq!(ids(&evaluate(&fields, &before)), ["device", "model", "notes"]);
        assert_eq!(ids(&evaluate(&fields, &after)), ["device", "notes"]);
        assert_eq!(
            fields_to_hide(&fields, &before, &after),
            BTreeSet::from(["model".into()])
        );
        assert!(fields_to_hide(&fields, &after, &before).is_empty());
    }

    #[test]
    fn conditions_are_conjunctive() {
        let mut fields = tree(&[("p", None), ("c", Some("p")), ("other", None)]);
        gate(&mut fields, "c", Condition::equals("p", "yes"));
        gate(&mut fields, "c", Condition::equals("other", "1"));

        assert!(!Evaluation::new(&fields, &answers(&[("p", "yes")])).is_visible(&"c".into()));
        assert!(
            Evaluation::new(&fields, &answers(&[("p", "yes"), ("other", "1")]))
                .is_visible(&"c".into())
        );
    }

    #[test]
    fn disabled_parent_hides_children() {
        let mut fields = tree(&[("p", None), ("c", Some("p"))]);
        fields[0].logic_mut().enabled = false;

        assert_eq!(ids(&evaluate(&fields, &AnswerSet::new())), ["p"]);
    }

    #[test]
    fn hidden_parent_hides_grandchildren() {
        let mut fields = tree(&[("p", None), ("c", Some("p")), ("g", Some("c"))]);
        gate(&mut fields, "c", Condition::equals("p", "x"));

        assert_eq!(ids(&evaluate(&fields, &AnswerSet::new())), ["p"]);
        assert_eq!(
            ids(&evaluate(&fields, &answers(&[("p", "x")]))),
            ["p", "c", "g"]
        );
    }

    #[test]
    fn unknown_operator_hides_field() {
        let mut fields = tree(&[("p", None), ("c", Some("p"))]);
        gate(
            &mut fields,
            "c",
            Condition::new("p", ConditionOperator::Unknown("regex".into()), AnswerValue::from("x")),
        );

        assert_eq!(ids(&evaluate(&fields, &answers(&[("p", "x")]))), ["p"]);
    }

    #[test]
    fn dangling_parent_hides_orphan() {
        let mut fields = tree(&[("p", None), ("c", Some("p")), ("q", None)]);
        fields[1].logic_mut().parent_field_id = Some("gone".into());

        assert_eq!(ids(&evaluate(&fields, &AnswerSet::new())), ["p", "q"]);
    }

    #[test]
    fn backlink_mismatch_hides_child() {
        let mut fields = tree(&[("p", None), ("c", Some("p"))]);
        fields[0].logic_mut().child_fields.clear();

        assert_eq!(ids(&evaluate(&fields, &AnswerSet::new())), ["p"]);
    }

    #[test]
    fn parent_cycles_are_never_shown() {
        let mut fields = tree(&[("a", None), ("b", Some("a")), ("r", None)]);
        fields[0].logic_mut().parent_field_id = Some("b".into());
        fields[1].logic_mut().child_fields.push("a".into());

        assert_eq!(ids(&evaluate(&fields, &AnswerSet::new())), ["r"]);
    }

    #[test]
    fn evaluator_ignores_field_types() {
        // a text field cannot gain children through the factory, but stored
        // data that already has them is still honoured
        let mut fields = tree(&[("p", None), ("c", Some("p"))]);
        fields[0].field_type = crate::domain::field::FieldType::Text;

        assert_eq!(ids(&evaluate(&fields, &AnswerSet::new())), ["p", "c"]);
    }

    #[test]
    fn render_hints_mark_hidden_fields() {
        let mut fields = tree(&[("p", None), ("c", Some("p"))]);
        gate(&mut fields, "c", Condition::equals("p", "x"));

        let hinted = with_render_hints(&fields, &AnswerSet::new());

        assert!(!hinted[0].hidden);
        assert!(hinted[1].hidden);
    }
}
