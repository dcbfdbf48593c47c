//! Visibility evaluation and block moves over a large branching form.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use formwork::{
    AnswerSet, AnswerValue, Condition, Field, FieldType,
    domain::{apply_move, create_child, evaluate, insert_field},
};

/// Generates `roots` dropdowns, each with a shown and a hidden child, and a
/// grandchild under the shown one.
fn branching_form(roots: usize) -> (Vec<Field>, AnswerSet) {
    let mut fields = Vec::new();
    let mut answers = AnswerSet::new();
    for _ in 0..roots {
        let root = insert_field(&fields, FieldType::Dropdown, None);
        fields = root.fields;

        for (answer, child_type) in [("yes", FieldType::Number), ("no", FieldType::Text)] {
            let child = create_child(&fields, &root.new_field_id, child_type).unwrap();
            fields = child.fields;
            let child_field = fields
                .iter_mut()
                .find(|field| field.id == child.new_field_id)
                .unwrap();
            child_field
                .logic_mut()
                .conditions
                .push(Condition::equals(root.new_field_id.clone(), answer));

            if child_type.can_own_children() {
                let grandchild =
                    create_child(&fields, &child.new_field_id, FieldType::Textarea).unwrap();
                fields = grandchild.fields;
            }
        }
        answers.set(root.new_field_id, AnswerValue::from("yes"));
    }
    (fields, answers)
}

fn evaluate_visibility(c: &mut Criterion) {
    let (fields, answers) = branching_form(250);
    c.bench_function("evaluate 1000 fields", |b| {
        b.iter(|| evaluate(&fields, &answers).len());
    });
}

fn move_block(c: &mut Criterion) {
    let (fields, _) = branching_form(250);
    let first = fields[0].id.clone();
    let last = fields.len() - 1;
    c.bench_function("move block to end", |b| {
        b.iter_batched(
            || fields.clone(),
            |fields| apply_move(&fields, &first, last).unwrap(),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, evaluate_visibility, move_block);
criterion_main!(benches);
