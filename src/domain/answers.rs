use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    field::{Field, FieldId},
    visibility,
};

/// Reference to an uploaded file held by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Original file name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type, if known.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// The value entered for a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Checkbox state.
    Bool(bool),
    /// Numeric input.
    Number(f64),
    /// Free text, or a single selected option.
    Text(String),
    /// Several selected options.
    List(Vec<String>),
    /// An attached file.
    File(FileRef),
}

impl AnswerValue {
    /// Whether the value counts as "not answered".
    ///
    /// Blank text, empty selections and an unticked checkbox are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bool(checked) => !checked,
            Self::Number(_) | Self::File(_) => false,
            Self::Text(text) => text.trim().is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }

    /// The value rendered as text, for scalar values.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Bool(checked) => Some(checked.to_string()),
            Self::Number(number) => Some(number.to_string()),
            Self::Text(text) => Some(text.clone()),
            Self::List(_) | Self::File(_) => None,
        }
    }

    /// The value as a number, parsing text where possible.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(text) => text.trim().parse().ok(),
            Self::Bool(_) | Self::List(_) | Self::File(_) => None,
        }
    }

    /// Equality that tolerates the representation differences between the
    /// condition editor and the inputs: `3` equals `"3"`, `true` equals
    /// `"true"`, and a selection equals the same options in any order.
    ///
    /// Text is only compared numerically against a number, so option
    /// strings such as `"1e3"` and `"1000"` stay distinct.
    #[must_use]
    pub fn loosely_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(a), Self::List(b)) => {
                a.iter().collect::<BTreeSet<_>>() == b.iter().collect::<BTreeSet<_>>()
            }
            (Self::List(items), scalar) | (scalar, Self::List(items)) => {
                items.len() == 1 && scalar.as_text().is_some_and(|text| items[0] == text)
            }
            (Self::File(a), Self::File(b)) => a == b,
            (Self::File(_), _) | (_, Self::File(_)) => false,
            (a, b) if a.as_text() == b.as_text() => true,
            (a @ Self::Number(_), b) | (a, b @ Self::Number(_)) => {
                match (a.as_number(), b.as_number()) {
                    #[allow(clippy::float_cmp)]
                    (Some(x), Some(y)) if x.is_finite() && y.is_finite() => x == y,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// The answers entered during one form session, keyed by field.
///
/// Lives only as long as the session; it is never stored with the form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    values: HashMap<FieldId, AnswerValue>,
}

impl AnswerSet {
    /// Creates an empty answer set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an answer set seeded from each field's default value.
    #[must_use]
    pub fn seeded(fields: &[Field]) -> Self {
        let values = fields
            .iter()
            .filter_map(|field| {
                field
                    .default_value
                    .clone()
                    .map(|value| (field.id.clone(), value))
            })
            .collect();
        Self { values }
    }

    /// The answer recorded for a field.
    #[must_use]
    pub fn get(&self, id: &FieldId) -> Option<&AnswerValue> {
        self.values.get(id)
    }

    /// Records an answer, returning the previous one.
    pub fn set(&mut self, id: FieldId, value: AnswerValue) -> Option<AnswerValue> {
        self.values.insert(id, value)
    }

    /// Removes an answer, returning it.
    pub fn clear(&mut self, id: &FieldId) -> Option<AnswerValue> {
        self.values.remove(id)
    }

    /// Whether a field has an answer.
    #[must_use]
    pub fn contains(&self, id: &FieldId) -> bool {
        self.values.contains_key(id)
    }

    /// Number of recorded answers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no answers are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the recorded answers.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldId, &AnswerValue)> {
        self.values.iter()
    }

    /// Records an edit and clears the answers of every field the edit hid.
    ///
    /// Clearing an answer can itself hide further fields (a grandchild gated
    /// on a child's answer), so this repeats until nothing else disappears.
    /// Passing `None` clears the edited field.
    ///
    /// Returns the ids of the fields that became hidden.
    pub fn apply_change(
        &mut self,
        fields: &[Field],
        id: FieldId,
        value: Option<AnswerValue>,
    ) -> BTreeSet<FieldId> {
        let before = self.clone();
        match value {
            Some(value) => {
                self.set(id, value);
            }
            None => {
                self.clear(&id);
            }
        }

        let mut hidden = BTreeSet::new();
        let mut previous = before;
        loop {
            let newly_hidden = visibility::fields_to_hide(fields, &previous, self);
            let newly_hidden: BTreeSet<_> = newly_hidden.difference(&hidden).cloned().collect();
            if newly_hidden.is_empty() {
                break;
            }
            previous = self.clone();
            for id in &newly_hidden {
                if let Some(value) = self.clear(id) {
                    debug!(field = %id, ?value, "cleared answer of hidden field");
                }
            }
            hidden.extend(newly_hidden);
        }
        hidden
    }
}

impl FromIterator<(FieldId, AnswerValue)> for AnswerSet {
    fn from_iter<T: IntoIterator<Item = (FieldId, AnswerValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{condition::Condition, field::FieldType};

    fn child_of(id: &str, parent: &str, level: u8, show_when: &str) -> Field {
        let mut field = Field::new(id, FieldType::Dropdown);
        let logic = field.logic_mut();
        logic.enabled = true;
        logic.parent_field_id = Some(parent.into());
        logic.nesting_level = level;
        logic.conditions = vec![Condition::equals(parent, show_when)];
        field
    }

    fn chain() -> Vec<Field> {
        let mut device = Field::new("device", FieldType::Dropdown);
        device.logic_mut().enabled = true;
        device.logic_mut().child_fields = vec!["os".into()];

        let mut os = child_of("os", "device", 1, "Laptop");
        os.logic_mut().child_fields = vec!["version".into()];
        os.order = 1;

        let mut version = child_of("version", "os", 2, "Linux");
        version.order = 2;

        vec![device, os, version]
    }

    #[test]
    fn untagged_values_deserialize() {
        let answers: AnswerSet = serde_json::from_str(
            r#"{ "a": "text", "b": 4, "c": true, "d": ["x", "y"], "e": { "name": "log.txt", "size": 12 } }"#,
        )
        .unwrap();

        assert_eq!(answers.get(&"a".into()), Some(&AnswerValue::from("text")));
        assert_eq!(answers.get(&"b".into()), Some(&AnswerValue::Number(4.0)));
        assert_eq!(answers.get(&"c".into()), Some(&AnswerValue::Bool(true)));
        assert!(matches!(answers.get(&"d".into()), Some(AnswerValue::List(items)) if items.len() == 2));
        assert!(matches!(answers.get(&"e".into()), Some(AnswerValue::File(file)) if file.size == 12));
    }

    #[test]
    fn seeded_uses_default_values() {
        let mut fields = chain();
        fields[0].default_value = Some("Laptop".into());

        let answers = AnswerSet::seeded(&fields);

        assert_eq!(answers.len(), 1);
        assert_eq!(answers.get(&"device".into()), Some(&AnswerValue::from("Laptop")));
    }

    #[test]
    fn loose_equality() {
        assert!(AnswerValue::Number(2.0).loosely_equals(&"2".into()));
        assert!(AnswerValue::from(vec!["b".to_string(), "a".to_string()])
            .loosely_equals(&vec!["a".to_string(), "b".to_string()].into()));
        assert!(AnswerValue::from(vec!["a".to_string()]).loosely_equals(&"a".into()));
        assert!(!AnswerValue::from("a").loosely_equals(&"A".into()));
        assert!(!AnswerValue::from("1e3").loosely_equals(&"1000".into()));
    }

    #[test]
    fn apply_change_clears_hidden_descendants() {
        let fields = chain();
        let mut answers = AnswerSet::new();
        answers.apply_change(&fields, "device".into(), Some("Laptop".into()));
        answers.apply_change(&fields, "os".into(), Some("Linux".into()));
        answers.apply_change(&fields, "version".into(), Some("6.1".into()));

        let hidden = answers.apply_change(&fields, "device".into(), Some("Phone".into()));

        assert_eq!(
            hidden,
            BTreeSet::from([FieldId::from("os"), FieldId::from("version")])
        );
        assert!(!answers.contains(&"os".into()));
        assert!(!answers.contains(&"version".into()));
        assert_eq!(answers.get(&"device".into()), Some(&AnswerValue::from("Phone")));
    }

    #[test]
    fn apply_change_without_visibility_change_clears_nothing() {
        let fields = chain();
        let mut answers = AnswerSet::new();
        answers.apply_change(&fields, "device".into(), Some("Laptop".into()));

        let hidden = answers.apply_change(&fields, "os".into(), Some("Windows".into()));

        assert!(hidden.is_empty());
        assert_eq!(answers.len(), 2);
    }

    #[test]
    fn clearing_an_answer_hides_its_children() {
        let fields = chain();
        let mut answers = AnswerSet::new();
        answers.apply_change(&fields, "device".into(), Some("Laptop".into()));
        answers.apply_change(&fields, "os".into(), Some("Linux".into()));

        let hidden = answers.apply_change(&fields, "os".into(), None);

        assert_eq!(hidden, BTreeSet::from([FieldId::from("version")]));
    }
}
