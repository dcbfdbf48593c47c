//! Visibility conditions attached to child fields.
//!
//! A condition compares the current answer of one field against a fixed
//! value. Conditions fail closed: anything that cannot be compared, including
//! operators this crate does not know, evaluates to `false`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{answers::AnswerValue, field::FieldId};

/// How a condition compares an answer against its expected value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
    /// The answer equals the value.
    Equals,
    /// An answer is present and differs from the value.
    NotEquals,
    /// Text contains the value as a substring, or a list contains it as an
    /// element.
    Contains,
    /// An answer is present and does not contain the value.
    NotContains,
    /// The answer is one of the listed values.
    OneOf,
    /// The answer is numerically greater than the value.
    GreaterThan,
    /// The answer is numerically less than the value.
    LessThan,
    /// No answer, or a blank one.
    IsEmpty,
    /// A non-blank answer.
    IsNotEmpty,
    /// An operator this crate does not understand. Never matches.
    Unknown(String),
}

impl ConditionOperator {
    /// The serialized name of this operator.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::OneOf => "one_of",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::IsEmpty => "is_empty",
            Self::IsNotEmpty => "is_not_empty",
            Self::Unknown(name) => name,
        }
    }
}

impl From<String> for ConditionOperator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "equals" => Self::Equals,
            "not_equals" => Self::NotEquals,
            "contains" => Self::Contains,
            "not_contains" => Self::NotContains,
            "one_of" => Self::OneOf,
            "greater_than" => Self::GreaterThan,
            "less_than" => Self::LessThan,
            "is_empty" => Self::IsEmpty,
            "is_not_empty" => Self::IsNotEmpty,
            _ => Self::Unknown(value),
        }
    }
}

impl From<ConditionOperator> for String {
    fn from(operator: ConditionOperator) -> Self {
        match operator {
            ConditionOperator::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `{ field, operator, value }` triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// The field whose answer is inspected, normally the parent.
    pub field: FieldId,

    /// The comparison to perform.
    pub operator: ConditionOperator,

    /// The expected value. Unused by the emptiness operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<AnswerValue>,
}

impl Condition {
    /// Creates a condition.
    pub fn new(
        field: impl Into<FieldId>,
        operator: ConditionOperator,
        value: impl Into<Option<AnswerValue>>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Convenience constructor for the common "parent equals X" rule.
    pub fn equals(field: impl Into<FieldId>, value: impl Into<AnswerValue>) -> Self {
        Self::new(field, ConditionOperator::Equals, value.into())
    }

    /// Evaluates the condition against the inspected field's answer.
    #[must_use]
    pub fn is_satisfied_by(&self, answer: Option<&AnswerValue>) -> bool {
        match &self.operator {
            ConditionOperator::IsEmpty => answer.is_none_or(AnswerValue::is_empty),
            ConditionOperator::IsNotEmpty => answer.is_some_and(|a| !a.is_empty()),
            ConditionOperator::Unknown(_) => false,
            operator => {
                let (Some(answer), Some(expected)) = (answer, self.value.as_ref()) else {
                    return false;
                };
                compare(operator, answer, expected)
            }
        }
    }
}

fn compare(operator: &ConditionOperator, answer: &AnswerValue, expected: &AnswerValue) -> bool {
    match operator {
        ConditionOperator::Equals => answer.loosely_equals(expected),
        ConditionOperator::NotEquals => !answer.is_empty() && !answer.loosely_equals(expected),
        ConditionOperator::Contains => contains(answer, expected),
        ConditionOperator::NotContains => !answer.is_empty() && !contains(answer, expected),
        ConditionOperator::OneOf => one_of(answer, expected),
        ConditionOperator::GreaterThan => numeric(answer, expected).is_some_and(|(a, b)| a > b),
        ConditionOperator::LessThan => numeric(answer, expected).is_some_and(|(a, b)| a < b),
        ConditionOperator::IsEmpty | ConditionOperator::IsNotEmpty | ConditionOperator::Unknown(_) => {
            false
        }
    }
}

fn contains(answer: &AnswerValue, expected: &AnswerValue) -> bool {
    match (answer, expected) {
        (AnswerValue::Text(text), AnswerValue::Text(needle)) => text.contains(needle.as_str()),
        (AnswerValue::List(items), AnswerValue::List(needles)) => {
            !needles.is_empty() && needles.iter().all(|needle| items.contains(needle))
        }
        (AnswerValue::List(items), scalar) => scalar
            .as_text()
            .is_some_and(|needle| items.iter().any(|item| *item == needle)),
        _ => false,
    }
}

fn one_of(answer: &AnswerValue, expected: &AnswerValue) -> bool {
    let AnswerValue::List(allowed) = expected else {
        return answer.loosely_equals(expected);
    };
    match answer {
        AnswerValue::List(items) => items.iter().any(|item| allowed.contains(item)),
        scalar => scalar
            .as_text()
            .is_some_and(|text| allowed.iter().any(|item| *item == text)),
    }
}

fn numeric(answer: &AnswerValue, expected: &AnswerValue) -> Option<(f64, f64)> {
    Some((answer.as_number()?, expected.as_number()?))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn text(s: &str) -> AnswerValue {
        AnswerValue::Text(s.to_string())
    }

    fn list(items: &[&str]) -> AnswerValue {
        AnswerValue::List(items.iter().map(ToString::to_string).collect())
    }

    #[test_case(ConditionOperator::Equals, text("Laptop"), text("Laptop"), true; "equals text")]
    #[test_case(ConditionOperator::Equals, text("Desktop"), text("Laptop"), false; "equals other text")]
    #[test_case(ConditionOperator::Equals, AnswerValue::Number(3.0), text("3"), true; "equals number against text")]
    #[test_case(ConditionOperator::Equals, AnswerValue::Bool(true), text("true"), true; "equals checkbox")]
    #[test_case(ConditionOperator::NotEquals, text("Desktop"), text("Laptop"), true; "not equals")]
    #[test_case(ConditionOperator::NotEquals, text(""), text("Laptop"), false; "not equals blank")]
    #[test_case(ConditionOperator::Equals, text("NaN"), text("NaN"), true; "equals identical nan text")]
    #[test_case(ConditionOperator::NotEquals, text("NaN"), text("NaN"), false; "not equals identical nan text")]
    #[test_case(ConditionOperator::Equals, text("1000"), text("1e3"), false; "numeric looking options stay distinct")]
    #[test_case(ConditionOperator::NotEquals, text("1000"), text("1e3"), true; "not equals numeric looking options")]
    #[test_case(ConditionOperator::Equals, AnswerValue::Number(1000.0), text("1e3"), true; "number against exponent text")]
    #[test_case(ConditionOperator::Equals, AnswerValue::Number(f64::NAN), text("NaN"), true; "nan number renders as nan")]
    #[test_case(ConditionOperator::Equals, AnswerValue::Number(f64::INFINITY), text("infinity"), false; "non finite never compares numerically")]
    #[test_case(ConditionOperator::Contains, text("broken screen"), text("screen"), true; "substring")]
    #[test_case(ConditionOperator::Contains, list(&["a", "b"]), text("b"), true; "list element")]
    #[test_case(ConditionOperator::Contains, list(&["a"]), list(&["a", "b"]), false; "list subset")]
    #[test_case(ConditionOperator::NotContains, list(&["a"]), text("b"), true; "list lacks element")]
    #[test_case(ConditionOperator::OneOf, text("High"), list(&["High", "Urgent"]), true; "scalar one of")]
    #[test_case(ConditionOperator::OneOf, list(&["Low", "Urgent"]), list(&["High", "Urgent"]), true; "list overlaps")]
    #[test_case(ConditionOperator::OneOf, text("Low"), list(&["High", "Urgent"]), false; "scalar not in list")]
    #[test_case(ConditionOperator::GreaterThan, AnswerValue::Number(5.0), text("3"), true; "greater")]
    #[test_case(ConditionOperator::LessThan, text("2"), AnswerValue::Number(3.0), true; "less with text answer")]
    #[test_case(ConditionOperator::GreaterThan, text("many"), AnswerValue::Number(3.0), false; "non numeric")]
    fn operator_semantics(
        operator: ConditionOperator,
        answer: AnswerValue,
        expected: AnswerValue,
        outcome: bool,
    ) {
        let condition = Condition::new("parent", operator, expected);
        assert_eq!(condition.is_satisfied_by(Some(&answer)), outcome);
    }

    #[test]
    fn missing_answer_fails_comparisons() {
        for operator in [
            ConditionOperator::Equals,
            ConditionOperator::NotEquals,
            ConditionOperator::Contains,
            ConditionOperator::NotContains,
            ConditionOperator::OneOf,
        ] {
            let condition = Condition::new("parent", operator, text("x"));
            assert!(!condition.is_satisfied_by(None));
        }
    }

    #[test]
    fn emptiness_operators() {
        let empty = Condition::new("parent", ConditionOperator::IsEmpty, None);
        let not_empty = Condition::new("parent", ConditionOperator::IsNotEmpty, None);

        assert!(empty.is_satisfied_by(None));
        assert!(empty.is_satisfied_by(Some(&text("  "))));
        assert!(!not_empty.is_satisfied_by(None));
        assert!(not_empty.is_satisfied_by(Some(&list(&["a"]))));
    }

    #[test]
    fn unknown_operator_fails_closed() {
        let condition: Condition =
            serde_json::from_str(r#"{ "field": "p", "operator": "matches_regex", "value": "x" }"#)
                .unwrap();

        assert_eq!(
            condition.operator,
            ConditionOperator::Unknown("matches_regex".to_string())
        );
        assert!(!condition.is_satisfied_by(Some(&text("x"))));
        assert!(!condition.is_satisfied_by(None));
    }

    #[test]
    fn unknown_operator_round_trips_its_name() {
        let operator = ConditionOperator::Unknown("starts_with".to_string());
        let json = serde_json::to_string(&operator).unwrap();
        assert_eq!(json, r#""starts_with""#);
    }
}
