use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{answers::AnswerValue, condition::Condition};

/// The deepest nesting level a field may occupy.
///
/// Roots sit at level 0, so three tiers are possible: root, child and
/// grandchild. A field at this level cannot own children.
pub const MAX_NESTING_LEVEL: u8 = 2;

/// Opaque, stable identifier of a form field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Allocates a fresh, globally unique identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("field_{}", Uuid::new_v4().simple()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FieldId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for FieldId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The kind of question a field asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    /// Single-line text.
    Text,
    /// Multi-line text.
    Textarea,
    /// Numeric input.
    Number,
    /// Email address.
    Email,
    /// Phone number.
    Phone,
    /// Web address.
    Url,
    /// Calendar date.
    Date,
    /// Single choice from a list.
    Dropdown,
    /// Multiple choices from a list.
    Multiselect,
    /// Single choice rendered as radio buttons.
    Radio,
    /// Boolean toggle.
    Checkbox,
    /// File attachment.
    File,
    /// Ticket priority picker.
    Priority,
    /// Ticket category picker.
    Category,
    /// Users to copy on the ticket.
    CcUsers,
}

impl FieldType {
    /// Every field type, in palette order.
    pub const ALL: [Self; 15] = [
        Self::Text,
        Self::Textarea,
        Self::Number,
        Self::Email,
        Self::Phone,
        Self::Url,
        Self::Date,
        Self::Dropdown,
        Self::Multiselect,
        Self::Radio,
        Self::Checkbox,
        Self::File,
        Self::Priority,
        Self::Category,
        Self::CcUsers,
    ];

    /// The serialized name of this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Number => "number",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Url => "url",
            Self::Date => "date",
            Self::Dropdown => "dropdown",
            Self::Multiselect => "multiselect",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::File => "file",
            Self::Priority => "priority",
            Self::Category => "category",
            Self::CcUsers => "cc-users",
        }
    }

    /// Whether fields of this type may own conditional children.
    #[must_use]
    pub const fn can_own_children(self) -> bool {
        matches!(
            self,
            Self::Number | Self::Dropdown | Self::Checkbox | Self::Category | Self::Multiselect
        )
    }

    /// Whether the type presents a list of options to pick from.
    #[must_use]
    pub const fn has_options(self) -> bool {
        matches!(self, Self::Dropdown | Self::Multiselect | Self::Radio)
    }

    const fn takes_placeholder(self) -> bool {
        matches!(
            self,
            Self::Text | Self::Textarea | Self::Number | Self::Email | Self::Phone | Self::Url
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognised field type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field type '{0}'")]
pub struct UnknownFieldType(pub String);

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| UnknownFieldType(s.to_string()))
    }
}

/// Parent/child metadata for fields taking part in conditional display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConditionalLogic {
    /// Children only become visible while this is set.
    pub enabled: bool,

    /// Back-reference to the owning field, absent on roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_field_id: Option<FieldId>,

    /// Conditions that must all hold for this field to be shown.
    pub conditions: Vec<Condition>,

    /// Forward references to directly owned children.
    ///
    /// Mirrors `parent_field_id` on each child.
    pub child_fields: Vec<FieldId>,

    /// Depth in the hierarchy, roots are 0.
    pub nesting_level: u8,
}

/// A single question on a ticket form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Stable identifier.
    pub id: FieldId,

    /// What kind of question this is.
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Display label.
    #[serde(default)]
    pub label: String,

    /// Placeholder shown in empty inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    /// Help text shown beneath the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,

    /// Whether an answer is mandatory.
    #[serde(default)]
    pub required: bool,

    /// Options for choice-like types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Value seeded into the answer set when a session starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<AnswerValue>,

    /// Position in the form.
    ///
    /// Contiguous from zero only immediately after normalization.
    #[serde(default)]
    pub order: i64,

    /// Render hint computed by the visibility evaluator. Never persisted.
    #[serde(skip)]
    pub hidden: bool,

    /// Present only on fields in a parent/child hierarchy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_logic: Option<ConditionalLogic>,
}

impl Field {
    /// Creates a root field with empty display strings.
    pub fn new(id: impl Into<FieldId>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            field_type,
            label: String::new(),
            placeholder: None,
            help_text: None,
            required: false,
            options: Vec::new(),
            default_value: None,
            order: 0,
            hidden: false,
            conditional_logic: None,
        }
    }

    /// The parent this field hangs off, if any.
    #[must_use]
    pub fn parent_id(&self) -> Option<&FieldId> {
        self.conditional_logic
            .as_ref()
            .and_then(|logic| logic.parent_field_id.as_ref())
    }

    /// Whether this field is a root of the hierarchy.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id().is_none()
    }

    /// Depth in the hierarchy.
    #[must_use]
    pub fn nesting_level(&self) -> u8 {
        self.conditional_logic
            .as_ref()
            .map_or(0, |logic| logic.nesting_level)
    }

    /// The children this field claims to own.
    #[must_use]
    pub fn child_ids(&self) -> &[FieldId] {
        self.conditional_logic
            .as_ref()
            .map_or(&[], |logic| logic.child_fields.as_slice())
    }

    /// The conditions gating this field's visibility.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        self.conditional_logic
            .as_ref()
            .map_or(&[], |logic| logic.conditions.as_slice())
    }

    /// Whether conditional display of this field's children is switched on.
    #[must_use]
    pub fn logic_enabled(&self) -> bool {
        self.conditional_logic
            .as_ref()
            .is_some_and(|logic| logic.enabled)
    }

    /// Whether this field may gain a child under the nesting rules.
    #[must_use]
    pub fn accepts_children(&self) -> bool {
        self.field_type.can_own_children() && self.nesting_level() < MAX_NESTING_LEVEL
    }

    /// Mutable access to the conditional logic, creating it if absent.
    pub fn logic_mut(&mut self) -> &mut ConditionalLogic {
        self.conditional_logic.get_or_insert_with(ConditionalLogic::default)
    }

    /// Fills cosmetic defaults for a freshly created field.
    ///
    /// Only empty display strings and option lists are touched.
    pub fn seed_defaults(&mut self) {
        if self.label.is_empty() {
            self.label = format!("New {} field", self.field_type);
        }
        if self.placeholder.is_none() && self.field_type.takes_placeholder() {
            self.placeholder = Some(format!("Enter {}", self.field_type));
        }
        if self.options.is_empty() && self.field_type.has_options() {
            self.options = vec!["Option 1".to_string(), "Option 2".to_string()];
        }
    }
}
