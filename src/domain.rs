//! Domain models for conditional ticket forms.
//!
//! This module contains the field model, answer sets, and the pure
//! functions that evaluate visibility and edit the field hierarchy. Every
//! operation takes a snapshot of the field sequence and returns a new one.

/// Answer values and per-session answer sets.
pub mod answers;
pub use answers::{AnswerSet, AnswerValue, FileRef};

pub mod condition;
pub use condition::{Condition, ConditionOperator};

mod config;
pub use config::Config;

pub mod factory;
pub use factory::{
    CreateChildError, FieldCreated, FieldNotFound, FieldRemoved, create_child, insert_field,
    remove_field,
};

/// Form fields and their conditional-logic metadata.
pub mod field;
pub use field::{ConditionalLogic, Field, FieldId, FieldType, MAX_NESTING_LEVEL};

mod form;
pub use form::{FormConfiguration, FormFileError};

pub mod hierarchy;
pub use hierarchy::IntegrityIssue;

pub mod reorder;
pub use reorder::{MoveError, apply_move, can_move, check_move};

pub mod visibility;
pub use visibility::{Evaluation, evaluate, fields_to_hide};

#[cfg(test)]
pub(crate) mod testing;
