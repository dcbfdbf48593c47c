//! Conditional ticket forms
//!
//! A ticket form is a flat sequence of fields. Fields that can branch
//! (dropdowns, numbers, checkboxes and so on) may own child fields which are
//! only shown when their conditions match the parent's answer. This crate
//! evaluates which fields are visible, and validates edits to the hierarchy:
//! reordering, nesting new fields, and deleting them.

pub mod domain;
pub use domain::{
    AnswerSet, AnswerValue, Condition, ConditionOperator, Config, Field, FieldId, FieldType,
    FormConfiguration, IntegrityIssue, MoveError,
};

pub mod editor;
pub use editor::{DragSession, DragState, DropOutcome, DropRejection, FormEditor};
