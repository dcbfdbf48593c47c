use std::{io, path::Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::field::Field;

/// Error loading or saving a form configuration file.
#[derive(Debug, thiserror::Error)]
pub enum FormFileError {
    /// The file could not be read or written.
    #[error("failed to access form file: {0}")]
    Io(#[from] io::Error),

    /// The file is not a valid form configuration.
    #[error("failed to parse form file: {0}")]
    Json(#[from] serde_json::Error),
}

/// The field set of one form, with its identity and timestamps.
///
/// The configuration exclusively owns its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConfiguration {
    /// Stable identifier of the form.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// The fields, in stored order.
    #[serde(default)]
    fields: Vec<Field>,
    /// When the form was created.
    pub created_at: DateTime<Utc>,
    /// When the fields were last replaced.
    pub updated_at: DateTime<Utc>,
}

impl FormConfiguration {
    /// Creates an empty form.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            fields: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The form's fields.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Replaces the fields with the result of an edit.
    pub fn replace_fields(&mut self, fields: Vec<Field>) {
        self.fields = fields;
        self.updated_at = Utc::now();
    }

    /// Takes ownership of the fields.
    #[must_use]
    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }

    /// Reads a form from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid form.
    pub fn load(path: &Path) -> Result<Self, FormFileError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Writes the form to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), FormFileError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
