use std::path::Path;

use formwork::{Config, FieldType};
use tracing::instrument;

use crate::cli::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The type of field to add (e.g. text, dropdown, cc-users)
    field_type: FieldType,

    /// Insert at this position instead of appending
    ///
    /// A position inside another field's children is moved past them.
    #[arg(long)]
    at: Option<usize>,
}

impl Command {
    #[instrument(skip(config))]
    pub fn run(self, form_path: &Path, config: &Config) -> anyhow::Result<()> {
        let id = super::edit_form(form_path, config, |editor| {
            Ok(editor.add_field(self.field_type, self.at))
        })?;

        println!("Added {} field {}", self.field_type, id.as_str().highlight());
        Ok(())
    }
}
