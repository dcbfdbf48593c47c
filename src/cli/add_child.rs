use std::path::Path;

use formwork::{Config, FieldId, FieldType};
use tracing::instrument;

use crate::cli::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The id of the parent field
    parent: FieldId,

    /// The type of the new child field
    field_type: FieldType,
}

impl Command {
    #[instrument(skip(config))]
    pub fn run(self, form_path: &Path, config: &Config) -> anyhow::Result<()> {
        let id = super::edit_form(form_path, config, |editor| {
            Ok(editor.add_child(&self.parent, self.field_type)?)
        })?;

        println!(
            "Added {} field {} under {}",
            self.field_type,
            id.as_str().highlight(),
            self.parent.as_str().highlight()
        );
        Ok(())
    }
}
