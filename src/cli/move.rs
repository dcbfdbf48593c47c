use std::path::Path;

use formwork::{Config, FieldId};
use tracing::instrument;

use crate::cli::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The id of the field to move
    field: FieldId,

    /// The position to drop the field at
    ///
    /// Moving down places the field after the one currently at this
    /// position; moving up places it before.
    index: usize,
}

impl Command {
    #[instrument(skip(config))]
    pub fn run(self, form_path: &Path, config: &Config) -> anyhow::Result<()> {
        super::edit_form(form_path, config, |editor| {
            Ok(editor.move_field(&self.field, self.index)?)
        })?;

        println!(
            "{}",
            format!("Moved {} to position {}", self.field, self.index).success()
        );
        Ok(())
    }
}
