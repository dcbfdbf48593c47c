use std::path::Path;

use formwork::{Config, FieldId};
use tracing::instrument;

use crate::cli::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The id of the field to delete
    field: FieldId,
}

impl Command {
    #[instrument(skip(config))]
    pub fn run(self, form_path: &Path, config: &Config) -> anyhow::Result<()> {
        let removed =
            super::edit_form(form_path, config, |editor| Ok(editor.delete_field(&self.field)?))?;

        println!(
            "{}",
            format!("✅ Deleted {} field(s)", removed.len()).success()
        );
        for id in removed.iter().skip(1) {
            println!("  • {}", id.as_str().dim());
        }
        Ok(())
    }
}
