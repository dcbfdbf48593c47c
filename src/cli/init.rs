use std::path::Path;

use formwork::{Config, FormConfiguration};
use tracing::instrument;

use crate::cli::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The display name of the form
    #[arg(long, default_value = "Untitled form")]
    name: String,
}

impl Command {
    /// Writes an empty form, and a default config file if a config path was
    /// given and nothing is there yet.
    #[instrument]
    pub fn run(self, form_path: &Path, config_path: Option<&Path>) -> anyhow::Result<()> {
        if form_path.exists() {
            anyhow::bail!("Form already exists at {}", form_path.display());
        }

        let form = FormConfiguration::new(self.name);
        form.save(form_path)
            .map_err(|e| anyhow::anyhow!("Failed to create form: {e}"))?;
        println!(
            "{}",
            format!("Created form {} at {}", form.name, form_path.display()).success()
        );

        if let Some(config_path) = config_path.filter(|path| !path.exists()) {
            Config::default()
                .save(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to create config: {e}"))?;
            println!("  Created: {}", config_path.display());
        }

        Ok(())
    }
}
