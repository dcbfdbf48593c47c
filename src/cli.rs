use std::path::{Path, PathBuf};

mod add;
mod add_child;
mod check;
mod delete;
mod init;
mod r#move;
mod show;
mod terminal;

use anyhow::Context;
use clap::ArgAction;
use formwork::{Config, FormConfiguration, FormEditor};
use tracing::debug;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The form file to operate on
    #[arg(short, long, default_value = "form.json", global = true)]
    form: PathBuf,

    /// A TOML file with editor settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Show(show::Command::default()))
            .run(&self.form, self.config.as_deref())
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Create an empty form
    Init(init::Command),

    /// Show the fields a respondent would see (default)
    Show(show::Command),

    /// Check the field hierarchy for integrity problems
    Check(check::Command),

    /// Add a top-level field
    Add(add::Command),

    /// Add a conditional child field under an existing field
    AddChild(add_child::Command),

    /// Move a field, together with its children, to a new position
    Move(r#move::Command),

    /// Delete a field and all of its children
    Delete(delete::Command),
}

impl Command {
    /// Runs the command. The config file is only read by commands that use
    /// it; `init` writes it instead.
    fn run(self, form: &Path, config_path: Option<&Path>) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => command.run(form, config_path)?,
            Self::Check(command) => command.run(form)?,
            Self::Show(command) => command.run(form, &load_config(config_path)?)?,
            Self::Add(command) => command.run(form, &load_config(config_path)?)?,
            Self::AddChild(command) => command.run(form, &load_config(config_path)?)?,
            Self::Move(command) => command.run(form, &load_config(config_path)?)?,
            Self::Delete(command) => command.run(form, &load_config(config_path)?)?,
        }
        Ok(())
    }
}

/// Loads the editor settings, falling back to the defaults.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    debug!(path = %path.display(), "loading config");
    Config::load(path).map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))
}

fn load_form(path: &Path) -> anyhow::Result<FormConfiguration> {
    FormConfiguration::load(path)
        .with_context(|| format!("failed to load form from {}", path.display()))
}

/// Loads a form, runs an edit against it, and writes it back.
///
/// Nothing is written if the edit fails.
fn edit_form<T>(
    path: &Path,
    config: &Config,
    edit: impl FnOnce(&mut FormEditor) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let mut form = load_form(path)?;
    let mut editor = FormEditor::new(form.fields().to_vec(), config.clone());

    let output = edit(&mut editor)?;

    form.replace_fields(editor.into_fields());
    form.save(path)
        .with_context(|| format!("failed to save form to {}", path.display()))?;
    Ok(output)
}
