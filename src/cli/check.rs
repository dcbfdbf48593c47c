use std::path::Path;

use formwork::{IntegrityIssue, domain::hierarchy};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Only print the number of problems
    #[arg(long, short)]
    quiet: bool,
}

impl Command {
    #[instrument]
    pub fn run(self, form_path: &Path) -> anyhow::Result<()> {
        let form = super::load_form(form_path)?;
        let issues = hierarchy::check_integrity(form.fields());

        if issues.is_empty() {
            println!("{}", "✅ No integrity problems found".success());
            return Ok(());
        }

        if !self.quiet {
            for issue in &issues {
                println!("  • {}", describe(issue));
            }
        }
        anyhow::bail!("{} integrity problem(s) found", issues.len())
    }
}

fn describe(issue: &IntegrityIssue) -> String {
    let text = issue.to_string();
    match issue {
        IntegrityIssue::DuplicateOrder(_) | IntegrityIssue::NestingMismatch { .. } => text.dim(),
        _ => text.warning(),
    }
}
