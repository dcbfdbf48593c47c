use std::path::Path;

use anyhow::Context;
use clap::Parser;
use formwork::{
    AnswerSet, Config, Field,
    domain::{Evaluation, hierarchy},
};
use tracing::{instrument, warn};

use super::terminal::Colorize;

#[derive(Debug, Default, Parser)]
#[command(about = "Display the fields a respondent would see")]
pub struct Command {
    /// Answers as a JSON object keyed by field id, e.g. '{"device":"Laptop"}'
    #[arg(long, value_name = "JSON")]
    answers: Option<String>,

    /// Include hidden fields, dimmed
    #[arg(long)]
    all: bool,
}

impl Command {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, form_path: &Path, config: &Config) -> anyhow::Result<()> {
        let form = super::load_form(form_path)?;
        let fields = form.fields();
        if config.check_integrity_on_load {
            for issue in hierarchy::check_integrity(fields) {
                warn!(%issue, "form integrity problem");
            }
        }

        let answers = self.answers(fields)?;
        let evaluation = Evaluation::new(fields, &answers);

        println!("{}", form.name);
        for line in self.lines(fields, &evaluation) {
            if line.visible {
                println!("{}", line.text);
            } else {
                println!("{}", line.text.dim());
            }
        }
        if fields.is_empty() {
            println!("{}", "  (no fields)".dim());
        }
        Ok(())
    }

    /// Default answers, overridden by any given on the command line.
    fn answers(&self, fields: &[Field]) -> anyhow::Result<AnswerSet> {
        let mut answers = AnswerSet::seeded(fields);
        if let Some(json) = &self.answers {
            let given: AnswerSet =
                serde_json::from_str(json).context("--answers must be a JSON object")?;
            for (id, value) in given.iter() {
                answers.set(id.clone(), value.clone());
            }
        }
        Ok(answers)
    }

    fn lines(&self, fields: &[Field], evaluation: &Evaluation) -> Vec<Line> {
        if self.all {
            fields
                .iter()
                .map(|field| Line::new(field, evaluation.is_visible(&field.id)))
                .collect()
        } else {
            evaluation
                .visible()
                .iter()
                .map(|field| Line::new(field, true))
                .collect()
        }
    }
}

struct Line {
    text: String,
    visible: bool,
}

impl Line {
    fn new(field: &Field, visible: bool) -> Self {
        let indent = "  ".repeat(usize::from(field.nesting_level()) + 1);
        let label = if field.label.is_empty() {
            "(untitled)"
        } else {
            field.label.as_str()
        };
        let required = if field.required { " *" } else { "" };
        let text = format!(
            "{indent}{label}{required} ({}) [{}]",
            field.field_type, field.id
        );
        Self { text, visible }
    }
}
