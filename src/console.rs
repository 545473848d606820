//! Console wizard — walks the onboarding flow over a line-based terminal.
//!
//! Typing a value and pressing Enter stores it and moves on; an empty line
//! moves on without changing anything. Notes are multi-line and end with a
//! line holding a single `.`. `:back` and `:quit` work everywhere.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::error::{Result, WizardError};
use crate::onboarding::{Field, FieldValue, Step, StepKind, Wizard, normalize_hex_color};
use crate::submission::Forwarder;
use crate::upload::{DEFAULT_MIME_TYPE, IncomingFile, UploadGateway};

/// How a console session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleOutcome {
    /// Submitted; carries the endpoint's acknowledgment.
    Submitted(serde_json::Value),
    Quit,
    /// Input ran out before the wizard finished.
    InputClosed,
}

/// Guess a MIME type from a file extension.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => DEFAULT_MIME_TYPE,
    }
}

pub struct ConsoleWizard<R, W> {
    wizard: Wizard,
    uploads: UploadGateway,
    forwarder: Arc<dyn Forwarder>,
    lines: Lines<R>,
    out: W,
    notes: Vec<String>,
}

impl<R, W> ConsoleWizard<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(
        wizard: Wizard,
        uploads: UploadGateway,
        forwarder: Arc<dyn Forwarder>,
        input: R,
        out: W,
    ) -> Self {
        Self {
            wizard,
            uploads,
            forwarder,
            lines: input.lines(),
            out,
            notes: Vec::new(),
        }
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    /// Drive the wizard until it is submitted, the user quits or input ends.
    pub async fn run(&mut self) -> Result<ConsoleOutcome> {
        self.render()?;
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Ok(ConsoleOutcome::InputClosed);
            };
            let line = line.trim_end_matches('\r');
            let before = self.wizard.current_index();

            match line.trim() {
                ":quit" => return Ok(ConsoleOutcome::Quit),
                ":back" => {
                    let outcome = self.wizard.retreat().map(|_| ());
                    self.report(outcome)?;
                }
                _ => {
                    if let Some(ack) = self.handle(line).await? {
                        self.render()?;
                        return Ok(ConsoleOutcome::Submitted(ack));
                    }
                }
            }

            if self.wizard.current_index() != before {
                self.notes.clear();
                self.render()?;
            }
        }
    }

    /// Apply one input line to the current step. Returns the acknowledgment
    /// once the wizard has been submitted.
    async fn handle(&mut self, line: &str) -> Result<Option<serde_json::Value>> {
        let step = self.wizard.current_step().clone();
        let input = line.trim();

        match (&step.kind, step.field) {
            (StepKind::Review, _) => {
                if input.eq_ignore_ascii_case("submit") {
                    writeln!(self.out, "Submitting...")?;
                    match self.wizard.submit(self.forwarder.as_ref()).await {
                        Ok(ack) => return Ok(Some(ack)),
                        Err(e) => {
                            writeln!(self.out, "! {e}")?;
                            writeln!(self.out, "Type `submit` to try again.")?;
                        }
                    }
                } else {
                    writeln!(self.out, "Type `submit` to send, or `:back` to edit.")?;
                }
            }
            (StepKind::TextArea { .. }, Some(field)) => {
                if input == "." {
                    let text = self.notes.join("\n");
                    let outcome = self
                        .wizard
                        .update_field(field, FieldValue::Text(text))
                        .and_then(|()| self.wizard.advance().map(|_| ()));
                    self.report(outcome)?;
                } else {
                    self.notes.push(line.to_string());
                }
            }
            (StepKind::Choice { choices }, _) if !input.is_empty() => {
                let picked = input
                    .parse::<usize>()
                    .ok()
                    .filter(|n| (1..=choices.len()).contains(n));
                match picked {
                    Some(n) => {
                        let outcome = self.wizard.choose(n - 1).map(|_| ());
                        self.report(outcome)?;
                    }
                    None => writeln!(self.out, "! Pick a number from 1 to {}", choices.len())?,
                }
            }
            (StepKind::Color, _) if !input.is_empty() => {
                let outcome = self.set_colors(input).and_then(|()| self.wizard.advance().map(|_| ()));
                self.report(outcome)?;
            }
            (StepKind::File { .. } | StepKind::MultiFile { .. }, Some(field)) if !input.is_empty() => {
                if input == ":clear" {
                    let outcome = self.wizard.remove_file(field, None);
                    self.report(outcome)?;
                } else {
                    self.attach(&step, field, input).await?;
                }
            }
            (StepKind::Text { .. } | StepKind::Url { .. }, Some(field)) if !input.is_empty() => {
                let outcome = self
                    .wizard
                    .update_field(field, FieldValue::Text(input.to_string()))
                    .and_then(|()| self.wizard.advance().map(|_| ()));
                self.report(outcome)?;
            }
            _ => {
                let outcome = self.wizard.advance().map(|_| ());
                self.report(outcome)?;
            }
        }
        Ok(None)
    }

    fn set_colors(&mut self, input: &str) -> std::result::Result<(), WizardError> {
        let mut parts = input.split_whitespace();
        if let Some(primary) = parts.next() {
            let value = normalize_hex_color(primary)?;
            self.wizard.update_field(Field::PrimaryColor, FieldValue::Text(value))?;
        }
        if let Some(secondary) = parts.next() {
            let value = normalize_hex_color(secondary)?;
            self.wizard.update_field(Field::SecondaryColor, FieldValue::Text(value))?;
        }
        Ok(())
    }

    async fn attach(&mut self, step: &Step, field: Field, raw_path: &str) -> Result<()> {
        let path = Path::new(raw_path);
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                writeln!(self.out, "! Cannot read {}: {e}", path.display())?;
                return Ok(());
            }
        };
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = IncomingFile::new(bytes, filename, guess_mime(path));

        writeln!(self.out, "Uploading {}...", file.filename)?;
        match self.wizard.upload(&self.uploads, field, file).await {
            Ok(reference) => {
                writeln!(self.out, "✓ {} ({} bytes)", reference.filename, reference.size)?;
                if matches!(step.kind, StepKind::File { .. }) {
                    let outcome = self.wizard.advance().map(|_| ());
                    self.report(outcome)?;
                } else {
                    writeln!(
                        self.out,
                        "{} file(s) attached. Add another path or press Enter to continue.",
                        self.wizard.answers().additional_docs.len()
                    )?;
                }
            }
            Err(e) => writeln!(self.out, "! {e}")?,
        }
        Ok(())
    }

    fn report(&mut self, outcome: std::result::Result<(), WizardError>) -> std::io::Result<()> {
        match outcome {
            Ok(()) => Ok(()),
            Err(WizardError::StepIncomplete { .. }) => {
                writeln!(self.out, "! This step is required.")
            }
            Err(e) => writeln!(self.out, "! {e}"),
        }
    }

    fn render(&mut self) -> std::io::Result<()> {
        let step = self.wizard.current_step().clone();
        let progress = self.wizard.progress();

        writeln!(self.out)?;
        writeln!(self.out, "{} ({:.0}%)", progress.label(), progress.percent)?;
        writeln!(self.out, "{}", step.prompt)?;
        if let Some(description) = &step.description {
            writeln!(self.out, "{description}")?;
        }

        match &step.kind {
            StepKind::Instruction { email, platforms } => {
                writeln!(self.out, "  Team member: {email}")?;
                for platform in platforms {
                    writeln!(self.out, "  • {platform}")?;
                }
            }
            StepKind::Choice { choices } => {
                for (i, choice) in choices.iter().enumerate() {
                    writeln!(self.out, "  {}) {}", i + 1, choice.label)?;
                }
            }
            StepKind::Color => {
                let answers = self.wizard.answers();
                writeln!(
                    self.out,
                    "  Current: {} / {}. Enter `<primary> [secondary]`.",
                    answers.primary_color, answers.secondary_color
                )?;
            }
            StepKind::File { accept } | StepKind::MultiFile { accept } => {
                writeln!(self.out, "  Enter a file path ({}).", accept.join(", "))?;
            }
            StepKind::TextArea { .. } => {
                writeln!(self.out, "  Finish with a line containing only `.`")?;
            }
            StepKind::Review => {
                write!(self.out, "{}", self.wizard.review().to_text())?;
                writeln!(self.out, "Type `submit` to send, or `:back` to edit.")?;
            }
            _ => {}
        }

        if step.field.is_some() && !step.is_review() {
            writeln!(self.out, "[Enter] {}", self.wizard.continue_label())?;
        }
        self.out.flush()
    }
}
