//! Wizard engine — owns one session's position, answers and busy flags.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::model::{AnswerSet, Field, FieldKind, FieldValue, FileReference};
use super::payload::SubmissionPayload;
use super::review::{Progress, ReviewSummary};
use super::state::{Direction, next_index, previous_index};
use super::steps::{Choice, Requirement, Step, StepCatalog, StepKind};
use crate::error::{SubmitError, UploadError, WizardError};
use crate::submission::Forwarder;
use crate::upload::{IncomingFile, UploadGateway};

/// One onboarding session.
///
/// Answers are held behind an `Arc` and replaced wholesale on every write, so
/// a snapshot taken with [`Wizard::answers`] never changes afterwards.
#[derive(Debug, Clone)]
pub struct Wizard {
    id: Uuid,
    catalog: Arc<StepCatalog>,
    index: usize,
    direction: Direction,
    answers: Arc<AnswerSet>,
    submission_prefix: String,
    is_submitting: bool,
    is_submitted: bool,
    uploading: Option<Field>,
}

impl Wizard {
    /// Start a session at the first step.
    ///
    /// # Panics
    ///
    /// Panics if `catalog` has no steps.
    pub fn new(catalog: Arc<StepCatalog>, submission_prefix: impl Into<String>) -> Self {
        assert!(!catalog.is_empty(), "wizard catalog must not be empty");
        let id = Uuid::new_v4();
        info!(session_id = %id, steps = catalog.len(), "Onboarding session started");
        Self {
            id,
            catalog,
            index: 0,
            direction: Direction::default(),
            answers: Arc::new(AnswerSet::default()),
            submission_prefix: submission_prefix.into(),
            is_submitting: false,
            is_submitted: false,
            uploading: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn catalog(&self) -> &Arc<StepCatalog> {
        &self.catalog
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_step(&self) -> &Step {
        &self.catalog.steps()[self.index]
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Snapshot of the current answers.
    pub fn answers(&self) -> Arc<AnswerSet> {
        Arc::clone(&self.answers)
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn is_submitted(&self) -> bool {
        self.is_submitted
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.is_some()
    }

    pub fn progress(&self) -> Progress {
        Progress::new(self.index, self.catalog.len())
    }

    pub fn review(&self) -> ReviewSummary {
        ReviewSummary::from_answers(&self.answers)
    }

    fn ensure_mutable(&self) -> Result<(), WizardError> {
        if self.is_submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.is_submitting {
            return Err(WizardError::Busy {
                operation: "submission",
            });
        }
        Ok(())
    }

    /// Whether the current step's completion gate is satisfied.
    ///
    /// Only required steps with a bound field can block. Multi-file steps
    /// never block, even when marked required.
    pub fn can_advance(&self) -> bool {
        let step = self.current_step();
        let Some(field) = step.field else {
            return true;
        };
        if !step.is_required() {
            return true;
        }
        match (&step.kind, self.answers.get(field)) {
            (StepKind::MultiFile { .. }, _) => true,
            (_, FieldValue::File(file)) => file.is_some(),
            (_, FieldValue::Text(text)) => !text.trim().is_empty(),
            _ => true,
        }
    }

    /// `"Skip"` for an explicitly optional step that is still empty.
    ///
    /// A multi-file list always counts as answered, even with nothing in it.
    pub fn continue_label(&self) -> &'static str {
        let step = self.current_step();
        let unanswered = |field| match self.answers.get(field) {
            FieldValue::Files(_) => false,
            value => value.is_empty(),
        };
        match step.field {
            Some(field) if step.requirement == Requirement::Optional && unanswered(field) => "Skip",
            _ => "Continue",
        }
    }

    /// Move forward, honouring the gate and skip rules. Returns the new index.
    pub fn advance(&mut self) -> Result<usize, WizardError> {
        self.ensure_mutable()?;
        let step = self.current_step();
        if step.is_review() {
            return Err(WizardError::SubmissionRequired);
        }
        if !self.can_advance() {
            return Err(WizardError::StepIncomplete {
                step: step.id.to_string(),
            });
        }
        let from = step.id;
        let next = next_index(&self.catalog, self.index, &self.answers)
            .ok_or(WizardError::AtLastStep)?;
        self.index = next;
        self.direction = Direction::Forward;
        debug!(
            session_id = %self.id,
            from = from,
            to = self.current_step().id,
            "Advanced"
        );
        Ok(next)
    }

    /// Move backward, mirroring the skip rules. Returns the new index.
    pub fn retreat(&mut self) -> Result<usize, WizardError> {
        self.ensure_mutable()?;
        let previous = previous_index(&self.catalog, self.index, &self.answers)
            .ok_or(WizardError::AtFirstStep)?;
        let from = self.current_step().id;
        self.index = previous;
        self.direction = Direction::Backward;
        debug!(
            session_id = %self.id,
            from = from,
            to = self.current_step().id,
            "Retreated"
        );
        Ok(previous)
    }

    /// Replace one field. The previous answer set is left untouched.
    pub fn update_field(&mut self, field: Field, value: FieldValue) -> Result<(), WizardError> {
        self.ensure_mutable()?;
        let next = self.answers.with(field, value)?;
        self.answers = Arc::new(next);
        Ok(())
    }

    /// Pick option `choice` of the current choice step and move on.
    pub fn choose(&mut self, choice: usize) -> Result<usize, WizardError> {
        let step = self.current_step();
        let (field, value) = match (&step.kind, step.field) {
            (StepKind::Choice { choices }, Some(field)) => {
                let Choice { value, .. } =
                    choices.get(choice).ok_or_else(|| WizardError::InvalidValue {
                        field: field.to_string(),
                        reason: format!("no choice #{choice}"),
                    })?;
                (field, *value)
            }
            _ => {
                return Err(WizardError::InvalidValue {
                    field: step.id.to_string(),
                    reason: "current step is not a choice".to_string(),
                });
            }
        };
        self.update_field(field, FieldValue::Flag(value))?;
        self.advance()
    }

    fn file_step(&self, field: Field) -> Result<&Step, WizardError> {
        if !matches!(field.kind(), FieldKind::File | FieldKind::Files) {
            return Err(WizardError::NotAFileField(field.to_string()));
        }
        self.catalog
            .step_for_field(field)
            .ok_or_else(|| WizardError::NotAFileField(field.to_string()))
    }

    /// Mark an upload into `field` as pending.
    ///
    /// Only one upload may be in flight; navigation stays available.
    pub fn begin_upload(&mut self, field: Field, mime_type: &str) -> Result<(), WizardError> {
        self.ensure_mutable()?;
        let step = self.file_step(field)?;
        if !step.accepts(mime_type) {
            return Err(WizardError::UnsupportedFileType {
                step: step.id.to_string(),
                mime: mime_type.to_string(),
            });
        }
        if let Some(pending) = self.uploading {
            debug!(session_id = %self.id, pending = %pending, "Upload rejected, another is pending");
            return Err(WizardError::Busy { operation: "upload" });
        }
        self.uploading = Some(field);
        Ok(())
    }

    /// Record the outcome of an upload started with [`Wizard::begin_upload`].
    ///
    /// The pending flag is always cleared. A single-file field is replaced,
    /// a multi-file field gets the reference appended.
    pub fn finish_upload(
        &mut self,
        field: Field,
        outcome: Result<FileReference, UploadError>,
    ) -> Result<FileReference, WizardError> {
        if self.uploading == Some(field) {
            self.uploading = None;
        }
        let reference = outcome?;
        let value = match self.answers.get(field) {
            FieldValue::Files(mut files) => {
                files.push(reference.clone());
                FieldValue::Files(files)
            }
            _ => FieldValue::File(Some(reference.clone())),
        };
        self.update_field(field, value)?;
        info!(
            session_id = %self.id,
            field = %field,
            filename = %reference.filename,
            "File attached"
        );
        Ok(reference)
    }

    /// Upload `file` through `gateway` and attach it to `field`.
    pub async fn upload(
        &mut self,
        gateway: &UploadGateway,
        field: Field,
        file: IncomingFile,
    ) -> Result<FileReference, WizardError> {
        self.begin_upload(field, &file.mime_type)?;
        let outcome = gateway.upload(file).await;
        self.finish_upload(field, outcome)
    }

    /// Detach a file. `index` selects an entry of a multi-file field and is
    /// ignored for single-file fields.
    pub fn remove_file(&mut self, field: Field, index: Option<usize>) -> Result<(), WizardError> {
        self.file_step(field)?;
        let value = match (self.answers.get(field), index) {
            (FieldValue::Files(mut files), Some(i)) => {
                if i >= files.len() {
                    return Err(WizardError::FileIndexOutOfRange {
                        field: field.to_string(),
                        index: i,
                    });
                }
                files.remove(i);
                FieldValue::Files(files)
            }
            (FieldValue::Files(_), None) => FieldValue::Files(Vec::new()),
            _ => FieldValue::File(None),
        };
        self.update_field(field, value)
    }

    /// Project the current answers into a submission payload.
    pub fn build_submission_payload(&self) -> SubmissionPayload {
        SubmissionPayload::project(&self.answers, &self.submission_prefix, chrono::Utc::now())
    }

    /// First half of a submission: validate, set the busy flag, build the payload.
    pub fn begin_submit(&mut self) -> Result<SubmissionPayload, WizardError> {
        self.ensure_mutable()?;
        if !self.current_step().is_review() {
            return Err(WizardError::NotOnReview);
        }
        if self.uploading.is_some() {
            return Err(WizardError::Busy { operation: "upload" });
        }
        self.is_submitting = true;
        let payload = self.build_submission_payload();
        info!(
            session_id = %self.id,
            submission_id = %payload.submission_id,
            "Submitting onboarding"
        );
        Ok(payload)
    }

    /// Second half of a submission. Always clears the busy flag; on success
    /// the wizard moves to the thank-you step, on failure it stays on review.
    pub fn finish_submit(
        &mut self,
        outcome: Result<serde_json::Value, SubmitError>,
    ) -> Result<serde_json::Value, WizardError> {
        self.is_submitting = false;
        match outcome {
            Ok(ack) => {
                self.is_submitted = true;
                self.index = (self.index + 1).min(self.catalog.last_index());
                self.direction = Direction::Forward;
                info!(session_id = %self.id, "Onboarding submitted");
                Ok(ack)
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Onboarding submission failed");
                Err(e.into())
            }
        }
    }

    /// Submit through `forwarder` in one call.
    pub async fn submit(&mut self, forwarder: &dyn Forwarder) -> Result<serde_json::Value, WizardError> {
        let payload = self.begin_submit()?;
        let outcome = match serde_json::to_value(&payload) {
            Ok(body) => forwarder.forward(&body).await,
            Err(e) => Err(SubmitError::from(e)),
        };
        self.finish_submit(outcome)
    }

    /// Serializable view of the session for renderers.
    pub fn view(&self) -> WizardView {
        let step = self.current_step();
        WizardView {
            session_id: self.id,
            index: self.index,
            step: step.clone(),
            progress: self.progress(),
            progress_label: self.progress().label(),
            can_advance: self.can_advance(),
            continue_label: self.continue_label(),
            submits_on_enter: step.submits_on_enter(),
            direction: self.direction,
            is_submitting: self.is_submitting,
            is_submitted: self.is_submitted,
            is_uploading: self.is_uploading(),
            answers: (*self.answers).clone(),
        }
    }
}

/// What a renderer needs to draw the current step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub session_id: Uuid,
    pub index: usize,
    pub step: Step,
    pub progress: Progress,
    pub progress_label: String,
    pub can_advance: bool,
    pub continue_label: &'static str,
    pub submits_on_enter: bool,
    pub direction: Direction,
    pub is_submitting: bool,
    pub is_submitted: bool,
    pub is_uploading: bool,
    pub answers: AnswerSet,
}
