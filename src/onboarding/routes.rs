//! REST endpoints driving the wizard session.
//!
//! The process holds one session. Long operations (uploads, submission) are
//! split into begin/finish halves so the session lock is never held across
//! network I/O; the engine's busy flags guard the gap.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::manager::Wizard;
use super::model::{Field, FieldKind, FieldValue, normalize_hex_color};
use super::steps::StepCatalog;
use crate::api::read_file_part;
use crate::error::{SubmitError, WizardError};
use crate::submission::Forwarder;
use crate::upload::UploadGateway;

/// Shared state for wizard routes.
#[derive(Clone)]
pub struct WizardState {
    pub wizard: Arc<Mutex<Wizard>>,
    pub catalog: Arc<StepCatalog>,
    pub submission_prefix: String,
    pub uploads: UploadGateway,
    pub forwarder: Arc<dyn Forwarder>,
}

impl WizardState {
    pub fn new(
        catalog: Arc<StepCatalog>,
        submission_prefix: impl Into<String>,
        uploads: UploadGateway,
        forwarder: Arc<dyn Forwarder>,
    ) -> Self {
        let submission_prefix = submission_prefix.into();
        let wizard = Wizard::new(Arc::clone(&catalog), submission_prefix.clone());
        Self {
            wizard: Arc::new(Mutex::new(wizard)),
            catalog,
            submission_prefix,
            uploads,
            forwarder,
        }
    }
}

/// Build the wizard REST routes.
pub fn wizard_routes(state: WizardState) -> Router {
    Router::new()
        .route("/api/wizard", get(get_wizard))
        .route("/api/wizard/steps", get(get_steps))
        .route("/api/wizard/review", get(get_review))
        .route("/api/wizard/advance", post(advance))
        .route("/api/wizard/retreat", post(retreat))
        .route("/api/wizard/choose", post(choose))
        .route("/api/wizard/fields/{field}", put(update_field))
        .route(
            "/api/wizard/files/{field}",
            post(upload_file).delete(clear_files),
        )
        .route("/api/wizard/files/{field}/{index}", delete(remove_file))
        .route("/api/wizard/submit", post(submit))
        .route("/api/wizard/reset", post(reset))
        .with_state(state)
}

fn status_for(error: &WizardError) -> StatusCode {
    match error {
        WizardError::StepIncomplete { .. }
        | WizardError::AtFirstStep
        | WizardError::AtLastStep
        | WizardError::SubmissionRequired
        | WizardError::NotOnReview
        | WizardError::Busy { .. }
        | WizardError::AlreadySubmitted => StatusCode::CONFLICT,
        WizardError::UnknownField(_) => StatusCode::NOT_FOUND,
        WizardError::FieldTypeMismatch { .. }
        | WizardError::InvalidValue { .. }
        | WizardError::NotAFileField(_)
        | WizardError::FileIndexOutOfRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        WizardError::UnsupportedFileType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        WizardError::Upload(_) => StatusCode::BAD_REQUEST,
        WizardError::Submit(_) => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(error: WizardError) -> Response {
    (
        status_for(&error),
        Json(serde_json::json!({"error": error.to_string()})),
    )
        .into_response()
}

fn session_reset() -> Response {
    (
        StatusCode::CONFLICT,
        Json(serde_json::json!({"error": "The session was reset while the request was running"})),
    )
        .into_response()
}

fn parse_field(raw: &str) -> Result<Field, Response> {
    raw.parse::<Field>().map_err(error_response)
}

// ── Read ────────────────────────────────────────────────────────────────

async fn get_wizard(State(state): State<WizardState>) -> impl IntoResponse {
    Json(state.wizard.lock().await.view())
}

async fn get_steps(State(state): State<WizardState>) -> impl IntoResponse {
    Json(state.catalog.as_ref().clone())
}

async fn get_review(State(state): State<WizardState>) -> impl IntoResponse {
    Json(state.wizard.lock().await.review())
}

// ── Navigation ──────────────────────────────────────────────────────────

async fn advance(State(state): State<WizardState>) -> Response {
    let mut wizard = state.wizard.lock().await;
    match wizard.advance() {
        Ok(_) => Json(wizard.view()).into_response(),
        Err(e) => error_response(e),
    }
}

async fn retreat(State(state): State<WizardState>) -> Response {
    let mut wizard = state.wizard.lock().await;
    match wizard.retreat() {
        Ok(_) => Json(wizard.view()).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
struct ChooseRequest {
    index: usize,
}

async fn choose(State(state): State<WizardState>, Json(body): Json<ChooseRequest>) -> Response {
    let mut wizard = state.wizard.lock().await;
    match wizard.choose(body.index) {
        Ok(_) => Json(wizard.view()).into_response(),
        Err(e) => error_response(e),
    }
}

// ── Answers ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct FieldUpdate {
    value: serde_json::Value,
}

fn decode_value(field: Field, value: serde_json::Value) -> Result<FieldValue, WizardError> {
    if field.is_color() {
        let raw = value.as_str().ok_or_else(|| WizardError::FieldTypeMismatch {
            field: field.to_string(),
            expected: "a string",
        })?;
        return normalize_hex_color(raw).map(FieldValue::Text);
    }
    FieldValue::from_json(field, value)
}

async fn update_field(
    State(state): State<WizardState>,
    Path(field): Path<String>,
    Json(body): Json<FieldUpdate>,
) -> Response {
    let field = match parse_field(&field) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let value = match decode_value(field, body.value) {
        Ok(v) => v,
        Err(e) => return error_response(e),
    };
    let mut wizard = state.wizard.lock().await;
    match wizard.update_field(field, value) {
        Ok(()) => Json(wizard.view()).into_response(),
        Err(e) => error_response(e),
    }
}

// ── Files ───────────────────────────────────────────────────────────────

async fn upload_file(
    State(state): State<WizardState>,
    Path(field): Path<String>,
    multipart: Multipart,
) -> Response {
    let field = match parse_field(&field) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let file = match read_file_part(multipart).await {
        Ok(file) => file,
        Err(e) => return error_response(e.into()),
    };

    let session_id = {
        let mut wizard = state.wizard.lock().await;
        if let Err(e) = wizard.begin_upload(field, &file.mime_type) {
            return error_response(e);
        }
        wizard.id()
    };

    let outcome = state.uploads.upload(file).await;

    let mut wizard = state.wizard.lock().await;
    if wizard.id() != session_id {
        warn!(session_id = %session_id, "Upload finished after session reset, discarding");
        return session_reset();
    }
    match wizard.finish_upload(field, outcome) {
        Ok(reference) => Json(serde_json::json!({
            "file": reference,
            "wizard": wizard.view(),
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn clear_files(State(state): State<WizardState>, Path(field): Path<String>) -> Response {
    let field = match parse_field(&field) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let mut wizard = state.wizard.lock().await;
    match wizard.remove_file(field, None) {
        Ok(()) => Json(wizard.view()).into_response(),
        Err(e) => error_response(e),
    }
}

async fn remove_file(
    State(state): State<WizardState>,
    Path((field, index)): Path<(String, usize)>,
) -> Response {
    let field = match parse_field(&field) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    if field.kind() != FieldKind::Files {
        return error_response(WizardError::InvalidValue {
            field: field.to_string(),
            reason: "only multi-file fields are indexed".to_string(),
        });
    }
    let mut wizard = state.wizard.lock().await;
    match wizard.remove_file(field, Some(index)) {
        Ok(()) => Json(wizard.view()).into_response(),
        Err(e) => error_response(e),
    }
}

// ── Submission ──────────────────────────────────────────────────────────

async fn submit(State(state): State<WizardState>) -> Response {
    let (session_id, payload) = {
        let mut wizard = state.wizard.lock().await;
        match wizard.begin_submit() {
            Ok(payload) => (wizard.id(), payload),
            Err(e) => return error_response(e),
        }
    };

    let outcome = match serde_json::to_value(&payload) {
        Ok(body) => state.forwarder.forward(&body).await,
        Err(e) => Err(SubmitError::from(e)),
    };

    let mut wizard = state.wizard.lock().await;
    if wizard.id() != session_id {
        warn!(session_id = %session_id, "Submission finished after session reset, discarding");
        return session_reset();
    }
    match wizard.finish_submit(outcome) {
        Ok(ack) => Json(serde_json::json!({
            "success": true,
            "submissionId": payload.submission_id,
            "data": ack,
            "wizard": wizard.view(),
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn reset(State(state): State<WizardState>) -> impl IntoResponse {
    let mut wizard = state.wizard.lock().await;
    let previous = wizard.id();
    *wizard = Wizard::new(Arc::clone(&state.catalog), state.submission_prefix.clone());
    info!(previous = %previous, session_id = %wizard.id(), "Onboarding session reset");
    Json(wizard.view())
}
