//! Stateless upload and submit endpoints, plus the assembled HTTP app.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::UploadError;
use crate::onboarding::{StepCatalog, WizardState, wizard_routes};
use crate::submission::Forwarder;
use crate::upload::{IncomingFile, UploadGateway};

/// Multipart part name carrying the file.
const FILE_PART: &str = "file";

/// Shared state for the stateless routes.
#[derive(Clone)]
pub struct ApiState {
    pub uploads: UploadGateway,
    pub forwarder: Arc<dyn Forwarder>,
}

/// Build the upload/submit routes.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/submit", post(submit))
        .with_state(state)
}

/// Build the whole application: stateless routes, the wizard session, body
/// limit and CORS.
pub fn build_router(
    config: &AppConfig,
    uploads: UploadGateway,
    forwarder: Arc<dyn Forwarder>,
) -> Router {
    let catalog = Arc::new(StepCatalog::standard(&config.wizard.admin_email));
    let wizard = WizardState::new(
        catalog,
        config.wizard.submission_prefix.clone(),
        uploads.clone(),
        Arc::clone(&forwarder),
    );

    api_routes(ApiState { uploads, forwarder })
        .merge(wizard_routes(wizard))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.upload.max_bytes))
        .layer(CorsLayer::permissive())
}

/// Pull the `file` part out of a multipart body.
pub(crate) async fn read_file_part(mut multipart: Multipart) -> Result<IncomingFile, UploadError> {
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Unreadable(e.to_string()))?
    {
        if part.name() != Some(FILE_PART) {
            continue;
        }
        let filename = part.file_name().unwrap_or_default().to_string();
        let mime_type = part.content_type().unwrap_or_default().to_string();
        let bytes = part
            .bytes()
            .await
            .map_err(|e| UploadError::Unreadable(e.to_string()))?;
        return Ok(IncomingFile::new(bytes.to_vec(), filename, mime_type));
    }
    Err(UploadError::NoFile)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "intake-wizard"
    }))
}

// ── Upload ──────────────────────────────────────────────────────────────

async fn upload(State(state): State<ApiState>, multipart: Multipart) -> Response {
    let file = match read_file_part(multipart).await {
        Ok(file) => file,
        Err(UploadError::NoFile) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "No file provided"})),
            )
                .into_response();
        }
        Err(e) => return upload_failed(e),
    };

    match state.uploads.upload(file).await {
        Ok(reference) => Json(serde_json::json!({
            "success": true,
            "url": reference.url,
            "filename": reference.filename,
            "size": reference.size,
            "type": reference.mime_type,
        }))
        .into_response(),
        Err(e) => upload_failed(e),
    }
}

fn upload_failed(e: UploadError) -> Response {
    warn!(error = %e, "Upload rejected");
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "error": "Failed to upload file",
            "details": e.to_string(),
        })),
    )
        .into_response()
}

// ── Submit ──────────────────────────────────────────────────────────────

async fn submit(State(state): State<ApiState>, Json(body): Json<serde_json::Value>) -> Response {
    match state.forwarder.forward(&body).await {
        Ok(ack) => {
            info!(
                submission_id = body.get("submissionId").and_then(|v| v.as_str()).unwrap_or("-"),
                "Submission accepted"
            );
            Json(serde_json::json!({
                "success": true,
                "message": "Form submitted successfully",
                "data": ack,
            }))
            .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "success": false,
                "message": "Failed to submit form",
                "error": e.to_string(),
            })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let forwarder = crate::submission::WebhookForwarder::new(&config.webhook).unwrap();
        build_router(&config, UploadGateway::inline(), Arc::new(forwarder))
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn multipart(part: &str, filename: &str, mime: &str, content: &[u8]) -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{part}\"; filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        Request::post("/api/upload")
            .header("content-type", format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let resp = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn upload_without_storage_returns_data_url() {
        let resp = app()
            .oneshot(multipart("file", "quote.pdf", "application/pdf", b"%PDF-1.4"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["filename"], "quote.pdf");
        assert_eq!(json["size"], 8);
        assert_eq!(json["type"], "application/pdf");
        assert!(json["url"].as_str().unwrap().starts_with("data:application/pdf;base64,"));
    }

    #[tokio::test]
    async fn upload_without_file_part_is_400() {
        let resp = app()
            .oneshot(multipart("other", "quote.pdf", "application/pdf", b"x"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "No file provided");
    }

    #[tokio::test]
    async fn empty_upload_is_400_with_details() {
        let resp = app()
            .oneshot(multipart("file", "empty.pdf", "application/pdf", b""))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "Failed to upload file");
        assert!(json["details"].as_str().unwrap().contains("empty"));
    }

    #[tokio::test]
    async fn upload_with_blank_filename_is_400() {
        let resp = app()
            .oneshot(multipart("file", "   ", "application/pdf", b"%PDF-1.4"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "Failed to upload file");
    }

    #[tokio::test]
    async fn file_part_without_filename_is_400() {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"\r\nContent-Type: application/pdf\r\n\r\n%PDF-1.4\r\n--{boundary}--\r\n"
        );
        let request = Request::post("/api/upload")
            .header("content-type", format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap();
        let resp = app().oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "Failed to upload file");
    }
}
