//! Webhook forwarder over reqwest.

use async_trait::async_trait;
use tracing::{info, warn};

use super::Forwarder;
use crate::config::WebhookConfig;
use crate::error::{ConfigError, SubmitError};

/// Maximum number of error-body characters written to the log.
const ERROR_BODY_LOG_CHARS: usize = 500;

/// Posts submissions to a webhook URL.
pub struct WebhookForwarder {
    url: String,
    client: reqwest::Client,
}

impl WebhookForwarder {
    pub fn new(config: &WebhookConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            url: config.url.clone(),
            client,
        })
    }
}

/// Generic acknowledgment used when the endpoint's body is empty or not JSON.
pub fn default_ack() -> serde_json::Value {
    serde_json::json!({ "success": true })
}

#[async_trait]
impl Forwarder for WebhookForwarder {
    async fn forward(&self, body: &serde_json::Value) -> Result<serde_json::Value, SubmitError> {
        let resp = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| SubmitError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let err_body = resp.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                body = %err_body.chars().take(ERROR_BODY_LOG_CHARS).collect::<String>(),
                "Webhook rejected submission"
            );
            return Err(SubmitError::Status {
                status: status.as_u16(),
            });
        }

        let text = resp.text().await.unwrap_or_default();
        let ack = serde_json::from_str(&text).unwrap_or_else(|_| default_ack());
        info!(status = status.as_u16(), "Submission forwarded to webhook");
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn forwarder(server: &MockServer) -> WebhookForwarder {
        WebhookForwarder::new(&WebhookConfig {
            url: format!("{}/webhook/onboarding", server.uri()),
            timeout: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn forwards_json_and_returns_ack() {
        let server = MockServer::start().await;
        let body = serde_json::json!({"submissionId": "CT-1"});
        Mock::given(method("POST"))
            .and(path("/webhook/onboarding"))
            .and(body_json(&body))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"received": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let ack = forwarder(&server).forward(&body).await.unwrap();
        assert_eq!(ack["received"], 1);
    }

    #[tokio::test]
    async fn unparseable_body_becomes_generic_ack() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Workflow was started"))
            .mount(&server)
            .await;

        let ack = forwarder(&server).forward(&serde_json::json!({})).await.unwrap();
        assert_eq!(ack, default_ack());
    }

    #[tokio::test]
    async fn empty_body_becomes_generic_ack() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let ack = forwarder(&server).forward(&serde_json::json!({})).await.unwrap();
        assert_eq!(ack, default_ack());
    }

    #[tokio::test]
    async fn non_success_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let err = forwarder(&server).forward(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, SubmitError::Status { status: 500 }));
    }

    #[tokio::test]
    async fn slow_endpoint_waits_without_configured_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"received": 1}))
                    .set_delay(Duration::from_millis(400)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let ack = forwarder(&server).forward(&serde_json::json!({})).await.unwrap();
        assert_eq!(ack["received"], 1);
    }

    #[tokio::test]
    async fn configured_timeout_bounds_the_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let forwarder = WebhookForwarder::new(&WebhookConfig {
            url: server.uri(),
            timeout: Some(Duration::from_millis(100)),
        })
        .unwrap();
        let err = forwarder.forward(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, SubmitError::Request(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_request_error() {
        let forwarder = WebhookForwarder::new(&WebhookConfig {
            url: "http://127.0.0.1:9/unreachable".into(),
            timeout: Some(Duration::from_secs(2)),
        })
        .unwrap();
        let err = forwarder.forward(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, SubmitError::Request(_)));
    }
}
