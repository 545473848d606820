//! Submission forwarding — hands the finished payload to the external
//! automation webhook.

pub mod webhook;

use async_trait::async_trait;

use crate::error::SubmitError;

pub use webhook::WebhookForwarder;

/// Sends a JSON body to the automation endpoint.
///
/// Returns the endpoint's acknowledgment. No retries: a failure is reported
/// once and the caller decides whether to resubmit.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, body: &serde_json::Value) -> Result<serde_json::Value, SubmitError>;
}
