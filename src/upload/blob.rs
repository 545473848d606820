//! Durable blob-storage backend.
//!
//! Speaks the blob store's simple `PUT /<pathname>` API: the body is the raw
//! file, the bearer token authorizes the write, and the JSON response carries
//! the public URL.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::{IncomingFile, UploadBackend};
use crate::error::StorageError;

const BACKEND: &str = "blob";

#[derive(Debug, Deserialize)]
struct PutResponse {
    url: Option<String>,
}

/// Storage key for `filename`: the upload time in unix millis, a dash, then
/// the original name with path separators flattened.
pub fn storage_key(filename: &str, millis: i64) -> String {
    let safe: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{millis}-{safe}")
}

/// Blob store client.
pub struct BlobBackend {
    base_url: String,
    token: SecretString,
    client: reqwest::Client,
}

impl BlobBackend {
    pub fn new(base_url: impl Into<String>, token: SecretString) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl UploadBackend for BlobBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn store(&self, file: &IncomingFile) -> Result<String, StorageError> {
        let key = storage_key(&file.filename, chrono::Utc::now().timestamp_millis());
        let url = format!("{}/{}", self.base_url, key);
        debug!(key = %key, size = file.size(), "Uploading to blob storage");

        let resp = self
            .client
            .put(&url)
            .bearer_auth(self.token.expose_secret())
            .header("x-content-type", &file.mime_type)
            .header("x-add-random-suffix", "0")
            .body(file.bytes.clone())
            .send()
            .await
            .map_err(|e| StorageError::RequestFailed {
                backend: BACKEND.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StorageError::Status {
                backend: BACKEND.to_string(),
                status: status.as_u16(),
            });
        }

        let parsed: PutResponse = resp.json().await.map_err(|e| StorageError::InvalidResponse {
            backend: BACKEND.to_string(),
            reason: e.to_string(),
        })?;

        parsed
            .url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| StorageError::InvalidResponse {
                backend: BACKEND.to_string(),
                reason: "response has no url".to_string(),
            })
    }
}
