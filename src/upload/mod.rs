//! Upload gateway — turns one file into a [`FileReference`].
//!
//! Two backends implement the same capability: durable blob storage and
//! inline `data:` URL encoding. The gateway picks the durable backend when it
//! is configured and falls back to inline encoding whenever storage fails, so
//! callers never see which one produced the reference.
//!
//! [`FileReference`]: crate::onboarding::FileReference

pub mod blob;
pub mod gateway;
pub mod inline;

use async_trait::async_trait;

use crate::error::StorageError;

pub use blob::BlobBackend;
pub use gateway::UploadGateway;
pub use inline::InlineBackend;

/// MIME type used when the client does not send one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Raw file bytes plus the metadata the browser supplied.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>, mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        Self {
            filename: filename.into(),
            mime_type: if mime_type.trim().is_empty() {
                DEFAULT_MIME_TYPE.to_string()
            } else {
                mime_type
            },
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// A place file bytes can be put, yielding a URL that serves them.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Store `file` and return a URL for its bytes.
    async fn store(&self, file: &IncomingFile) -> Result<String, StorageError>;
}
