//! Inline backend — encodes bytes into a self-contained `data:` URL.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};

use super::{IncomingFile, UploadBackend};
use crate::error::StorageError;

/// Build `data:<mime>;base64,<payload>` for `bytes`.
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime_type};base64,{}",
        general_purpose::STANDARD.encode(bytes)
    )
}

/// Decode the payload of a base64 `data:` URL.
pub fn decode_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    let bytes = general_purpose::STANDARD.decode(payload).ok()?;
    Some((mime.to_string(), bytes))
}

/// Always available; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineBackend;

#[async_trait]
impl UploadBackend for InlineBackend {
    fn name(&self) -> &'static str {
        "inline"
    }

    async fn store(&self, file: &IncomingFile) -> Result<String, StorageError> {
        Ok(encode_data_url(&file.mime_type, &file.bytes))
    }
}
