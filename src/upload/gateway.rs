//! Upload gateway — backend selection and the inline fallback policy.

use std::sync::Arc;

use tracing::{info, warn};

use super::{BlobBackend, IncomingFile, InlineBackend, UploadBackend};
use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::onboarding::FileReference;

/// Accepts one file and returns a [`FileReference`].
///
/// The backend is chosen once, at construction. Storage failures are logged
/// and absorbed by inline encoding; only unusable input is an error.
#[derive(Clone)]
pub struct UploadGateway {
    primary: Arc<dyn UploadBackend>,
    fallback: InlineBackend,
}

impl UploadGateway {
    pub fn new(primary: Arc<dyn UploadBackend>) -> Self {
        Self {
            primary,
            fallback: InlineBackend,
        }
    }

    /// Gateway that encodes every file inline.
    pub fn inline() -> Self {
        Self::new(Arc::new(InlineBackend))
    }

    /// Blob storage when a token is configured, inline encoding otherwise.
    pub fn from_config(config: &UploadConfig) -> Self {
        match &config.blob_token {
            Some(token) => {
                info!(base_url = %config.blob_base_url, "Uploads use blob storage");
                Self::new(Arc::new(BlobBackend::new(
                    config.blob_base_url.clone(),
                    token.clone(),
                )))
            }
            None => {
                info!("Blob storage not configured, uploads are encoded inline");
                Self::inline()
            }
        }
    }

    /// Name of the backend selected at construction.
    pub fn backend_name(&self) -> &'static str {
        self.primary.name()
    }

    /// Store `file` and describe it.
    pub async fn upload(&self, file: IncomingFile) -> Result<FileReference, UploadError> {
        if file.bytes.is_empty() || file.filename.trim().is_empty() {
            return Err(UploadError::EmptyFile {
                filename: file.filename,
            });
        }
        let filename = file.filename.clone();

        let url = match self.primary.store(&file).await {
            Ok(url) => url,
            Err(e) => {
                warn!(
                    backend = self.primary.name(),
                    filename = %filename,
                    error = %e,
                    "Storage upload failed, falling back to inline encoding"
                );
                // Inline encoding cannot fail.
                self.fallback
                    .store(&file)
                    .await
                    .map_err(|e| UploadError::Unreadable(e.to_string()))?
            }
        };

        info!(
            backend = self.primary.name(),
            filename = %filename,
            size = file.size(),
            inline = url.starts_with("data:"),
            "File uploaded"
        );

        Ok(FileReference {
            filename,
            url,
            mime_type: file.mime_type,
            size: file.bytes.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use secrecy::SecretString;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    use super::*;
    use crate::error::StorageError;
    use crate::upload::inline::decode_data_url;

    /// Echoes the requested pathname back as the stored URL.
    struct EchoUrl;

    impl Respond for EchoUrl {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": format!("https://store.example.com{}", request.url.path())
            }))
        }
    }

    struct Broken;

    #[async_trait]
    impl UploadBackend for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }
        async fn store(&self, _file: &IncomingFile) -> Result<String, StorageError> {
            Err(StorageError::RequestFailed {
                backend: "broken".into(),
                reason: "connection refused".into(),
            })
        }
    }

    fn logo() -> IncomingFile {
        IncomingFile::new(vec![0x89, b'P', b'N', b'G', 0, 1, 2], "logo.png", "image/png")
    }

    #[tokio::test]
    async fn configured_storage_returns_durable_link() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(EchoUrl)
            .expect(1)
            .mount(&server)
            .await;

        let gateway = UploadGateway::from_config(&UploadConfig {
            blob_token: Some(SecretString::from("token")),
            blob_base_url: server.uri(),
            ..UploadConfig::default()
        });
        assert_eq!(gateway.backend_name(), "blob");

        let reference = gateway.upload(logo()).await.unwrap();
        assert!(!reference.is_inline());
        let stored_name = reference.url.rsplit('/').next().unwrap();
        assert_ne!(stored_name, "logo.png");
        let (stamp, rest) = stored_name.split_once('-').unwrap();
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(rest, "logo.png");
        assert_eq!(reference.filename, "logo.png");
        assert_eq!(reference.mime_type, "image/png");
        assert_eq!(reference.size, 7);
    }

    #[tokio::test]
    async fn unconfigured_storage_encodes_inline() {
        let gateway = UploadGateway::from_config(&UploadConfig::default());
        assert_eq!(gateway.backend_name(), "inline");

        let input = logo();
        let len = input.bytes.len();
        let reference = gateway.upload(input).await.unwrap();
        assert!(reference.url.starts_with("data:image/png;base64,"));
        let (_, decoded) = decode_data_url(&reference.url).unwrap();
        assert_eq!(decoded.len(), len);
    }

    #[tokio::test]
    async fn failing_storage_falls_back_inline() {
        let gateway = UploadGateway::new(Arc::new(Broken));
        let reference = gateway.upload(logo()).await.unwrap();
        assert!(reference.is_inline());
        assert_eq!(reference.filename, "logo.png");
    }

    #[tokio::test]
    async fn storage_error_status_falls_back_inline() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let gateway = UploadGateway::new(Arc::new(BlobBackend::new(
            server.uri(),
            SecretString::from("token"),
        )));
        let reference = gateway.upload(logo()).await.unwrap();
        assert!(reference.url.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn empty_file_is_client_error() {
        let gateway = UploadGateway::inline();
        let err = gateway
            .upload(IncomingFile::new(Vec::new(), "empty.pdf", "application/pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::EmptyFile { .. }));
    }

    #[tokio::test]
    async fn blank_filename_is_client_error() {
        let gateway = UploadGateway::inline();
        for name in ["", "   "] {
            let err = gateway
                .upload(IncomingFile::new(vec![1, 2, 3], name, "application/pdf"))
                .await
                .unwrap_err();
            assert!(matches!(err, UploadError::EmptyFile { .. }), "{name:?}");
        }
    }

    #[tokio::test]
    async fn missing_mime_defaults_to_octet_stream() {
        let gateway = UploadGateway::inline();
        let reference = gateway
            .upload(IncomingFile::new(vec![1, 2], "blob.bin", ""))
            .await
            .unwrap();
        assert_eq!(reference.mime_type, "application/octet-stream");
        assert!(reference.url.starts_with("data:application/octet-stream;base64,"));
    }
}
