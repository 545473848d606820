//! Configuration types, loaded from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default webhook target when `INTAKE_WEBHOOK_URL` is unset.
pub const DEFAULT_WEBHOOK_URL: &str = "http://127.0.0.1:5678/webhook/client-onboarding";

/// Default blob-storage API base.
pub const DEFAULT_BLOB_BASE_URL: &str = "https://blob.vercel-storage.com";

/// Default address of the team account clients are asked to invite.
pub const DEFAULT_ADMIN_EMAIL: &str = "onboarding@example.com";

/// Default request body ceiling for uploads (25 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub webhook: WebhookConfig,
    pub wizard: WizardConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load every section from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load every section through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            server: ServerConfig::from_lookup(&lookup)?,
            upload: UploadConfig::from_lookup(&lookup)?,
            webhook: WebhookConfig::from_lookup(&lookup)?,
            wizard: WizardConfig::from_lookup(&lookup),
            logging: LoggingConfig::from_lookup(&lookup),
        })
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl ServerConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = parse_var(lookup, "INTAKE_BIND", SocketAddr::from(([0, 0, 0, 0], 3000)))?;
        Ok(Self { bind })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

/// Upload gateway configuration.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Blob storage token. `None` selects the inline data-URL backend.
    pub blob_token: Option<SecretString>,
    /// Blob storage API base URL.
    pub blob_base_url: String,
    /// Maximum accepted request body size in bytes.
    pub max_bytes: usize,
}

impl UploadConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let blob_token = lookup("BLOB_READ_WRITE_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(SecretString::from);

        let blob_base_url = lookup("INTAKE_BLOB_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BLOB_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let max_bytes = parse_var(lookup, "INTAKE_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        Ok(Self {
            blob_token,
            blob_base_url,
            max_bytes,
        })
    }

    /// Whether durable blob storage is configured.
    pub fn blob_enabled(&self) -> bool {
        self.blob_token.is_some()
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            blob_token: None,
            blob_base_url: DEFAULT_BLOB_BASE_URL.to_string(),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Submission webhook configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    /// Client-side request timeout. Unset leaves timing to the transport.
    pub timeout: Option<Duration>,
}

impl WebhookConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("INTAKE_WEBHOOK_URL").unwrap_or_else(|| DEFAULT_WEBHOOK_URL.to_string());
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "INTAKE_WEBHOOK_URL".to_string(),
                message: format!("expected an http(s) URL, got {url:?}"),
            });
        }
        let timeout = lookup("INTAKE_WEBHOOK_TIMEOUT_SECS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| ConfigError::InvalidValue {
                        key: "INTAKE_WEBHOOK_TIMEOUT_SECS".to_string(),
                        message: e.to_string(),
                    })
            })
            .transpose()?;
        Ok(Self { url, timeout })
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WEBHOOK_URL.to_string(),
            timeout: None,
        }
    }
}

/// Wizard content configuration.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// E-mail address clients add to their platforms.
    pub admin_email: String,
    /// Prefix of generated submission ids (`<prefix>-<millis>`).
    pub submission_prefix: String,
}

impl WizardConfig {
    fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            admin_email: lookup("INTAKE_ADMIN_EMAIL").unwrap_or(defaults.admin_email),
            submission_prefix: lookup("INTAKE_SUBMISSION_PREFIX")
                .unwrap_or(defaults.submission_prefix),
        }
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            submission_prefix: "CT".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for a daily-rolling log file. Console-only when `None`.
    pub log_dir: Option<PathBuf>,
}

impl LoggingConfig {
    fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            log_dir: lookup("INTAKE_LOG_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.server.bind.port(), 3000);
        assert!(!config.upload.blob_enabled());
        assert_eq!(config.upload.max_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.webhook.url, DEFAULT_WEBHOOK_URL);
        assert!(config.webhook.timeout.is_none());
        assert_eq!(config.wizard.submission_prefix, "CT");
        assert!(config.logging.log_dir.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("INTAKE_BIND", "127.0.0.1:8081"),
            ("BLOB_READ_WRITE_TOKEN", "vercel_blob_rw_abc"),
            ("INTAKE_BLOB_BASE_URL", "http://localhost:9000/"),
            ("INTAKE_WEBHOOK_URL", "https://hooks.example.com/onboard"),
            ("INTAKE_WEBHOOK_TIMEOUT_SECS", "5"),
            ("INTAKE_ADMIN_EMAIL", "ops@example.com"),
            ("INTAKE_SUBMISSION_PREFIX", "ACME"),
            ("INTAKE_LOG_DIR", "/tmp/intake-logs"),
        ]))
        .unwrap();

        assert_eq!(config.server.bind.to_string(), "127.0.0.1:8081");
        assert!(config.upload.blob_enabled());
        assert_eq!(config.upload.blob_base_url, "http://localhost:9000");
        assert_eq!(config.webhook.url, "https://hooks.example.com/onboard");
        assert_eq!(config.webhook.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.wizard.admin_email, "ops@example.com");
        assert_eq!(config.wizard.submission_prefix, "ACME");
        assert_eq!(config.logging.log_dir, Some(PathBuf::from("/tmp/intake-logs")));
    }

    #[test]
    fn blank_blob_token_means_inline_storage() {
        let config = AppConfig::from_lookup(lookup_from(&[("BLOB_READ_WRITE_TOKEN", "   ")])).unwrap();
        assert!(!config.upload.blob_enabled());
    }

    #[test]
    fn malformed_number_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("INTAKE_MAX_UPLOAD_BYTES", "lots")]))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "INTAKE_MAX_UPLOAD_BYTES"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_webhook_timeout_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("INTAKE_WEBHOOK_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "INTAKE_WEBHOOK_TIMEOUT_SECS"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_http_webhook_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("INTAKE_WEBHOOK_URL", "ftp://nope")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
