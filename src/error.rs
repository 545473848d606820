//! Error types for the intake wizard.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Submission error: {0}")]
    Submit(#[from] SubmitError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Wizard engine errors.
///
/// None of these are fatal: the session keeps every answer and the user can
/// retry the step-local action.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Step '{step}' is required and has no answer yet")]
    StepIncomplete { step: String },

    #[error("Already at the first step")]
    AtFirstStep,

    #[error("Already at the last step")]
    AtLastStep,

    #[error("The review step can only be left by submitting")]
    SubmissionRequired,

    #[error("Submission is only possible from the review step")]
    NotOnReview,

    #[error("Another {operation} is in progress")]
    Busy { operation: &'static str },

    #[error("The onboarding has already been submitted")]
    AlreadySubmitted,

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field {field} expects {expected}")]
    FieldTypeMismatch { field: String, expected: &'static str },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Field {0} does not hold files")]
    NotAFileField(String),

    #[error("No file at index {index} in {field}")]
    FileIndexOutOfRange { field: String, index: usize },

    #[error("File type {mime} is not accepted by step '{step}'")]
    UnsupportedFileType { step: String, mime: String },

    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("Submission failed: {0}")]
    Submit(#[from] SubmitError),
}

/// Errors reported to the caller of the upload gateway.
///
/// Storage failures never surface here; they are absorbed by the inline
/// fallback.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file provided")]
    NoFile,

    #[error("File {filename:?} is empty")]
    EmptyFile { filename: String },

    #[error("Could not read uploaded file: {0}")]
    Unreadable(String),
}

/// Durable storage backend errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage request to {backend} failed: {reason}")]
    RequestFailed { backend: String, reason: String },

    #[error("Storage backend {backend} responded with status {status}")]
    Status { backend: String, status: u16 },

    #[error("Invalid response from {backend}: {reason}")]
    InvalidResponse { backend: String, reason: String },
}

/// Submission forwarding errors.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Webhook request failed: {0}")]
    Request(String),

    #[error("Webhook responded with status: {status}")]
    Status { status: u16 },

    #[error("Failed to serialize submission: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for the wizard.
pub type Result<T> = std::result::Result<T, Error>;
