//! Error types module
//!
//! All client-side failures are unified under [`AppError`]. The first group of
//! variants is the upload/favorite taxonomy (`UnsupportedFormat`, `QueueFull`,
//! `NotAuthenticated`, `ConversionFailure`, `TransferFailure`,
//! `ReconciliationFailure`); the rest cover general input, state and backend
//! failures.

use std::io;

use uuid::Uuid;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like rejected files
    Debug,
    /// Warning level - for recoverable issues like a full queue
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the user
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "QUEUE_FULL")
    fn error_code(&self) -> &'static str;

    /// Whether the user can recover by retrying or adjusting input
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from the internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unsupported format: {filename} ({mime_type})")]
    UnsupportedFormat { filename: String, mime_type: String },

    #[error("Upload queue full: {rejected} file(s) rejected (capacity {capacity})")]
    QueueFull { rejected: usize, capacity: usize },

    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("Conversion failed for {filename}: {reason}")]
    ConversionFailure { filename: String, reason: String },

    #[error("Transfer failed for {filename}: {reason}")]
    TransferFailure { filename: String, reason: String },

    #[error("Reconciliation failed: {} of {} update(s) rejected by the backend", failed.len(), attempted)]
    ReconciliationFailure { failed: Vec<Uuid>, attempted: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn app_error_static_metadata(err: &AppError) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        AppError::UnsupportedFormat { .. } => (
            "UNSUPPORTED_FORMAT",
            true,
            Some("Select image or video files (JPG, PNG, HEIC, MP4, MOV)"),
            LogLevel::Debug,
        ),
        AppError::QueueFull { .. } => (
            "QUEUE_FULL",
            true,
            Some("Upload the current batch before adding more files"),
            LogLevel::Warn,
        ),
        AppError::NotAuthenticated(_) => (
            "NOT_AUTHENTICATED",
            true,
            Some("Log in and retry the upload"),
            LogLevel::Warn,
        ),
        AppError::ConversionFailure { .. } => (
            "CONVERSION_FAILURE",
            true,
            None,
            LogLevel::Warn,
        ),
        AppError::TransferFailure { .. } => (
            "TRANSFER_FAILURE",
            true,
            Some("Re-add the file and upload again"),
            LogLevel::Error,
        ),
        AppError::ReconciliationFailure { .. } => (
            "RECONCILIATION_FAILURE",
            true,
            Some("Reload the page to see the confirmed state"),
            LogLevel::Warn,
        ),
        AppError::InvalidInput(_) => (
            "INVALID_INPUT",
            false,
            Some("Check the parameters and try again"),
            LogLevel::Debug,
        ),
        AppError::InvalidState(_) => (
            "INVALID_STATE",
            false,
            None,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            "NOT_FOUND",
            false,
            Some("Verify the media ID exists"),
            LogLevel::Debug,
        ),
        AppError::Forbidden(_) => (
            "FORBIDDEN",
            false,
            Some("Ask the trip creator to do this"),
            LogLevel::Warn,
        ),
        AppError::Api { .. } => (
            "API_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::Config(_) => (
            "CONFIG_ERROR",
            false,
            Some("Check CENTRIQ_* environment variables"),
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Recover an `AppError` carried inside a service error, wrapping anything else.
    pub fn from_service(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app_error) => app_error,
            Err(other) => AppError::from(other),
        }
    }

    /// Get the error type name
    pub fn error_type(&self) -> &str {
        match self {
            AppError::UnsupportedFormat { .. } => "UnsupportedFormat",
            AppError::QueueFull { .. } => "QueueFull",
            AppError::NotAuthenticated(_) => "NotAuthenticated",
            AppError::ConversionFailure { .. } => "ConversionFailure",
            AppError::TransferFailure { .. } => "TransferFailure",
            AppError::ReconciliationFailure { .. } => "ReconciliationFailure",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::InvalidState(_) => "InvalidState",
            AppError::NotFound(_) => "NotFound",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Api { .. } => "Api",
            AppError::Config(_) => "Config",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::UnsupportedFormat { filename, .. } => {
                format!("{} was skipped (not an image or video)", filename)
            }
            AppError::QueueFull { capacity, .. } => {
                format!("Upload limit is {} files per batch", capacity)
            }
            AppError::NotAuthenticated(_) => "User identity missing. Please log in.".to_string(),
            AppError::ConversionFailure { filename, .. } => {
                format!("{} could not be converted and was uploaded as-is", filename)
            }
            AppError::TransferFailure { filename, .. } => format!("Failed to upload {}", filename),
            AppError::ReconciliationFailure { failed, .. } => {
                format!("{} favorite update(s) failed", failed.len())
            }
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::InvalidState(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Forbidden(ref msg) => msg.clone(),
            AppError::Api { .. } => "The server rejected the request".to_string(),
            AppError::Config(ref msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal error".to_string()
            }
        }
    }
}
