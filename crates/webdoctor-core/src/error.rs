//! Centralized error types for WebDoctor.

use thiserror::Error;

/// Main error type for WebDoctor operations.
///
/// Every failure in the analyze flow is funneled into one of these variants
/// so the web layer can map each to a stable HTTP status and user message.
#[derive(Error, Debug)]
pub enum WebDoctorError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Screenshot capture failed: {0}")]
    Screenshot(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream quota exceeded")]
    Quota,

    #[error("Upstream model error: {0}")]
    Upstream(String),
}

/// Result type for WebDoctor operations.
pub type WebDoctorResult<T> = Result<T, WebDoctorError>;

impl WebDoctorError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Message safe to show to an end user. Internal causes stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Screenshot(_) => {
                "Could not capture a screenshot of that page. Please check the URL and try again."
                    .to_string()
            }
            Self::Config(_) => "The analysis service is not configured.".to_string(),
            Self::Quota => "The analysis quota has been exceeded. Please try again later.".to_string(),
            Self::Upstream(_) => "The analysis failed. Please try again.".to_string(),
        }
    }
}
