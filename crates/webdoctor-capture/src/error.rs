//! Capture error types.

use thiserror::Error;
use webdoctor_core::WebDoctorError;

/// Failures of a single screenshot attempt.
///
/// None of these are retried here; retry policy belongs to the caller.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Navigation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Screenshot capture failed: {0}")]
    Screenshot(String),
}

impl From<CaptureError> for WebDoctorError {
    fn from(err: CaptureError) -> Self {
        WebDoctorError::Screenshot(err.to_string())
    }
}
