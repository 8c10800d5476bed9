//! Request and image types for the analyze flow.

use base64::Engine;

use crate::error::{WebDoctorError, WebDoctorResult};

/// Upload size ceiling. Larger files are rejected with a validation error.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Media type assumed for uploads that do not declare one.
pub const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

/// URL suffixes treated as direct image links (checked case-insensitively).
const IMAGE_SUFFIXES: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// An uploaded image file as received from the multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    /// Media type declared by the client, if any.
    pub media_type: Option<String>,
}

/// One analyze request: exactly one input variant per call.
#[derive(Debug, Clone)]
pub enum AnalysisRequest {
    /// Raw image bytes uploaded by the user.
    UploadedFile(UploadedFile),
    /// A URL that points directly at an image; forwarded as-is.
    ImageUrl(String),
    /// An arbitrary webpage URL that must be screenshotted first.
    PageUrl(String),
}

impl AnalysisRequest {
    /// Build a request from the optional multipart parts.
    ///
    /// A URL takes precedence over a file when both are present. Neither
    /// present is a validation error.
    pub fn from_parts(url: Option<String>, file: Option<UploadedFile>) -> WebDoctorResult<Self> {
        if let Some(url) = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            if is_image_url(&url) {
                return Ok(Self::ImageUrl(url));
            }
            return Ok(Self::PageUrl(url));
        }

        if let Some(file) = file {
            return Ok(Self::UploadedFile(file));
        }

        Err(WebDoctorError::validation(
            "No input provided. Upload an image file or enter a URL.",
        ))
    }
}

/// The single canonical image representation handed to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedImage {
    /// Remote image URL the model fetches itself.
    Remote(String),
    /// Inline base64-encoded image with an explicit media type.
    Inline { media_type: String, data: String },
}

impl NormalizedImage {
    /// Encode uploaded bytes as an inline image.
    pub fn from_upload(file: &UploadedFile) -> Self {
        let media_type = file
            .media_type
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());
        Self::Inline {
            media_type,
            data: base64::engine::general_purpose::STANDARD.encode(&file.bytes),
        }
    }

    /// The URL form the completion API expects: either the remote URL
    /// itself or a `data:` URL for inline images.
    pub fn as_image_url(&self) -> String {
        match self {
            Self::Remote(url) => url.clone(),
            Self::Inline { media_type, data } => format!("data:{};base64,{}", media_type, data),
        }
    }
}

/// True when the URL ends with a known image extension.
pub fn is_image_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    IMAGE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Validate that a URL is http or https. Applies to every URL input,
/// image-suffixed or not.
pub fn validate_url_scheme(raw: &str) -> WebDoctorResult<()> {
    let parsed = url::Url::parse(raw).map_err(|_| {
        WebDoctorError::validation(
            "Invalid URL format. Only http:// and https:// URLs are supported.",
        )
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(WebDoctorError::validation(
            "Invalid URL format. Only http:// and https:// URLs are supported.",
        )),
    }
}
