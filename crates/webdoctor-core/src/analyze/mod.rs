//! Analyze orchestration.
//!
//! Normalizes one of the three input shapes into a single canonical image,
//! invokes the screenshot source when a page URL needs rendering, and hands
//! the result to the vision client. Stateless across calls; every request
//! owns its own normalized image.

pub mod model;

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use tracing::{info, warn};

use crate::config::ScreenshotPolicy;
use crate::error::{WebDoctorError, WebDoctorResult};
use crate::vision::VisionClient;
use model::{AnalysisRequest, NormalizedImage, MAX_UPLOAD_BYTES};

/// Seam between the analyzer and the headless-browser implementation.
///
/// One call captures one above-the-fold PNG of the given pre-validated
/// http(s) URL, releasing every browser resource before returning.
#[async_trait]
pub trait ScreenshotSource: Send + Sync {
    async fn capture(&self, url: &str) -> WebDoctorResult<Vec<u8>>;
}

/// The analyze handler: normalize, optionally screenshot, call the model.
pub struct Analyzer {
    vision: Option<VisionClient>,
    screenshots: Arc<dyn ScreenshotSource>,
    policy: ScreenshotPolicy,
}

impl Analyzer {
    pub fn new(
        vision: Option<VisionClient>,
        screenshots: Arc<dyn ScreenshotSource>,
        policy: ScreenshotPolicy,
    ) -> Self {
        Self { vision, screenshots, policy }
    }

    /// Run one request through the full flow and return the critique text.
    pub async fn analyze(&self, request: AnalysisRequest) -> WebDoctorResult<String> {
        let vision = self.vision.as_ref().ok_or_else(|| {
            WebDoctorError::config("Model API key is not set (OPENAI_API_KEY)")
        })?;

        let image = self.normalize(request).await?;
        vision.critique(image.as_ref()).await
    }

    /// Turn a request into the canonical image representation.
    ///
    /// Returns `None` only on the degraded path: a page screenshot failed
    /// and the configured policy is `Degrade`.
    async fn normalize(&self, request: AnalysisRequest) -> WebDoctorResult<Option<NormalizedImage>> {
        match request {
            AnalysisRequest::UploadedFile(file) => {
                if file.bytes.len() > MAX_UPLOAD_BYTES {
                    return Err(WebDoctorError::validation(
                        "File too large. The maximum upload size is 5 MB.",
                    ));
                }
                Ok(Some(NormalizedImage::from_upload(&file)))
            }
            AnalysisRequest::ImageUrl(url) => {
                model::validate_url_scheme(&url)?;
                Ok(Some(NormalizedImage::Remote(url)))
            }
            AnalysisRequest::PageUrl(url) => {
                model::validate_url_scheme(&url)?;

                match self.screenshots.capture(&url).await {
                    Ok(bytes) => {
                        info!(url = %url, size = bytes.len(), "Captured page screenshot");
                        Ok(Some(NormalizedImage::Inline {
                            media_type: "image/png".to_string(),
                            data: base64::engine::general_purpose::STANDARD.encode(&bytes),
                        }))
                    }
                    Err(err) if self.policy == ScreenshotPolicy::Degrade => {
                        warn!(url = %url, error = %err, "Screenshot failed, degrading to text-only");
                        Ok(None)
                    }
                    Err(err) => Err(err),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use model::UploadedFile;
    use serde_json::json;

    struct FixedScreenshot(Vec<u8>);

    #[async_trait]
    impl ScreenshotSource for FixedScreenshot {
        async fn capture(&self, _url: &str) -> WebDoctorResult<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    struct FailingScreenshot;

    #[async_trait]
    impl ScreenshotSource for FailingScreenshot {
        async fn capture(&self, _url: &str) -> WebDoctorResult<Vec<u8>> {
            Err(WebDoctorError::Screenshot("navigation timed out".to_string()))
        }
    }

    /// Panics if the analyzer ever reaches for the browser.
    struct NeverScreenshot;

    #[async_trait]
    impl ScreenshotSource for NeverScreenshot {
        async fn capture(&self, url: &str) -> WebDoctorResult<Vec<u8>> {
            panic!("screenshot source invoked for {}", url);
        }
    }

    fn mock_vision(server: &MockServer) -> VisionClient {
        VisionClient::new(&server.base_url(), "test-key", "gpt-4o-mini")
    }

    async fn ok_completion(server: &MockServer) -> httpmock::Mock<'_> {
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200)
                    .json_body(json!({"choices": [{"message": {"content": "Looks clean."}}]}));
            })
            .await
    }

    #[tokio::test]
    async fn image_url_skips_the_browser() {
        let server = MockServer::start_async().await;
        let mock = ok_completion(&server).await;

        let analyzer = Analyzer::new(
            Some(mock_vision(&server)),
            Arc::new(NeverScreenshot),
            ScreenshotPolicy::Abort,
        );

        let result = analyzer
            .analyze(AnalysisRequest::ImageUrl("https://example.com/shot.png".to_string()))
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(result, "Looks clean.");
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let server = MockServer::start_async().await;
        let analyzer = Analyzer::new(
            Some(mock_vision(&server)),
            Arc::new(NeverScreenshot),
            ScreenshotPolicy::Abort,
        );

        let file = UploadedFile { bytes: vec![0u8; MAX_UPLOAD_BYTES + 1], media_type: None };
        let err = analyzer.analyze(AnalysisRequest::UploadedFile(file)).await.unwrap_err();
        assert!(matches!(err, WebDoctorError::Validation(_)));
    }

    #[tokio::test]
    async fn upload_is_sent_as_data_url() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .body_contains("data:image/jpeg;base64,");
                then.status(200)
                    .json_body(json!({"choices": [{"message": {"content": "Solid layout."}}]}));
            })
            .await;

        let analyzer = Analyzer::new(
            Some(mock_vision(&server)),
            Arc::new(NeverScreenshot),
            ScreenshotPolicy::Abort,
        );

        let file = UploadedFile { bytes: vec![0u8; 10 * 1024], media_type: None };
        let result = analyzer.analyze(AnalysisRequest::UploadedFile(file)).await.unwrap();
        mock.assert_async().await;
        assert_eq!(result, "Solid layout.");
    }

    #[tokio::test]
    async fn image_suffixed_non_http_url_is_rejected() {
        let server = MockServer::start_async().await;
        let analyzer = Analyzer::new(
            Some(mock_vision(&server)),
            Arc::new(NeverScreenshot),
            ScreenshotPolicy::Abort,
        );

        // Suffix classification must not exempt the URL from scheme checks.
        let request =
            AnalysisRequest::from_parts(Some("ftp://example.com/x.png".to_string()), None).unwrap();
        let err = analyzer.analyze(request).await.unwrap_err();
        assert!(matches!(err, WebDoctorError::Validation(_)));
    }

    #[tokio::test]
    async fn bad_scheme_is_rejected_before_capture() {
        let server = MockServer::start_async().await;
        let analyzer = Analyzer::new(
            Some(mock_vision(&server)),
            Arc::new(NeverScreenshot),
            ScreenshotPolicy::Abort,
        );

        let err = analyzer
            .analyze(AnalysisRequest::PageUrl("ftp://example.com/x".to_string()))
            .await
            .unwrap_err();
        match err {
            WebDoctorError::Validation(msg) => assert!(msg.contains("Invalid URL format")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn page_url_screenshot_is_inlined() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .body_contains("data:image/png;base64,");
                then.status(200)
                    .json_body(json!({"choices": [{"message": {"content": "Good hierarchy."}}]}));
            })
            .await;

        let analyzer = Analyzer::new(
            Some(mock_vision(&server)),
            Arc::new(FixedScreenshot(vec![0x89, 0x50, 0x4E, 0x47])),
            ScreenshotPolicy::Abort,
        );

        let result = analyzer
            .analyze(AnalysisRequest::PageUrl("https://example.com".to_string()))
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(result, "Good hierarchy.");
    }

    #[tokio::test]
    async fn abort_policy_propagates_screenshot_failure() {
        let server = MockServer::start_async().await;
        let analyzer = Analyzer::new(
            Some(mock_vision(&server)),
            Arc::new(FailingScreenshot),
            ScreenshotPolicy::Abort,
        );

        let err = analyzer
            .analyze(AnalysisRequest::PageUrl("https://slow-site.example".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, WebDoctorError::Screenshot(_)));
    }

    #[tokio::test]
    async fn degrade_policy_continues_text_only() {
        let server = MockServer::start_async().await;
        let mock = ok_completion(&server).await;

        let analyzer = Analyzer::new(
            Some(mock_vision(&server)),
            Arc::new(FailingScreenshot),
            ScreenshotPolicy::Degrade,
        );

        let result = analyzer
            .analyze(AnalysisRequest::PageUrl("https://slow-site.example".to_string()))
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(result, "Looks clean.");
    }

    #[tokio::test]
    async fn missing_api_key_is_a_config_error() {
        let analyzer = Analyzer::new(None, Arc::new(NeverScreenshot), ScreenshotPolicy::Abort);

        let err = analyzer
            .analyze(AnalysisRequest::ImageUrl("https://example.com/a.png".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, WebDoctorError::Config(_)));
    }
}
