//! WebDoctor Screenshot Acquirer
//!
//! Headless Chrome capture via chromiumoxide. Each call launches an isolated
//! browser, navigates to the URL, waits for the page to load plus a short
//! settle delay, grabs one above-the-fold PNG, and tears everything down.
//! Sessions are never reused or pooled across requests.

pub mod error;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use futures::StreamExt;
use tracing::{debug, warn};
use webdoctor_core::analyze::ScreenshotSource;
use webdoctor_core::WebDoctorResult;

pub use error::CaptureError;

/// Fixed rendering viewport.
pub const VIEWPORT_WIDTH: u32 = 1920;
pub const VIEWPORT_HEIGHT: u32 = 1080;

/// Pause after the load event so animations and async rendering settle.
const SETTLE_DELAY: Duration = Duration::from_millis(1200);

/// Capture settings, fixed per process.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Wall-clock bound on navigate + settle + capture.
    pub timeout: Duration,
    /// Explicit Chrome/Chromium executable path, if auto-detection is not wanted.
    pub executable: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), executable: None }
    }
}

/// Capture one above-the-fold PNG of the given URL.
///
/// The caller has already validated the scheme as http(s); no re-check here.
/// The browser process is closed on every exit path.
pub async fn capture(url: &str, config: &CaptureConfig) -> Result<Vec<u8>, CaptureError> {
    let mut builder = BrowserConfig::builder()
        .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
        .no_sandbox()
        .arg("--disable-gpu")
        .arg("--disable-dev-shm-usage");
    if let Some(path) = &config.executable {
        builder = builder.chrome_executable(path);
    }
    let browser_config = builder.build().map_err(CaptureError::Launch)?;

    debug!(url = %url, "Launching headless browser");
    let (mut browser, mut handler) = Browser::launch(browser_config)
        .await
        .map_err(|e| CaptureError::Launch(e.to_string()))?;

    // Drive CDP events until the browser goes away.
    let driver = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    let result = bounded_attempt(config.timeout, navigate_and_capture(&browser, url)).await;

    // Teardown runs on every path, success or failure. `bounded_attempt`
    // always returns, so control always reaches this point.
    if let Err(e) = browser.close().await {
        warn!(error = %e, "Browser close failed");
    }
    if let Err(e) = browser.wait().await {
        debug!(error = %e, "Browser wait failed");
    }
    driver.abort();

    result
}

/// Bound a capture attempt by wall-clock time.
///
/// Always resolves: either the attempt's own result or a timeout error,
/// which is what guarantees the teardown after it runs on every path.
async fn bounded_attempt<F>(limit: Duration, attempt: F) -> Result<Vec<u8>, CaptureError>
where
    F: std::future::Future<Output = Result<Vec<u8>, CaptureError>>,
{
    match tokio::time::timeout(limit, attempt).await {
        Ok(inner) => inner,
        Err(_) => Err(CaptureError::Timeout(limit.as_secs())),
    }
}

async fn navigate_and_capture(browser: &Browser, url: &str) -> Result<Vec<u8>, CaptureError> {
    let page = browser
        .new_page(url)
        .await
        .map_err(|e| CaptureError::Navigation(e.to_string()))?;

    page.wait_for_navigation()
        .await
        .map_err(|e| CaptureError::Navigation(e.to_string()))?;

    tokio::time::sleep(SETTLE_DELAY).await;

    let params = ScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Png)
        .full_page(false)
        .build();

    page.screenshot(params)
        .await
        .map_err(|e| CaptureError::Screenshot(e.to_string()))
}

/// Production [`ScreenshotSource`] backed by headless Chrome.
pub struct ChromeCapture {
    config: CaptureConfig,
}

impl ChromeCapture {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ScreenshotSource for ChromeCapture {
    async fn capture(&self, url: &str) -> WebDoctorResult<Vec<u8>> {
        capture(url, &self.config).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webdoctor_core::WebDoctorError;

    #[test]
    fn capture_errors_map_to_screenshot_failures() {
        let err: WebDoctorError = CaptureError::Timeout(30).into();
        match err {
            WebDoctorError::Screenshot(msg) => assert!(msg.contains("30 seconds")),
            other => panic!("expected screenshot failure, got {:?}", other),
        }
    }

    #[test]
    fn default_config_uses_thirty_second_timeout() {
        let config = CaptureConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.executable.is_none());
    }

    #[tokio::test]
    async fn stalled_attempt_resolves_to_timeout() {
        // A navigation that never completes must still return, so the
        // teardown sequence after the bounded attempt always runs.
        let result = bounded_attempt(Duration::from_millis(20), std::future::pending()).await;
        match result {
            Err(CaptureError::Timeout(_)) => {}
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn attempt_failures_pass_through_the_bound() {
        let attempt = async { Err(CaptureError::Navigation("net::ERR_NAME_NOT_RESOLVED".into())) };
        let result = bounded_attempt(Duration::from_secs(5), attempt).await;
        assert!(matches!(result, Err(CaptureError::Navigation(_))));
    }

    #[tokio::test]
    async fn attempt_results_pass_through_the_bound() {
        let attempt = async { Ok(vec![0x89, 0x50, 0x4E, 0x47]) };
        let result = bounded_attempt(Duration::from_secs(5), attempt).await.unwrap();
        assert_eq!(result[..2], [0x89, 0x50]);
    }
}
