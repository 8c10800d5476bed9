//! Application configuration.
//!
//! All settings come from the environment with sensible defaults; the only
//! required value is the model API key, and even that is checked per analyze
//! call rather than crashing the server at startup.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{WebDoctorError, WebDoctorResult};

/// Default chat-completions API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default multimodal model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default navigation+capture timeout for screenshots.
pub const DEFAULT_SCREENSHOT_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do when a page screenshot cannot be captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenshotPolicy {
    /// Fail the whole request with a screenshot error.
    #[default]
    Abort,
    /// Continue with a text-only critique, no image attached.
    Degrade,
}

impl FromStr for ScreenshotPolicy {
    type Err = WebDoctorError;

    fn from_str(s: &str) -> WebDoctorResult<Self> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "degrade" => Ok(Self::Degrade),
            other => Err(WebDoctorError::config(format!(
                "Unknown screenshot failure policy '{}' (expected 'abort' or 'degrade')",
                other
            ))),
        }
    }
}

/// Runtime configuration, read once at process start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Model API key. `None` means analyze calls fail with a config error.
    pub api_key: Option<String>,
    /// Chat-completions base URL.
    pub api_base: String,
    /// Model identifier sent with every completion request.
    pub model: String,
    /// Wall-clock bound on a single screenshot capture.
    pub screenshot_timeout: Duration,
    /// Policy when the screenshot step fails.
    pub screenshot_policy: ScreenshotPolicy,
    /// Explicit Chrome/Chromium executable, if auto-detection is not wanted.
    pub chrome_executable: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> WebDoctorResult<Self> {
        let screenshot_timeout = match std::env::var("WEBDOCTOR_SCREENSHOT_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    WebDoctorError::config(format!(
                        "WEBDOCTOR_SCREENSHOT_TIMEOUT_SECS must be an integer, got '{}'",
                        raw
                    ))
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => DEFAULT_SCREENSHOT_TIMEOUT,
        };

        let screenshot_policy = match std::env::var("WEBDOCTOR_ON_SCREENSHOT_FAILURE") {
            Ok(raw) => raw.parse()?,
            Err(_) => ScreenshotPolicy::default(),
        };

        Ok(Self {
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            api_base: std::env::var("WEBDOCTOR_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            model: std::env::var("WEBDOCTOR_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            screenshot_timeout,
            screenshot_policy,
            chrome_executable: std::env::var("WEBDOCTOR_CHROME").ok().map(PathBuf::from),
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            screenshot_timeout: DEFAULT_SCREENSHOT_TIMEOUT,
            screenshot_policy: ScreenshotPolicy::default(),
            chrome_executable: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses_case_insensitive() {
        assert_eq!("abort".parse::<ScreenshotPolicy>().unwrap(), ScreenshotPolicy::Abort);
        assert_eq!("Degrade".parse::<ScreenshotPolicy>().unwrap(), ScreenshotPolicy::Degrade);
        assert!("retry".parse::<ScreenshotPolicy>().is_err());
    }
}
