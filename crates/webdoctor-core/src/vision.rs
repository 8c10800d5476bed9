//! Multimodal chat-completions client for design critique.
//!
//! Sends a fixed two-message prompt (critique persona plus the normalized
//! image) to an OpenAI-style /chat/completions endpoint and extracts the
//! first choice's text. Upstream failures are classified from the structured
//! error body into typed variants, never by substring-matching prose.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analyze::model::NormalizedImage;
use crate::error::{WebDoctorError, WebDoctorResult};

/// Output cap for a single critique.
const MAX_OUTPUT_TOKENS: u32 = 1000;

/// Returned when the completion response carries no usable text.
pub const NO_CRITIQUE_FALLBACK: &str = "The model returned no critique for this design.";

/// System message defining the critique persona and rubric.
const CRITIQUE_SYSTEM_PROMPT: &str = "\
You are WebDoctor, a senior UX/UI design consultant. You examine a single \
design screenshot and deliver a professional, honest critique. Structure \
every response with exactly these six section headings, in this order:\n\
Website Identity\n\
Strengths\n\
Areas for Improvement\n\
Visual & Layout Analysis\n\
Similar Websites\n\
WebDoctor's Design Prescription\n\
Under 'Website Identity', state what kind of product or site this appears to \
be and who it serves. Under 'Similar Websites', name comparable products and \
what they do differently. Under 'WebDoctor's Design Prescription', give a \
short, prioritized list of concrete changes. Be specific about spacing, \
typography, color, hierarchy, and accessibility; avoid generic advice.";

/// User instruction accompanying the image (or sent alone when degraded).
const CRITIQUE_USER_PROMPT: &str = "\
Please analyze this design from a professional UX/UI perspective and write \
the critique following your six required sections.";

/// Client for the multimodal completion API.
///
/// Built once at startup and shared; construction never touches the network.
#[derive(Clone)]
pub struct VisionClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrlPart },
}

#[derive(Serialize)]
struct ImageUrlPart {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Structured error body returned by the completion API.
#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
}

impl VisionClient {
    /// Create a new client against the given base URL.
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
        }
    }

    /// Request a critique for the given image, or a text-only critique when
    /// the image is absent (graceful-degradation path). Single attempt, no
    /// retries.
    pub async fn critique(&self, image: Option<&NormalizedImage>) -> WebDoctorResult<String> {
        let user_content = match image {
            Some(image) => MessageContent::Parts(vec![
                ContentPart::Text { text: CRITIQUE_USER_PROMPT.to_string() },
                ContentPart::ImageUrl {
                    image_url: ImageUrlPart { url: image.as_image_url() },
                },
            ]),
            None => MessageContent::Text(format!(
                "{} (No screenshot could be captured; critique based on the URL alone.)",
                CRITIQUE_USER_PROMPT
            )),
        };

        let request = ChatRequest {
            model: self.model.clone(),
            max_tokens: MAX_OUTPUT_TOKENS,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(CRITIQUE_SYSTEM_PROMPT.to_string()),
                },
                ChatMessage { role: "user", content: user_content },
            ],
        };

        debug!(model = %self.model, with_image = image.is_some(), "Calling completion API");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| WebDoctorError::Upstream(format!("Failed to reach completion API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_api_error(status, &body));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| WebDoctorError::Upstream(format!("Failed to parse completion response: {}", e)))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty());

        match text {
            Some(text) => Ok(text),
            None => {
                warn!("Completion response contained no text content");
                Ok(NO_CRITIQUE_FALLBACK.to_string())
            }
        }
    }
}

/// Map an API error response to a typed failure.
///
/// Quota exhaustion is recognized from the HTTP status and the structured
/// `error.code`/`error.type` fields of the body.
fn classify_api_error(status: reqwest::StatusCode, body: &str) -> WebDoctorError {
    let detail = serde_json::from_str::<ApiErrorBody>(body).ok().map(|b| b.error);

    let is_quota = status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || detail.as_ref().is_some_and(|d| {
            d.code.as_deref() == Some("insufficient_quota")
                || d.error_type.as_deref() == Some("insufficient_quota")
        });

    if is_quota {
        return WebDoctorError::Quota;
    }

    let message = detail
        .and_then(|d| d.message)
        .unwrap_or_else(|| format!("HTTP {}", status));
    WebDoctorError::Upstream(message)
}
