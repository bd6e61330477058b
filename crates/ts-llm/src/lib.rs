//! Claude API integration for the TrackStar time tracker.
//!
//! Provides the hosted-model side of category suggestions: a [`Client`] for
//! the Messages API and a [`ClaudeCategorizer`] that plugs it into
//! [`ts_core::Categorizer`].

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_core::{CategorizeRequest, CategorySuggestion, Categorizer};

/// Default request timeout for API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Default Messages API endpoint.
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const CATEGORIZE_MAX_TOKENS: u32 = 200;
const CATEGORIZE_TEMPERATURE: f32 = 0.2;

/// LLM client errors.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provided API key was invalid.
    #[error("invalid API key: {reason}")]
    InvalidApiKey { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error: {message}")]
    Api { message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Claude API client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client with the given API key and the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or whitespace-only, or if
    /// the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    /// Creates a new client whose requests give up after `timeout`.
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        let api_key = api_key.into();

        if api_key.is_empty() {
            return Err(LlmError::InvalidApiKey {
                reason: "API key cannot be empty",
            });
        }
        if api_key.trim().is_empty() {
            return Err(LlmError::InvalidApiKey {
                reason: "API key cannot be whitespace-only",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LlmError::ClientBuild)?;

        Ok(Self {
            http,
            api_key,
            api_url: ANTHROPIC_API_URL.to_string(),
        })
    }

    /// Points the client at a different Messages endpoint.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Suggest a category for a time entry using the Claude API.
    ///
    /// `known_categories` are offered to the model as preferred labels.
    pub async fn categorize_time_entry(
        &self,
        model: &str,
        input: &CategorizeRequest,
        known_categories: &[String],
    ) -> Result<CategorySuggestion, LlmError> {
        let prompt = build_categorize_prompt(input, known_categories);
        let request = MessageRequest {
            model: model.to_string(),
            max_tokens: CATEGORIZE_MAX_TOKENS,
            temperature: CATEGORIZE_TEMPERATURE,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(model, url = %self.api_url, "sending categorization request");
        let response = self
            .http
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(&body).unwrap_or_else(|| LlmError::Api {
                message: format!("status {status}: {body}"),
            }));
        }

        let payload: MessageResponse = serde_json::from_str(&body)
            .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;
        let text = extract_text(payload.content)?;
        parse_category_suggestion(&text)
    }
}

/// [`Categorizer`] backed by the Claude API.
#[derive(Debug, Clone)]
pub struct ClaudeCategorizer {
    client: Client,
    model: String,
    known_categories: Vec<String>,
}

impl ClaudeCategorizer {
    pub fn new(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            known_categories: Vec::new(),
        }
    }

    /// Offers the user's existing category names to the model.
    #[must_use]
    pub fn with_known_categories(mut self, names: Vec<String>) -> Self {
        self.known_categories = names;
        self
    }
}

impl Categorizer for ClaudeCategorizer {
    type Error = LlmError;

    fn categorize(
        &self,
        request: &CategorizeRequest,
    ) -> impl Future<Output = Result<CategorySuggestion, Self::Error>> + Send {
        self.client
            .categorize_time_entry(&self.model, request, &self.known_categories)
    }
}

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
}

fn extract_text(blocks: Vec<ContentBlock>) -> Result<String, LlmError> {
    let mut pieces = Vec::new();
    for block in blocks {
        let ContentBlock::Text { text } = block;
        pieces.push(text);
    }
    if pieces.is_empty() {
        return Err(LlmError::InvalidResponse(
            "missing text content".to_string(),
        ));
    }
    Ok(pieces.join("\n"))
}

fn parse_api_error(body: &str) -> Option<LlmError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: ErrorDetails,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| LlmError::Api {
            message: payload.error.message,
        })
}

fn build_categorize_prompt(input: &CategorizeRequest, known_categories: &[String]) -> String {
    let mut lines = Vec::new();
    lines.push(
        "You are an assistant that categorizes time entries based on their duration and description."
            .to_string(),
    );
    lines.push(
        "Analyze the time entry below and predict the most appropriate category.".to_string(),
    );
    lines.push(
        "Categories can include: Python, Crypto Trading, Codeforces Problem Solving, Binge Watching, etc. Be creative and accurate."
            .to_string(),
    );
    lines.push(
        "Consider both the duration and any provided description to make your determination."
            .to_string(),
    );
    if !known_categories.is_empty() {
        lines.push(format!(
            "Prefer one of the user's existing categories when it fits: {}",
            known_categories.join(", ")
        ));
    }
    lines.push(
        "Return strict JSON: {\"category\":\"...\",\"confidence\":0.0} where confidence is between 0 and 1."
            .to_string(),
    );
    lines.push(String::new());
    lines.push(format!("Duration: {} seconds", input.duration_seconds));
    lines.push(format!(
        "Description: {}",
        input.description.as_deref().unwrap_or("(none)")
    ));
    lines.join("\n")
}

fn parse_category_suggestion(text: &str) -> Result<CategorySuggestion, LlmError> {
    #[derive(Deserialize)]
    struct Payload {
        category: String,
        confidence: f32,
    }

    let json = strip_code_fence(text);
    let payload: Payload =
        serde_json::from_str(json).map_err(|err| LlmError::InvalidResponse(err.to_string()))?;
    CategorySuggestion::new(&payload.category, payload.confidence)
        .map_err(|err| LlmError::InvalidResponse(err.to_string()))
}

/// Unwraps a reply fenced as a Markdown code block.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_rejects_empty_api_key() {
        assert!(matches!(
            Client::new(""),
            Err(LlmError::InvalidApiKey { .. })
        ));
    }

    #[test]
    fn client_rejects_whitespace_api_key() {
        assert!(matches!(
            Client::new("   "),
            Err(LlmError::InvalidApiKey { .. })
        ));
    }

    #[test]
    fn client_debug_redacts_api_key() {
        let client = Client::new("secret-key").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn build_prompt_includes_duration_and_description() {
        let input = CategorizeRequest::new(600, Some("reading docs"));
        let prompt = build_categorize_prompt(&input, &[]);
        assert!(prompt.contains("Duration: 600 seconds"));
        assert!(prompt.contains("Description: reading docs"));
        assert!(!prompt.contains("existing categories"));
    }

    #[test]
    fn build_prompt_lists_known_categories() {
        let input = CategorizeRequest::new(60, None);
        let known = vec!["Python Development".to_string(), "Reading".to_string()];
        let prompt = build_categorize_prompt(&input, &known);
        assert!(prompt.contains("Description: (none)"));
        assert!(prompt.contains("existing categories when it fits: Python Development, Reading"));
    }

    #[test]
    fn parse_suggestion_accepts_json() {
        let parsed = parse_category_suggestion(r#"{"category":"Reading","confidence":0.8}"#).unwrap();
        assert_eq!(parsed.category, "Reading");
        assert!((parsed.confidence.value() - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn parse_suggestion_accepts_fenced_json() {
        let text = "```json\n{\"category\":\"Python\",\"confidence\":1}\n```";
        let parsed = parse_category_suggestion(text).unwrap();
        assert_eq!(parsed.category, "Python");
    }

    #[test]
    fn parse_suggestion_rejects_out_of_range_confidence() {
        let err = parse_category_suggestion(r#"{"category":"Reading","confidence":1.4}"#)
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn parse_suggestion_rejects_blank_category() {
        let err =
            parse_category_suggestion(r#"{"category":"  ","confidence":0.4}"#).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn parse_suggestion_rejects_invalid_json() {
        let err = parse_category_suggestion("not-json").unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn parse_api_error_reads_message() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert!(matches!(
            parse_api_error(body),
            Some(LlmError::Api { message }) if message == "Overloaded"
        ));
        assert!(parse_api_error("<html>").is_none());
    }
}
