//! AI-assisted drafting through the Gemini `generateContent` REST endpoint.
//!
//! Callers never see an error from here: [`generate_sms_draft`] always
//! resolves to text, either the model's draft or one of the fixed fallback
//! messages.

use crate::utils::{parse_endpoint, run_on_runtime};
use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub const SYSTEM_INSTRUCTION: &str = "ساعدني في كتابة رسالة SMS قصيرة ومهنية باللغة العربية بناءً على الطلب التالي. تأكد أن الرسالة لا تتجاوز 160 حرفاً.";

pub const EMPTY_DRAFT_MESSAGE: &str = "تعذر إنشاء المسودة حالياً.";
pub const CONNECTION_ERROR_MESSAGE: &str = "خطأ في الاتصال بالذكاء الاصطناعي.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("model returned no text")]
    EmptyResponse,
}

/// Why no draft came back. Both cases carry a fixed user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftFailure {
    Empty,
    Unreachable,
}

impl DraftFailure {
    pub fn message(self) -> &'static str {
        match self {
            DraftFailure::Empty => EMPTY_DRAFT_MESSAGE,
            DraftFailure::Unreachable => CONNECTION_ERROR_MESSAGE,
        }
    }
}

#[async_trait(?Send)]
pub trait DraftGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, DraftError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateRequest {
    fn new(prompt: &str) -> Self {
        Self {
            system_instruction: Content {
                parts: vec![Part { text: SYSTEM_INSTRUCTION.to_string() }],
            },
            contents: vec![Content {
                parts: vec![Part { text: prompt.to_string() }],
            }],
        }
    }
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| c.content.parts.iter().map(|p| p.text.as_str()).collect::<String>())
            .unwrap_or_default()
    }
}

pub struct GeminiClient {
    http: HttpClient,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(endpoint: &str, model: &str, api_key: &str) -> Result<Self, DraftError> {
        let endpoint = parse_endpoint(endpoint)?;
        let http = HttpClient::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.as_str().trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait(?Send)]
impl DraftGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, DraftError> {
        if self.api_key.trim().is_empty() {
            return Err(DraftError::MissingApiKey);
        }
        let http = self.http.clone();
        let url = self.url();
        let key = self.api_key.clone();
        let body = GenerateRequest::new(prompt);
        debug!("requesting draft from {url}");

        run_on_runtime(send_request(http, url, key, body)).await?
    }
}

async fn send_request(http: HttpClient, url: String, key: String, body: GenerateRequest) -> Result<String, DraftError> {
    let resp = http.post(&url).query(&[("key", key)]).json(&body).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        error!("Gemini API error: {status} - {body}");
        return Err(DraftError::Status { status: status.as_u16(), body });
    }
    let parsed: GenerateResponse = resp.json().await?;
    let text = parsed.text();
    if text.trim().is_empty() {
        return Err(DraftError::EmptyResponse);
    }
    Ok(text)
}

/// Asks `generator` for a draft and classifies the result. The text is
/// trimmed; blank text counts as [`DraftFailure::Empty`].
pub async fn draft_outcome(generator: &dyn DraftGenerator, prompt: &str) -> Result<String, DraftFailure> {
    match generator.generate(prompt).await {
        Ok(text) => {
            let text = text.trim();
            if text.is_empty() {
                warn!("draft request returned no text");
                Err(DraftFailure::Empty)
            } else {
                Ok(text.to_string())
            }
        }
        Err(DraftError::EmptyResponse) => Err(DraftFailure::Empty),
        Err(e) => {
            error!("Error generating SMS draft: {e}");
            Err(DraftFailure::Unreachable)
        }
    }
}

pub async fn generate_sms_draft(generator: &dyn DraftGenerator, prompt: &str) -> String {
    match draft_outcome(generator, prompt).await {
        Ok(text) => text,
        Err(failure) => failure.message().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDrafter;

    #[test]
    fn request_body_carries_instruction_and_prompt() {
        let json = serde_json::to_value(GenerateRequest::new("موعد الاجتماع غدا")).unwrap();
        assert_eq!(json["system_instruction"]["parts"][0]["text"], SYSTEM_INSTRUCTION);
        assert_eq!(json["contents"][0]["parts"][0]["text"], "موعد الاجتماع غدا");
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"مرحبا "},{"text":"بكم"}]}},
            {"content":{"parts":[{"text":"ignored"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), "مرحبا بكم");

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.text(), "");
    }

    #[test]
    fn url_includes_model() {
        let client = GeminiClient::new("generativelanguage.googleapis.com/v1beta/models/", DEFAULT_MODEL, "k").unwrap();
        assert_eq!(
            client.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[tokio::test]
    async fn unreachable_service_resolves_to_connection_error() {
        let client = GeminiClient::new("http://127.0.0.1:9", DEFAULT_MODEL, "test-key").unwrap();
        let text = generate_sms_draft(&client, "موعد الاجتماع غدا").await;
        assert_eq!(text, "خطأ في الاتصال بالذكاء الاصطناعي.");
    }

    #[tokio::test]
    async fn missing_key_counts_as_unreachable() {
        let client = GeminiClient::new(DEFAULT_ENDPOINT, DEFAULT_MODEL, "  ").unwrap();
        assert_eq!(draft_outcome(&client, "hi").await, Err(DraftFailure::Unreachable));
    }

    #[tokio::test]
    async fn blank_model_output_uses_the_fallback_text() {
        let drafter = FakeDrafter::replying("   \n");
        assert_eq!(generate_sms_draft(&drafter, "hi").await, EMPTY_DRAFT_MESSAGE);
    }

    #[tokio::test]
    async fn model_output_is_trimmed() {
        let drafter = FakeDrafter::replying("  عزيزي العميل، نذكركم بموعد الاجتماع غداً.\n");
        assert_eq!(
            generate_sms_draft(&drafter, "موعد الاجتماع غدا").await,
            "عزيزي العميل، نذكركم بموعد الاجتماع غداً."
        );
        assert_eq!(drafter.prompts(), vec!["موعد الاجتماع غدا".to_string()]);
    }
}
