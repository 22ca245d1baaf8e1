use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Errors that can occur when calling the text-generation service
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Gemini API key not configured")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Gemini API quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Unauthorized: invalid Gemini API key")]
    Unauthorized,

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Empty response from Gemini API")]
    EmptyResponse,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl GenerationError {
    /// Quota exhaustion, whether typed or only visible in the message text
    pub fn is_quota(&self) -> bool {
        match self {
            GenerationError::QuotaExceeded(_) => true,
            other => mentions_quota(&other.to_string()),
        }
    }
}

/// Whether an error body signals usage limits rather than a generic failure
fn mentions_quota(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("quota") || lower.contains("resource_exhausted")
}

/// Output shape requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Text,
}

impl ResponseFormat {
    fn mime_type(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/json",
            ResponseFormat::Text => "text/plain",
        }
    }
}

/// One prompt plus sampling settings
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub format: ResponseFormat,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            format: ResponseFormat::Json,
            temperature: 0.7,
            max_output_tokens: 2000,
        }
    }

    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            format: ResponseFormat::Text,
            temperature: 0.8,
            max_output_tokens: 200,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }
}

/// A hosted text-generation model
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// False when credentials are missing and every call would fail
    fn is_configured(&self) -> bool {
        true
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Gemini `generateContent` REST client
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(base_url: String, api_key: String, model: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            model,
            client,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        if !self.is_configured() {
            return Err(GenerationError::MissingApiKey);
        }

        let body = GenerateContentBody {
            contents: vec![Content {
                parts: vec![Part { text: &request.prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: request.format.mime_type(),
                temperature: request.temperature,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: request.max_output_tokens,
            },
        };

        tracing::debug!(
            "Calling Gemini model {} ({:?}, {} prompt chars)",
            self.model,
            request.format,
            request.prompt.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::warn!("Gemini API returned {}: {}", status, body);

            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => GenerationError::QuotaExceeded(body),
                _ if mentions_quota(&body) => GenerationError::QuotaExceeded(body),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::Unauthorized,
                _ => GenerationError::ApiError(format!("{}: {}", status, body)),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let text = parsed.into_text().ok_or(GenerationError::EmptyResponse)?;
        tracing::debug!("Gemini response received, length: {}", text.len());

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard, key: &str) -> GeminiClient {
        GeminiClient::new(server.url(), key.to_string(), DEFAULT_MODEL.to_string(), 5)
    }

    #[test]
    fn test_gemini_client_creation() {
        let client = GeminiClient::new(
            GEMINI_BASE_URL.to_string(),
            String::new(),
            DEFAULT_MODEL.to_string(),
            30,
        );

        assert!(!client.is_configured());
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_quota_detection() {
        assert!(mentions_quota("RESOURCE_EXHAUSTED: try later"));
        assert!(mentions_quota("You exceeded your current Quota"));
        assert!(!mentions_quota("internal error"));
    }

    #[tokio::test]
    async fn test_generate_returns_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "POST",
                Matcher::Regex(r"^/models/gemini-2\.5-flash:generateContent".to_string()),
            )
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::PartialJsonString(
                r#"{"generationConfig": {"responseMimeType": "text/plain"}}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "Hi Aarav"}]}}]}"#)
            .create_async()
            .await;

        let client = client_for(&server, "test-key");
        let text = client.generate(&GenerationRequest::text("hello")).await.unwrap();

        assert_eq!(text, "Hi Aarav");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_quota_exceeded() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Any)
            .with_status(429)
            .with_body(r#"{"error": {"status": "RESOURCE_EXHAUSTED"}}"#)
            .create_async()
            .await;

        let client = client_for(&server, "test-key");
        let err = client.generate(&GenerationRequest::json("hello")).await.unwrap_err();

        assert!(err.is_quota());
    }

    #[tokio::test]
    async fn test_generate_empty_candidates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let client = client_for(&server, "test-key");
        let err = client.generate(&GenerationRequest::json("hello")).await.unwrap_err();

        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_generate_without_key_skips_network() {
        let server = mockito::Server::new_async().await;
        let client = client_for(&server, "");
        let err = client.generate(&GenerationRequest::text("hello")).await.unwrap_err();

        assert!(matches!(err, GenerationError::MissingApiKey));
    }
}
