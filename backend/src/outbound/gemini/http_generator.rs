//! Reqwest-backed Gemini answer generator.
//!
//! Owns transport details only: request serialisation, the API key header,
//! timeout and status mapping, and decoding candidate text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use zeroize::Zeroizing;

use super::dto::{GenerateContentRequestDto, GenerateContentResponseDto};
use crate::domain::GenerationRequest;
use crate::domain::ports::{AnswerGenerator, AnswerGeneratorError};

/// Public Gemini API base URL.
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
/// Model used when none is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Answer generator calling `models/{model}:generateContent`.
pub struct GeminiHttpGenerator {
    client: Client,
    url: Url,
    api_key: Zeroizing<String>,
}

impl std::fmt::Debug for GeminiHttpGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiHttpGenerator")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

/// Errors raised while building the generator.
#[derive(Debug, thiserror::Error)]
pub enum GeminiSetupError {
    #[error("invalid Gemini endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

fn generate_url(endpoint: &str, model: &str) -> Result<Url, url::ParseError> {
    let base = endpoint.trim_end_matches('/');
    Url::parse(&format!("{base}/v1beta/models/{model}:generateContent"))
}

impl GeminiHttpGenerator {
    /// Build a generator for `model` at `endpoint` with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is invalid or the client cannot be
    /// constructed.
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GeminiSetupError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: generate_url(endpoint, model)?,
            api_key: Zeroizing::new(api_key.into()),
        })
    }
}

#[async_trait]
impl AnswerGenerator for GeminiHttpGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, AnswerGeneratorError> {
        let response = self
            .client
            .post(self.url.clone())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&GenerateContentRequestDto::from(request))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_text(body.as_ref())
    }
}

fn parse_text(body: &[u8]) -> Result<String, AnswerGeneratorError> {
    let decoded: GenerateContentResponseDto = serde_json::from_slice(body).map_err(|error| {
        AnswerGeneratorError::decode(format!("invalid generateContent payload: {error}"))
    })?;
    decoded
        .into_text()
        .ok_or_else(AnswerGeneratorError::empty_response)
}

fn map_transport_error(error: reqwest::Error) -> AnswerGeneratorError {
    AnswerGeneratorError::transport(error.to_string())
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AnswerGeneratorError {
    let message = serde_json::from_slice::<ApiErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body_preview(body));
    AnswerGeneratorError::status(status.as_u16(), message)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
