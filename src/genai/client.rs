//! `GenerativeService` trait and the `GeminiClient` REST implementation.
//!
//! Every higher-level operation (narration, exercises, images, stories) is a
//! single `generateContent` call with a different model and
//! [`GenerationConfig`](super::wire::GenerationConfig). Connection details
//! come from [`GenAiConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::GenAiConfig;
use crate::genai::wire::{GenerateContentRequest, GenerateContentResponse};

/// Response bodies longer than this are cut when embedded in an error.
const MAX_ERROR_BODY: usize = 512;

// ---------------------------------------------------------------------------
// GenAiError
// ---------------------------------------------------------------------------

/// Errors from a single `generateContent` round trip.
#[derive(Debug, Error)]
pub enum GenAiError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("generative service request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("generative service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("failed to parse generative service response: {0}")]
    Parse(String),

    /// No API key in the config file or the environment.
    #[error("no API key configured (set genai.api_key or GEMINI_API_KEY)")]
    MissingApiKey,
}

impl From<reqwest::Error> for GenAiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenAiError::Timeout
        } else if e.is_decode() {
            GenAiError::Parse(e.to_string())
        } else {
            GenAiError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// GenerativeService trait
// ---------------------------------------------------------------------------

/// Async seam over the generative backend.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// as `Arc<dyn GenerativeService>`.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenAiError>;
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Calls `POST {base_url}/v1beta/models/{model}:generateContent`.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Build a client from application config.
    ///
    /// The API key is resolved once, here; a missing key is reported per
    /// request as [`GenAiError::MissingApiKey`] so the app still starts.
    pub fn from_config(config: &GenAiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            log::warn!("genai: no API key found; generation requests will fail");
        }

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerativeService for GeminiClient {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenAiError> {
        let key = self.api_key.as_deref().ok_or(GenAiError::MissingApiKey)?;

        log::debug!("genai: POST {model}:generateContent");
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_at_char_boundary(&mut body, MAX_ERROR_BODY);
            return Err(GenAiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| GenAiError::Parse(e.to_string()))
    }
}

fn truncate_at_char_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}

// ---------------------------------------------------------------------------
// ScriptedService (test double)
// ---------------------------------------------------------------------------

/// Answers every call through a closure and records `(model, request)`.
#[cfg(test)]
pub struct ScriptedService<F>
where
    F: Fn(&str, &GenerateContentRequest) -> Result<GenerateContentResponse, GenAiError>
        + Send
        + Sync,
{
    respond: F,
    pub calls: std::sync::Mutex<Vec<(String, GenerateContentRequest)>>,
}

#[cfg(test)]
impl<F> ScriptedService<F>
where
    F: Fn(&str, &GenerateContentRequest) -> Result<GenerateContentResponse, GenAiError>
        + Send
        + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn models(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }
}

#[cfg(test)]
#[async_trait]
impl<F> GenerativeService for ScriptedService<F>
where
    F: Fn(&str, &GenerateContentRequest) -> Result<GenerateContentResponse, GenAiError>
        + Send
        + Sync,
{
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenAiError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), request.clone()));
        (self.respond)(model, request)
    }
}

/// First text part of the first content of a request; handy in test scripts.
#[cfg(test)]
pub fn request_text(request: &GenerateContentRequest) -> &str {
    request
        .contents
        .first()
        .and_then(|c| c.parts.first())
        .and_then(|p| p.text.as_deref())
        .unwrap_or("")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_key: Option<&str>) -> GenAiConfig {
        GenAiConfig {
            base_url: "http://localhost:8080/".into(),
            api_key: api_key.map(str::to_string),
            ..GenAiConfig::default()
        }
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let client = GeminiClient::from_config(&make_config(Some("k")));
        assert_eq!(
            client.endpoint("gemini-2.5-flash-image"),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn configured_key_is_used() {
        let client = GeminiClient::from_config(&make_config(Some("abc")));
        assert!(client.has_api_key());
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = GeminiClient {
            client: reqwest::Client::new(),
            base_url: "http://127.0.0.1:9".into(),
            api_key: None,
        };
        let err = client
            .generate_content("m", &GenerateContentRequest::from_text("oi"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenAiError::MissingApiKey));
    }

    #[test]
    fn truncation_respects_utf8() {
        let mut s = "ãããã".to_string(); // 2 bytes each
        truncate_at_char_boundary(&mut s, 5);
        assert_eq!(s, "ãã");
    }

    /// `GeminiClient` must be usable as `dyn GenerativeService`.
    #[test]
    fn client_is_object_safe() {
        let client: Box<dyn GenerativeService> =
            Box::new(GeminiClient::from_config(&make_config(None)));
        drop(client);
    }

    #[tokio::test]
    async fn scripted_service_records_calls() {
        let service = ScriptedService::new(|_, req| {
            Ok(GenerateContentResponse::with_text(request_text(req)))
        });
        let response = service
            .generate_content("echo", &GenerateContentRequest::from_text("eco"))
            .await
            .unwrap();
        assert_eq!(response.text().as_deref(), Some("eco"));
        assert_eq!(service.models(), vec!["echo".to_string()]);
    }
}
