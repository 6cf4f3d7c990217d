//! Groq chat-completions client.
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint. Transient
//! failures are retried here with exponential backoff, independently of the
//! attempt loop that validates the returned artifact.

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{CompletionRequest, LlmError, ModelClient, ModelSettings, Result};

/// HTTP client for a Groq (OpenAI-compatible) model endpoint.
///
/// # Example
///
/// ```no_run
/// use studyai_llm::{CompletionRequest, GroqClient, ModelClient, ModelSettings};
///
/// # async fn example() -> Result<(), studyai_llm::LlmError> {
/// let client = GroqClient::new(ModelSettings::new("gsk_..."))?;
/// let json = client
///     .complete(&CompletionRequest::json("Return {\"ok\": true}"))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    settings: ModelSettings,
}

impl GroqClient {
    /// Creates a client from the given settings.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::NotConfigured` if the API key is empty or the HTTP
    /// client cannot be built.
    pub fn new(settings: ModelSettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(LlmError::NotConfigured("API key is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| LlmError::NotConfigured(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, settings })
    }

    /// Returns the settings this client was built with.
    #[must_use]
    pub const fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    /// Builds the JSON request body for a completion.
    #[must_use]
    pub fn request_body(&self, request: &CompletionRequest) -> Value {
        serde_json::json!({
            "model": self.settings.model,
            "messages": [
                { "role": "user", "content": request.prompt }
            ],
            "temperature": self.settings.temperature,
            "response_format": request.response_format.to_request_value(),
        })
    }

    async fn send_once(&self, body: &Value) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.settings.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), text));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("body is not JSON: {e}")))?;

        extract_content(&body)
    }

    fn classify_transport(&self, error: &reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout {
                secs: self.settings.timeout.as_secs(),
            }
        } else {
            LlmError::network(error.to_string())
        }
    }
}

impl ModelClient for GroqClient {
    #[instrument(skip_all, fields(model = %self.settings.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = self.request_body(request);
        let mut delay = self.settings.retry_backoff;
        let mut retries_left = self.settings.max_retries;

        loop {
            match self.send_once(&body).await {
                Ok(content) => {
                    debug!(bytes = content.len(), "Model call succeeded");
                    return Ok(content);
                }
                Err(e) if e.is_transient() && retries_left > 0 => {
                    warn!(error = %e, retries_left, delay_ms = delay.as_millis(), "Transient model failure, retrying");
                    retries_left -= 1;
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Extracts `choices[0].message.content` from a chat-completions body.
///
/// # Errors
///
/// Returns `LlmError::InvalidResponse` if the path is missing or empty.
pub fn extract_content(body: &Value) -> Result<String> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| LlmError::InvalidResponse("missing choices[0].message.content".to_string()))
}
