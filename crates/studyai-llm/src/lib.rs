//! Study-AI Model Clients
//!
//! Structured-output language model access for Study-AI.
//!
//! This crate defines the [`ModelClient`] seam that the generation core calls
//! through, the Groq chat-completions client used in production, and a
//! [`ScriptedModel`] that replays canned responses.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod groq;
mod scripted;

pub use groq::{extract_content, GroqClient};
pub use scripted::ScriptedModel;

/// Default OpenAI-compatible endpoint base for Groq.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.9;

/// Default number of transport-level retries performed by the client itself.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Errors returned by a model call.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// The endpoint answered with an error status or could not be reached.
    #[error("model API error ({kind}): {message}")]
    Api {
        /// Classified failure kind.
        kind: LlmErrorKind,
        /// HTTP status, when the endpoint answered at all.
        status: Option<u16>,
        /// Message from the endpoint or transport.
        message: String,
    },

    /// The call did not finish within the configured timeout.
    #[error("model call timed out after {secs}s")]
    Timeout {
        /// The timeout that elapsed.
        secs: u64,
    },

    /// The endpoint answered but the body had no usable content.
    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    /// The client cannot be used as configured (missing key, bad URL).
    #[error("model client not configured: {0}")]
    NotConfigured(String),
}

/// Categories of model API failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmErrorKind {
    /// Authentication failure (invalid API key, expired credentials).
    Authentication,
    /// Rate limit exceeded.
    RateLimit,
    /// Server error (5xx responses).
    Server,
    /// Network connectivity issues.
    Network,
    /// Other unclassified errors.
    Other,
}

impl fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::RateLimit => write!(f, "rate_limit"),
            Self::Server => write!(f, "server"),
            Self::Network => write!(f, "network"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl LlmErrorKind {
    /// Classifies an HTTP status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            429 => Self::RateLimit,
            500..=599 => Self::Server,
            _ => Self::Other,
        }
    }

    /// Returns a suggestion message for this error kind.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::Authentication => "Check GROQ_API_KEY in your environment or .env file",
            Self::RateLimit => "Wait and retry, or reduce the number of questions",
            Self::Server => "Retry later; the model service may be experiencing issues",
            Self::Network => "Check your network connection",
            Self::Other => "Check the model provider's status page",
        }
    }
}

impl LlmError {
    /// Creates an `Api` error classified from an HTTP status.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            kind: LlmErrorKind::from_status(status),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates a `Network` error for a transport failure.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Api {
            kind: LlmErrorKind::Network,
            status: None,
            message: message.into(),
        }
    }

    /// Returns `true` if retrying the same request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Api {
                kind: LlmErrorKind::RateLimit | LlmErrorKind::Server | LlmErrorKind::Network,
                ..
            } | Self::Timeout { .. }
        )
    }

    /// Returns an actionable suggestion for the user.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::Api { kind, .. } => kind.suggestion(),
            Self::Timeout { .. } => "Retry, or raise requestTimeoutSecs in studyai.json",
            Self::InvalidResponse(_) => "Retry; the model returned an unexpected payload",
            Self::NotConfigured(_) => "Set GROQ_API_KEY and check baseUrl in studyai.json",
        }
    }
}

/// A specialized `Result` type for model calls.
pub type Result<T> = std::result::Result<T, LlmError>;

/// How the model is asked to shape its output.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    /// JSON mode: any syntactically valid JSON object.
    JsonObject,
    /// Schema-constrained decoding against a JSON Schema document.
    JsonSchema {
        /// Schema name reported to the endpoint.
        name: String,
        /// The JSON Schema document.
        schema: serde_json::Value,
    },
}

impl ResponseFormat {
    /// Renders the `response_format` request field.
    #[must_use]
    pub fn to_request_value(&self) -> serde_json::Value {
        match self {
            Self::JsonObject => serde_json::json!({ "type": "json_object" }),
            Self::JsonSchema { name, schema } => serde_json::json!({
                "type": "json_schema",
                "json_schema": { "name": name, "schema": schema }
            }),
        }
    }
}

/// A single structured completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// The full instruction text.
    pub prompt: String,
    /// The requested output shape.
    pub response_format: ResponseFormat,
}

impl CompletionRequest {
    /// Creates a JSON-mode request for the given prompt.
    #[must_use]
    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_format: ResponseFormat::JsonObject,
        }
    }

    /// Replaces the response format.
    #[must_use]
    pub fn with_format(mut self, response_format: ResponseFormat) -> Self {
        self.response_format = response_format;
        self
    }
}

/// A language model endpoint that returns structured text.
///
/// Implementations return the raw JSON text produced by the model. Network,
/// authentication and payload failures all surface as [`LlmError`].
pub trait ModelClient: Send + Sync {
    /// Performs one completion.
    fn complete(&self, request: &CompletionRequest) -> impl Future<Output = Result<String>> + Send;
}

/// Connection and sampling settings for a model endpoint.
#[derive(Clone)]
pub struct ModelSettings {
    /// Bearer credential.
    pub api_key: String,
    /// Endpoint base URL (without `/chat/completions`).
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Transport-level retries for transient failures.
    pub max_retries: u32,
    /// Per-request timeout.
    pub timeout: Duration,
    /// First backoff delay; doubles after each transient failure.
    pub retry_backoff: Duration,
}

impl ModelSettings {
    /// Creates settings with the given key and default everything else.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_backoff: Duration::from_millis(250),
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the transport-level retry count.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the first backoff delay.
    #[must_use]
    pub const fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }
}

impl fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_retries", &self.max_retries)
            .field("timeout", &self.timeout)
            .field("retry_backoff", &self.retry_backoff)
            .finish()
    }
}
