//! The generation client: one artifact from one prompt, with bounded retries.
//!
//! Every attempt is an independent model call with the same prompt. Its raw
//! text is decoded into a generic JSON value, checked against the artifact's
//! schema and only then converted into the typed artifact. Each attempt ends
//! in an explicit [`AttemptOutcome`]; the retry loop is a plain bounded
//! iteration over those outcomes.

use serde_json::Value;
use studyai_llm::{CompletionRequest, LlmError, ModelClient, ResponseFormat};
use tracing::{debug, info, warn};

use crate::config::StructuredOutput;
use crate::error::{Result, StudyError};
use crate::schema::{Artifact, SchemaViolation};

/// Default number of attempts per artifact.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Why an attempt did not produce an artifact.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Rejection {
    /// The model call itself failed.
    #[error("model call failed: {0}")]
    Call(#[from] LlmError),

    /// The output was not a decodable JSON object.
    #[error("could not decode model output: {0}")]
    Decode(String),

    /// The output did not satisfy the schema.
    #[error("schema violation: {0}")]
    Schema(#[from] SchemaViolation),
}

/// Result of a single attempt.
#[derive(Debug)]
pub enum AttemptOutcome<A> {
    /// A valid artifact.
    Accepted(A),
    /// The attempt failed.
    Rejected(Rejection),
}

/// Drives structured generation against a model.
#[derive(Debug, Clone)]
pub struct GenerationClient<M> {
    model: M,
    max_attempts: u32,
    structured_output: StructuredOutput,
}

impl<M: ModelClient> GenerationClient<M> {
    /// Creates a client with [`DEFAULT_MAX_ATTEMPTS`] and JSON mode.
    #[must_use]
    pub const fn new(model: M) -> Self {
        Self {
            model,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            structured_output: StructuredOutput::JsonObject,
        }
    }

    /// Sets the attempt budget; values below 1 are raised to 1.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets how output structure is requested.
    #[must_use]
    pub fn with_structured_output(mut self, structured_output: StructuredOutput) -> Self {
        self.structured_output = structured_output;
        self
    }

    /// The attempt budget.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The underlying model.
    #[must_use]
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Performs one attempt.
    pub async fn attempt<A: Artifact>(&self, prompt: &str) -> AttemptOutcome<A> {
        let request = CompletionRequest::json(prompt)
            .with_format(response_format::<A>(self.structured_output));

        let raw = match self.model.complete(&request).await {
            Ok(raw) => raw,
            Err(e) => return AttemptOutcome::Rejected(Rejection::Call(e)),
        };

        match decode::<A>(&raw) {
            Ok(artifact) => AttemptOutcome::Accepted(artifact),
            Err(rejection) => AttemptOutcome::Rejected(rejection),
        }
    }

    /// Generates one artifact, retrying up to the attempt budget.
    ///
    /// Returns on the first valid attempt.
    ///
    /// # Errors
    ///
    /// Returns [`StudyError::Generation`] carrying the artifact kind, the
    /// number of attempts and the last rejection once the budget is spent.
    pub async fn generate<A: Artifact>(&self, prompt: &str) -> Result<A> {
        let mut last_rejection = None;

        for attempt in 1..=self.max_attempts {
            debug!(kind = %A::KIND, attempt, max_attempts = self.max_attempts, "Requesting artifact");

            match self.attempt::<A>(prompt).await {
                AttemptOutcome::Accepted(artifact) => {
                    info!(kind = %A::KIND, attempt, "Generated artifact");
                    return Ok(artifact);
                }
                AttemptOutcome::Rejected(rejection) => {
                    warn!(
                        kind = %A::KIND,
                        attempt,
                        max_attempts = self.max_attempts,
                        reason = %rejection,
                        "Attempt rejected"
                    );
                    last_rejection = Some(rejection);
                }
            }
        }

        let cause = last_rejection.map_or_else(|| "no attempt was made".to_string(), |r| r.to_string());
        Err(StudyError::generation(A::KIND, self.max_attempts, cause))
    }
}

fn response_format<A: Artifact>(mode: StructuredOutput) -> ResponseFormat {
    match mode {
        StructuredOutput::JsonObject => ResponseFormat::JsonObject,
        StructuredOutput::JsonSchema => ResponseFormat::JsonSchema {
            name: A::KIND.name().to_string(),
            schema: A::schema().to_json_schema(),
        },
    }
}

/// Decodes, validates and converts raw model output.
///
/// # Errors
///
/// Returns a [`Rejection::Decode`] or [`Rejection::Schema`].
pub fn decode<A: Artifact>(raw: &str) -> std::result::Result<A, Rejection> {
    let json = extract_json_object(raw)
        .ok_or_else(|| Rejection::Decode("no JSON object in model output".to_string()))?;
    let value: Value =
        serde_json::from_str(json).map_err(|e| Rejection::Decode(e.to_string()))?;

    A::schema().validate(&value)?;

    serde_json::from_value(value).map_err(|e| Rejection::Decode(e.to_string()))
}

/// Returns the outermost `{ ... }` span of `raw`, tolerating code fences or
/// prose around it.
#[must_use]
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}
