//! Deterministic model client that replays canned responses.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{CompletionRequest, LlmError, ModelClient, Result};

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<Result<String>>,
    fallback: Option<Result<String>>,
    prompts: Vec<String>,
}

/// A [`ModelClient`] that answers from a fixed script.
///
/// Replies are consumed in order. When the queue is empty the fallback reply
/// is returned for every further call; without a fallback the call fails with
/// [`LlmError::InvalidResponse`]. Clones share the same script, so a test can
/// hand one clone to the code under test and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct ScriptedModel {
    script: Arc<Mutex<Script>>,
}

impl ScriptedModel {
    /// Creates a model with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply.
    #[must_use]
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.lock().replies.push_back(Ok(text.into()));
        self
    }

    /// Queues a failed call.
    #[must_use]
    pub fn with_error(self, error: LlmError) -> Self {
        self.lock().replies.push_back(Err(error));
        self
    }

    /// Sets the reply used once the queue is exhausted.
    #[must_use]
    pub fn with_fallback_reply(self, text: impl Into<String>) -> Self {
        self.lock().fallback = Some(Ok(text.into()));
        self
    }

    /// Sets the error returned once the queue is exhausted.
    #[must_use]
    pub fn with_fallback_error(self, error: LlmError) -> Self {
        self.lock().fallback = Some(Err(error));
        self
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.lock().prompts.len()
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_reply(&self, prompt: &str) -> Result<String> {
        let mut script = self.lock();
        script.prompts.push(prompt.to_string());
        match script.replies.pop_front() {
            Some(reply) => reply,
            None => script
                .fallback
                .clone()
                .unwrap_or_else(|| Err(LlmError::InvalidResponse("script exhausted".to_string()))),
        }
    }
}

impl ModelClient for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.next_reply(&request.prompt)
    }
}
