//! One operation per artifact kind, with acceptance checks beyond the schema.

use studyai_llm::ModelClient;
use tracing::{info, instrument, warn};

use crate::client::GenerationClient;
use crate::config::Difficulty;
use crate::error::{Result, StudyError};
use crate::prompt::PromptBuilder;
use crate::schema::{
    ArtifactKind, FillBlankQuestion, FlashcardSet, McqQuestion, Summary, BLANK_MARKER,
    MCQ_OPTION_COUNT,
};

/// Generates study artifacts through a [`GenerationClient`].
#[derive(Debug, Clone)]
pub struct ArtifactGenerator<M> {
    client: GenerationClient<M>,
}

impl<M: ModelClient> ArtifactGenerator<M> {
    /// Creates a generator over the given client.
    #[must_use]
    pub const fn new(client: GenerationClient<M>) -> Self {
        Self { client }
    }

    /// The underlying generation client.
    #[must_use]
    pub const fn client(&self) -> &GenerationClient<M> {
        &self.client
    }

    /// Generates one multiple-choice question.
    ///
    /// # Errors
    ///
    /// Returns [`StudyError::Generation`] if the client gives up or the
    /// question does not have four options containing the answer.
    #[instrument(skip(self, topic), fields(chars = topic.chars().count()))]
    pub async fn generate_mcq(&self, topic: &str, difficulty: Difficulty) -> Result<McqQuestion> {
        let prompt = PromptBuilder::mcq(topic, difficulty);
        let question: McqQuestion = self.client.generate(&prompt).await?;

        if question.options.len() != MCQ_OPTION_COUNT
            || !question.options.contains(&question.correct_answer)
        {
            return Err(StudyError::generation(
                ArtifactKind::Mcq,
                1,
                "invalid MCQ format: expected 4 options containing the correct answer",
            ));
        }

        info!("Generated MCQ question");
        Ok(question)
    }

    /// Generates one fill-in-the-blank question.
    ///
    /// Runs its own acceptance loop around the client: a question is accepted
    /// only if it contains the blank marker and has a non-empty answer.
    ///
    /// # Errors
    ///
    /// If the last round failed inside the client, that error is returned
    /// unchanged. Otherwise returns [`StudyError::Generation`] for the
    /// acceptance failure.
    #[instrument(skip(self, topic), fields(chars = topic.chars().count()))]
    pub async fn generate_fill_blank(
        &self,
        topic: &str,
        difficulty: Difficulty,
    ) -> Result<FillBlankQuestion> {
        let prompt = PromptBuilder::fill_blank(topic, difficulty);
        let rounds = self.client.max_attempts();
        let mut last_error = None;

        for round in 1..=rounds {
            match self.client.generate::<FillBlankQuestion>(&prompt).await {
                Ok(question) if is_acceptable_fill_blank(&question) => {
                    info!(round, "Generated fill-in-the-blank question");
                    return Ok(question);
                }
                Ok(_) => {
                    warn!(round, "Fill-in-the-blank question rejected, retrying");
                    last_error = None;
                }
                Err(e) => {
                    warn!(round, error = %e, "Fill-in-the-blank generation failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            StudyError::generation(
                ArtifactKind::FillBlank,
                rounds,
                format!("question must contain '{BLANK_MARKER}' and have a non-empty answer"),
            )
        }))
    }

    /// Summarizes `content`.
    ///
    /// # Errors
    ///
    /// Returns [`StudyError::Generation`] if the client gives up.
    #[instrument(skip_all, fields(chars = content.chars().count()))]
    pub async fn generate_summary(&self, content: &str) -> Result<Summary> {
        let summary: Summary = self.client.generate(&PromptBuilder::summary(content)).await?;
        info!(key_points = summary.key_points.len(), "Generated summary");
        Ok(summary)
    }

    /// Generates up to `count` flashcards from `content`.
    ///
    /// Surplus cards are dropped. A shortfall is logged, not treated as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`StudyError::Generation`] if the client gives up.
    #[instrument(skip(self, content), fields(chars = content.chars().count()))]
    pub async fn generate_flashcards(&self, content: &str, count: usize) -> Result<FlashcardSet> {
        let mut set: FlashcardSet = self
            .client
            .generate(&PromptBuilder::flashcards(content, count))
            .await?;

        let received = set.flashcards.len();
        if received > count {
            set.flashcards.truncate(count);
        } else if received < count {
            warn!(requested = count, received, "Model returned fewer flashcards than requested");
        }

        info!(cards = set.flashcards.len(), "Generated flashcards");
        Ok(set)
    }
}

fn is_acceptable_fill_blank(question: &FillBlankQuestion) -> bool {
    !question.question.trim().is_empty()
        && !question.answer.trim().is_empty()
        && question.question.contains(BLANK_MARKER)
}
