//! Study session state machine.
//!
//! A [`StudySession`] owns everything produced for one piece of content: the
//! summary, the flashcards, the quiz questions, the user's answers and the
//! graded results. It moves through [`SessionStatus`] as content is provided,
//! artifacts are generated and the quiz is taken.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use studyai_llm::ModelClient;
use studyai_report::csv::CsvExporter;
use studyai_report::{ResultRow, ScoreSummary, SheetCard, SheetSummary, StudySheet};
use tracing::{info, instrument, warn};

use crate::config::{Config, Difficulty, QuestionType, QuizDefaults};
use crate::content::Content;
use crate::error::{Result, StudyError};
use crate::generator::ArtifactGenerator;
use crate::schema::{FillBlankQuestion, Flashcard, McqQuestion, Summary};

// ============================================================================
// SessionStatus
// ============================================================================

/// Lifecycle state of a [`StudySession`].
///
/// - `Empty` -> `ContentProvided` once non-empty content is accepted
/// - `ContentProvided` -> `Generating` -> `Ready` on a successful build;
///   a failed build falls back to `ContentProvided`
/// - `Ready` -> `Attempting` -> `Submitted`
/// - `Submitted` -> `Attempting` when an answer is changed after grading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No content yet.
    #[default]
    Empty,
    /// Content accepted, nothing generated.
    ContentProvided,
    /// A build is in progress.
    Generating,
    /// Artifacts generated, quiz not started.
    Ready,
    /// Answers are being collected.
    Attempting,
    /// Answers graded.
    Submitted,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::ContentProvided => "content_provided",
            Self::Generating => "generating",
            Self::Ready => "ready",
            Self::Attempting => "attempting",
            Self::Submitted => "submitted",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Question
// ============================================================================

/// One quiz question, immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// MCQ or fill in the blank.
    pub kind: QuestionType,
    /// The question text.
    pub prompt_text: String,
    /// The four options for MCQ; empty for fill in the blank.
    pub options: Vec<String>,
    /// The correct option text or blank answer.
    pub correct_answer: String,
    /// Why the answer is correct.
    pub explanation: String,
}

impl Question {
    /// Grades `answer` against this question.
    ///
    /// MCQ answers must match the correct option exactly. Fill-in-the-blank
    /// answers are compared after trimming and lowercasing. A blank answer is
    /// always incorrect.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        if answer.trim().is_empty() {
            return false;
        }
        match self.kind {
            QuestionType::MultipleChoice => answer == self.correct_answer,
            QuestionType::FillBlank => {
                answer.trim().to_lowercase() == self.correct_answer.trim().to_lowercase()
            }
        }
    }
}

impl From<McqQuestion> for Question {
    fn from(q: McqQuestion) -> Self {
        Self {
            kind: QuestionType::MultipleChoice,
            prompt_text: q.question,
            options: q.options,
            correct_answer: q.correct_answer,
            explanation: q.explanation,
        }
    }
}

impl From<FillBlankQuestion> for Question {
    fn from(q: FillBlankQuestion) -> Self {
        Self {
            kind: QuestionType::FillBlank,
            prompt_text: q.question,
            options: Vec::new(),
            correct_answer: q.answer,
            explanation: q.explanation,
        }
    }
}

// ============================================================================
// BuildOptions
// ============================================================================

/// What to generate in [`StudySession::build_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Quiz question type.
    pub question_type: QuestionType,
    /// Quiz difficulty.
    pub difficulty: Difficulty,
    /// Number of quiz questions.
    pub question_count: usize,
    /// Number of flashcards.
    pub flashcard_count: usize,
}

impl From<QuizDefaults> for BuildOptions {
    fn from(quiz: QuizDefaults) -> Self {
        Self {
            question_type: quiz.question_type,
            difficulty: quiz.difficulty,
            question_count: quiz.question_count,
            flashcard_count: quiz.flashcard_count,
        }
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        QuizDefaults::default().into()
    }
}

// ============================================================================
// ExportOutcome
// ============================================================================

/// Result of [`StudySession::save_results`].
#[derive(Debug)]
pub enum ExportOutcome {
    /// Results were written to this path.
    Saved(PathBuf),
    /// There were no results; nothing was written.
    NothingToSave,
    /// The write failed. Session state is unaffected.
    Failed(StudyError),
}

// ============================================================================
// StudySession
// ============================================================================

/// All state for one study session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySession {
    status: SessionStatus,
    content: Option<Content>,
    summary: Option<Summary>,
    flashcards: Vec<Flashcard>,
    questions: Vec<Question>,
    answers: Vec<String>,
    results: Vec<ResultRow>,
    warnings: Vec<String>,
    summary_char_limit: usize,
    source_char_limit: usize,
}

impl Default for StudySession {
    fn default() -> Self {
        Self::new()
    }
}

impl StudySession {
    /// Creates an empty session with the default content limits.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Creates an empty session using the limits from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::with_limits(config.summary_char_limit, config.source_char_limit)
    }

    /// Creates an empty session with explicit content limits, in characters.
    #[must_use]
    pub const fn with_limits(summary_char_limit: usize, source_char_limit: usize) -> Self {
        Self {
            status: SessionStatus::Empty,
            content: None,
            summary: None,
            flashcards: Vec::new(),
            questions: Vec::new(),
            answers: Vec::new(),
            results: Vec::new(),
            warnings: Vec::new(),
            summary_char_limit,
            source_char_limit,
        }
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// The accepted content, if any.
    #[must_use]
    pub const fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    /// The generated summary, if any.
    #[must_use]
    pub const fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    /// The generated flashcards.
    #[must_use]
    pub fn flashcards(&self) -> &[Flashcard] {
        &self.flashcards
    }

    /// The generated quiz questions.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Answers collected so far, parallel to [`Self::questions`].
    #[must_use]
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// Graded results; empty until [`Self::evaluate`] runs.
    #[must_use]
    pub fn results(&self) -> &[ResultRow] {
        &self.results
    }

    /// Non-fatal problems from the last build.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Accepts content for a new session.
    ///
    /// Allowed before any build and after grading; previously generated
    /// artifacts are discarded.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::ContentEmpty` for blank content and
    /// `StudyError::InvalidStateTransition` while a quiz is in progress.
    pub fn provide_content(&mut self, content: Content) -> Result<()> {
        if !matches!(
            self.status,
            SessionStatus::Empty | SessionStatus::ContentProvided | SessionStatus::Submitted
        ) {
            return Err(StudyError::invalid_transition(
                self.status,
                SessionStatus::ContentProvided,
            ));
        }
        if content.is_empty() {
            return Err(StudyError::ContentEmpty);
        }

        self.clear_artifacts();
        info!(origin = ?content.origin, chars = content.text.chars().count(), "Content provided");
        self.content = Some(content);
        self.status = SessionStatus::ContentProvided;
        Ok(())
    }

    /// Generates the summary, the flashcards and the quiz.
    ///
    /// The summary and the flashcards are best effort: a failure is logged
    /// and recorded in [`Self::warnings`]. Questions are generated one model
    /// call at a time and `progress` receives the completed fraction after
    /// each one. If any question fails the build stops, the status returns
    /// to `ContentProvided` and whatever was generated stays inspectable.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::InvalidStateTransition` unless content has been
    /// provided, or the first `StudyError::Generation` from the quiz loop.
    #[allow(clippy::cast_precision_loss)]
    #[instrument(skip_all, fields(
        question_type = %options.question_type,
        difficulty = %options.difficulty,
        question_count = options.question_count,
        flashcard_count = options.flashcard_count,
    ))]
    pub async fn build_session<M: ModelClient>(
        &mut self,
        generator: &ArtifactGenerator<M>,
        options: &BuildOptions,
        mut progress: impl FnMut(f32) + Send,
    ) -> Result<()> {
        if self.status != SessionStatus::ContentProvided {
            return Err(StudyError::invalid_transition(
                self.status,
                SessionStatus::Generating,
            ));
        }
        let Some(content) = self.content.clone() else {
            return Err(StudyError::ContentEmpty);
        };

        self.clear_artifacts();
        self.status = SessionStatus::Generating;

        match generator
            .generate_summary(content.excerpt(self.summary_char_limit))
            .await
        {
            Ok(summary) => self.summary = Some(summary),
            Err(e) => {
                warn!(error = %e, "Summary generation failed, continuing without it");
                self.warnings.push(format!("Summary unavailable: {e}"));
            }
        }

        let source = content.excerpt(self.source_char_limit);

        match generator
            .generate_flashcards(source, options.flashcard_count)
            .await
        {
            Ok(set) => self.flashcards = set.flashcards,
            Err(e) => {
                warn!(error = %e, "Flashcard generation failed, continuing without them");
                self.warnings.push(format!("Flashcards unavailable: {e}"));
            }
        }

        let total = options.question_count;
        for i in 0..total {
            let question = match options.question_type {
                QuestionType::MultipleChoice => generator
                    .generate_mcq(source, options.difficulty)
                    .await
                    .map(Question::from),
                QuestionType::FillBlank => generator
                    .generate_fill_blank(source, options.difficulty)
                    .await
                    .map(Question::from),
            };

            match question {
                Ok(question) => self.questions.push(question),
                Err(e) => {
                    warn!(question = i + 1, error = %e, "Quiz generation failed, build aborted");
                    self.status = SessionStatus::ContentProvided;
                    return Err(e);
                }
            }

            progress((i + 1) as f32 / total as f32);
        }

        self.status = SessionStatus::Ready;
        info!(
            questions = self.questions.len(),
            flashcards = self.flashcards.len(),
            has_summary = self.summary.is_some(),
            "Session ready"
        );
        Ok(())
    }

    /// Starts collecting answers, one empty slot per question.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::InvalidStateTransition` unless the session is
    /// `Ready`.
    pub fn start_attempt(&mut self) -> Result<()> {
        if self.status != SessionStatus::Ready {
            return Err(StudyError::invalid_transition(
                self.status,
                SessionStatus::Attempting,
            ));
        }
        self.answers = vec![String::new(); self.questions.len()];
        self.status = SessionStatus::Attempting;
        Ok(())
    }

    /// Records the answer for the question at `index` (0-based).
    ///
    /// Changing an answer after grading returns the session to `Attempting`;
    /// the previous results stay until the next [`Self::evaluate`].
    ///
    /// # Errors
    ///
    /// Returns `StudyError::InvalidStateTransition` outside an attempt and
    /// `StudyError::AnswerIndexOutOfRange` for a bad index.
    pub fn record_answer(&mut self, index: usize, answer: impl Into<String>) -> Result<()> {
        if !matches!(
            self.status,
            SessionStatus::Attempting | SessionStatus::Submitted
        ) {
            return Err(StudyError::invalid_transition(
                self.status,
                SessionStatus::Attempting,
            ));
        }
        let len = self.answers.len();
        let slot = self
            .answers
            .get_mut(index)
            .ok_or(StudyError::AnswerIndexOutOfRange { index, len })?;
        *slot = answer.into();
        self.status = SessionStatus::Attempting;
        Ok(())
    }

    /// Grades every answer and returns the results.
    ///
    /// Unanswered questions count as incorrect. Grading the same answers
    /// again yields the same results.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::InvalidStateTransition` unless an attempt has
    /// started.
    pub fn evaluate(&mut self) -> Result<&[ResultRow]> {
        if !matches!(
            self.status,
            SessionStatus::Attempting | SessionStatus::Submitted
        ) {
            return Err(StudyError::invalid_transition(
                self.status,
                SessionStatus::Submitted,
            ));
        }

        self.results = self
            .questions
            .iter()
            .zip(&self.answers)
            .enumerate()
            .map(|(i, (question, answer))| ResultRow {
                question_number: i + 1,
                question_text: question.prompt_text.clone(),
                question_type: question.kind.label().to_string(),
                user_answer: answer.clone(),
                correct_answer: question.correct_answer.clone(),
                is_correct: question.is_correct(answer),
                explanation: question.explanation.clone(),
            })
            .collect();
        self.status = SessionStatus::Submitted;

        let score = self.score();
        info!(correct = score.correct, total = score.total, "Quiz evaluated");
        Ok(&self.results)
    }

    /// Score of the last evaluation.
    #[must_use]
    pub fn score(&self) -> ScoreSummary {
        ScoreSummary::from_results(&self.results)
    }

    /// Everything needed to render a Markdown study sheet.
    #[must_use]
    pub fn study_sheet(&self) -> StudySheet {
        StudySheet {
            title: self
                .content
                .as_ref()
                .map_or_else(String::new, Content::title),
            summary: self.summary.as_ref().map(|s| SheetSummary {
                main_idea: s.main_idea.clone(),
                key_points: s.key_points.clone(),
            }),
            flashcards: self
                .flashcards
                .iter()
                .map(|c| SheetCard {
                    front: c.front.clone(),
                    back: c.back.clone(),
                })
                .collect(),
            results: self.results.clone(),
        }
    }

    /// Writes the results to `<dir>/<prefix>_<YYYYMMDD_HHMMSS>.csv`.
    ///
    /// Never fails: an empty result list and write errors are reported in
    /// the returned [`ExportOutcome`].
    pub fn save_results(&self, dir: &Path, prefix: &str) -> ExportOutcome {
        if self.results.is_empty() {
            info!("No results to save");
            return ExportOutcome::NothingToSave;
        }

        match CsvExporter::new(&self.results).write_to_dir(dir, prefix) {
            Ok(path) => {
                info!(path = %path.display(), rows = self.results.len(), "Results saved");
                ExportOutcome::Saved(path)
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to save results");
                ExportOutcome::Failed(StudyError::export(dir, e.to_string()))
            }
        }
    }

    /// Clears all session state, including the content.
    pub fn reset(&mut self) {
        self.clear_artifacts();
        self.content = None;
        self.status = SessionStatus::Empty;
    }

    fn clear_artifacts(&mut self) {
        self.summary = None;
        self.flashcards.clear();
        self.questions.clear();
        self.answers.clear();
        self.results.clear();
        self.warnings.clear();
    }
}
