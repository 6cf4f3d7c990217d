//! Study-AI Core
//!
//! Turns a topic, pasted notes or a PDF into a summary, flashcards and a
//! graded quiz.
//!
//! Generation flows top-down: the [`StudySession`] asks the
//! [`ArtifactGenerator`] for each artifact, the generator renders a prompt with
//! [`PromptBuilder`] and hands it to the [`GenerationClient`], which calls the
//! model, validates the output against the artifact's [`Schema`] and retries a
//! bounded number of times.

pub mod client;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod prompt;
pub mod schema;
pub mod session;

pub use client::{decode, extract_json_object, AttemptOutcome, GenerationClient, Rejection};
pub use config::{
    resolve_api_key, Config, Difficulty, QuestionType, QuizDefaults, StructuredOutput,
    API_KEY_ENV, CONFIG_FILE_NAME, MAX_FLASHCARD_COUNT, MAX_QUESTION_COUNT,
};
pub use content::{truncate_chars, Content, ContentOrigin, MAX_TEXT_FILE_SIZE};
pub use error::{Result, StudyError};
pub use generator::ArtifactGenerator;
pub use prompt::{PromptBuilder, PromptParams};
pub use schema::{
    Artifact, ArtifactKind, FillBlankQuestion, Flashcard, FlashcardSet, McqQuestion, Schema,
    SchemaViolation, Summary, BLANK_MARKER,
};
pub use session::{BuildOptions, ExportOutcome, Question, SessionStatus, StudySession};
