//! Instruction rendering for each artifact kind.
//!
//! A prompt states the subject (and the difficulty, for quiz questions), lists
//! the schema's fields with their descriptions, shows one worked example and
//! asks for the JSON object only. Callers bound the content length; nothing is
//! truncated here.

use std::fmt::Write;

use crate::config::Difficulty;
use crate::schema::{ArtifactKind, FieldSpec, FieldType, BLANK_MARKER};

const MCQ_EXAMPLE: &str = r#"{
    "question": "What is the capital of France?",
    "options": ["London", "Berlin", "Paris", "Madrid"],
    "correct_answer": "Paris",
    "explanation": "Paris has been the capital of France since the late 10th century and is its most populous city."
}"#;

const FILL_BLANK_EXAMPLE: &str = r#"{
    "question": "The capital of France is _____.",
    "answer": "Paris",
    "explanation": "Paris is the capital city of France, located in the north-central part of the country."
}"#;

const SUMMARY_EXAMPLE: &str = r#"{
    "main_idea": "Photosynthesis converts light energy into chemical energy stored in glucose.",
    "key_points": [
        "It takes place in the chloroplasts of plant cells.",
        "The light-dependent reactions produce ATP and NADPH.",
        "The Calvin cycle uses ATP and NADPH to fix carbon dioxide into sugar."
    ]
}"#;

const FLASHCARD_EXAMPLE: &str = r#"{
    "flashcards": [
        { "front": "Where does photosynthesis take place?", "back": "In the chloroplasts of plant cells." },
        { "front": "What does the Calvin cycle produce?", "back": "Sugar (G3P) from fixed carbon dioxide." }
    ]
}"#;

/// Parameters for one prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptParams<'a> {
    /// Topic or content excerpt.
    pub subject: &'a str,
    /// Difficulty, for quiz questions only.
    pub difficulty: Option<Difficulty>,
    /// Number of items, for flashcard sets.
    pub count: usize,
}

/// Renders prompts for the generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    /// Renders the prompt for `kind`.
    #[must_use]
    pub fn build(kind: ArtifactKind, params: &PromptParams<'_>) -> String {
        let mut out = String::new();

        match kind {
            ArtifactKind::Mcq => {
                let _ = writeln!(
                    out,
                    "Generate a {}multiple-choice question about {}.\n",
                    difficulty_prefix(params.difficulty),
                    params.subject.trim()
                );
            }
            ArtifactKind::FillBlank => {
                let _ = writeln!(
                    out,
                    "Generate a {}fill-in-the-blank question about {}.\n",
                    difficulty_prefix(params.difficulty),
                    params.subject.trim()
                );
                let _ = writeln!(
                    out,
                    "IMPORTANT: The question MUST contain exactly five underscores in a row: {BLANK_MARKER}\n"
                );
            }
            ArtifactKind::Summary => {
                let _ = writeln!(
                    out,
                    "Summarize the following content for a student.\n\nContent:\n\"\"\"\n{}\n\"\"\"\n",
                    params.subject.trim()
                );
            }
            ArtifactKind::FlashcardSet => {
                let _ = writeln!(
                    out,
                    "Create exactly {} study flashcards from the following content.\n\nContent:\n\"\"\"\n{}\n\"\"\"\n",
                    params.count,
                    params.subject.trim()
                );
            }
        }

        let _ = writeln!(out, "Return ONLY a JSON object with these exact fields:");
        write_fields(&mut out, kind.schema().fields, 0);
        let _ = writeln!(out);
        let _ = writeln!(out, "Example format:\n{}\n", example_for(kind));
        let _ = write!(
            out,
            "Respond with the JSON object only: no markdown, no code fences, no commentary.\n\nYour response:"
        );

        out
    }

    /// Prompt for one multiple-choice question.
    #[must_use]
    pub fn mcq(topic: &str, difficulty: Difficulty) -> String {
        Self::build(
            ArtifactKind::Mcq,
            &PromptParams {
                subject: topic,
                difficulty: Some(difficulty),
                count: 1,
            },
        )
    }

    /// Prompt for one fill-in-the-blank question.
    #[must_use]
    pub fn fill_blank(topic: &str, difficulty: Difficulty) -> String {
        Self::build(
            ArtifactKind::FillBlank,
            &PromptParams {
                subject: topic,
                difficulty: Some(difficulty),
                count: 1,
            },
        )
    }

    /// Prompt for a summary of `content`.
    #[must_use]
    pub fn summary(content: &str) -> String {
        Self::build(
            ArtifactKind::Summary,
            &PromptParams {
                subject: content,
                difficulty: None,
                count: 1,
            },
        )
    }

    /// Prompt for `count` flashcards from `content`.
    #[must_use]
    pub fn flashcards(content: &str, count: usize) -> String {
        Self::build(
            ArtifactKind::FlashcardSet,
            &PromptParams {
                subject: content,
                difficulty: None,
                count,
            },
        )
    }
}

fn difficulty_prefix(difficulty: Option<Difficulty>) -> String {
    difficulty.map_or_else(String::new, |d| format!("{d} "))
}

/// Lists `fields`, indenting the fields of each nested record.
fn write_fields(out: &mut String, fields: &[FieldSpec], depth: usize) {
    let indent = "  ".repeat(depth);
    for field in fields {
        let _ = writeln!(out, "{indent}- '{}': {}", field.name, field.description);
        if let FieldType::RecordList(nested) = field.field_type {
            let _ = writeln!(out, "{indent}  Each item is an object with these exact fields:");
            write_fields(out, nested, depth + 1);
        }
    }
}

const fn example_for(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Mcq => MCQ_EXAMPLE,
        ArtifactKind::FillBlank => FILL_BLANK_EXAMPLE,
        ArtifactKind::Summary => SUMMARY_EXAMPLE,
        ArtifactKind::FlashcardSet => FLASHCARD_EXAMPLE,
    }
}
