//! Study-AI Reports
//!
//! Types and writers for the output of a graded quiz session.
//!
//! # Types
//!
//! - [`ResultRow`] - One graded question, in export column order
//! - [`ScoreSummary`] - Correct/total counts with a percentage
//! - [`StudySheet`] - Everything rendered into the Markdown study sheet
//!
//! # Generators
//!
//! - [`csv::CsvExporter`] - Delimited result export with a header row
//! - [`MarkdownGenerator`] - Human-readable study sheet
//!
//! # Example
//!
//! ```rust
//! use studyai_report::{ResultRow, ScoreSummary};
//! use studyai_report::csv::CsvExporter;
//!
//! let rows = vec![ResultRow {
//!     question_number: 1,
//!     question_text: "What is the capital of France?".to_string(),
//!     question_type: "MCQ".to_string(),
//!     user_answer: "Paris".to_string(),
//!     correct_answer: "Paris".to_string(),
//!     is_correct: true,
//!     explanation: "Paris is the capital of France.".to_string(),
//! }];
//!
//! let score = ScoreSummary::from_results(&rows);
//! assert_eq!(score.to_string(), "1/1 (100%)");
//!
//! let csv = CsvExporter::new(&rows).generate().unwrap();
//! assert!(csv.starts_with("question_number,"));
//! ```

pub mod csv;
mod markdown;

use std::fmt;

pub use markdown::MarkdownGenerator;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while exporting or rendering results.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to encode rows as CSV.
    #[error("failed to write CSV: {0}")]
    Csv(#[from] ::csv::Error),

    /// Failed to read or write report files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid report data.
    #[error("invalid report data: {0}")]
    InvalidData(String),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

// ============================================================================
// Result Rows
// ============================================================================

/// One graded question.
///
/// Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    /// 1-based position of the question in the quiz.
    pub question_number: usize,
    /// The question as shown to the user.
    pub question_text: String,
    /// Human-readable question type (`MCQ` or `Fill in the Blank`).
    pub question_type: String,
    /// What the user submitted; empty when unanswered.
    pub user_answer: String,
    /// The recorded correct answer.
    pub correct_answer: String,
    /// Whether the submission was graded correct.
    pub is_correct: bool,
    /// Why the correct answer is correct.
    pub explanation: String,
}

/// Score over a set of graded results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Number of correct answers.
    pub correct: usize,
    /// Number of questions.
    pub total: usize,
}

/// Minimum percentage considered a pass.
pub const PASS_THRESHOLD_PERCENT: f64 = 50.0;

impl ScoreSummary {
    /// Counts the correct rows.
    #[must_use]
    pub fn from_results(rows: &[ResultRow]) -> Self {
        Self {
            correct: rows.iter().filter(|r| r.is_correct).count(),
            total: rows.len(),
        }
    }

    /// Percentage of correct answers; `0.0` when there are no questions.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64 * 100.0
    }

    /// Returns `true` when the score reaches [`PASS_THRESHOLD_PERCENT`].
    #[must_use]
    pub fn passed(&self) -> bool {
        self.total > 0 && self.percentage() >= PASS_THRESHOLD_PERCENT
    }
}

impl fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({:.0}%)",
            self.correct,
            self.total,
            self.percentage()
        )
    }
}

/// Builds `<prefix>_<YYYYMMDD_HHMMSS>.<ext>`.
#[must_use]
pub fn timestamped_file_name(prefix: &str, ext: &str, at: &NaiveDateTime) -> String {
    format!("{prefix}_{}.{ext}", at.format("%Y%m%d_%H%M%S"))
}

// ============================================================================
// Study Sheet (local copies to avoid a dependency on the core crate)
// ============================================================================

/// Summary section of a study sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSummary {
    /// Central theme of the content.
    pub main_idea: String,
    /// Takeaways in display order.
    pub key_points: Vec<String>,
}

/// One flashcard on a study sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetCard {
    /// Prompt side.
    pub front: String,
    /// Answer side.
    pub back: String,
}

/// Everything rendered into a Markdown study sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySheet {
    /// Topic or source description used as the title.
    pub title: String,
    /// Generated summary, if any.
    pub summary: Option<SheetSummary>,
    /// Generated flashcards.
    pub flashcards: Vec<SheetCard>,
    /// Graded quiz results; empty before evaluation.
    pub results: Vec<ResultRow>,
}
