//! Markdown study sheet generation.
//!
//! The sheet contains, in order:
//!
//! - The summary (main idea and key points)
//! - Numbered flashcards
//! - Quiz results with the score and a per-question table
//!
//! Sections with no content are omitted.
//!
//! # Example
//!
//! ```rust
//! use studyai_report::{MarkdownGenerator, SheetSummary, StudySheet};
//!
//! let sheet = StudySheet {
//!     title: "Photosynthesis".to_string(),
//!     summary: Some(SheetSummary {
//!         main_idea: "Plants turn light into chemical energy.".to_string(),
//!         key_points: vec!["Happens in chloroplasts".to_string()],
//!     }),
//!     flashcards: vec![],
//!     results: vec![],
//! };
//!
//! let markdown = MarkdownGenerator::new(&sheet).generate();
//! assert!(markdown.contains("# Study Sheet: Photosynthesis"));
//! ```

use std::fmt::Write;

use chrono::Local;

use crate::{ResultRow, ScoreSummary, SheetCard, SheetSummary, StudySheet};

/// Generates Markdown study sheets.
pub struct MarkdownGenerator<'a> {
    sheet: &'a StudySheet,
}

impl<'a> MarkdownGenerator<'a> {
    /// Creates a generator for the given sheet.
    #[must_use]
    pub const fn new(sheet: &'a StudySheet) -> Self {
        Self { sheet }
    }

    /// Generates the complete study sheet.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "# Study Sheet: {}\n",
            escape_markdown(&self.sheet.title)
        );
        if let Some(summary) = &self.sheet.summary {
            write_summary(&mut output, summary);
        }
        if !self.sheet.flashcards.is_empty() {
            write_flashcards(&mut output, &self.sheet.flashcards);
        }
        if !self.sheet.results.is_empty() {
            write_results(&mut output, &self.sheet.results);
        }
        write_footer(&mut output);

        output
    }
}

fn write_summary(output: &mut String, summary: &SheetSummary) {
    let _ = writeln!(output, "## Summary\n");
    let _ = writeln!(output, "**{}**\n", escape_markdown(&summary.main_idea));

    if !summary.key_points.is_empty() {
        let _ = writeln!(output, "### Key Points\n");
        for point in &summary.key_points {
            let _ = writeln!(output, "- {}", escape_markdown(point));
        }
        let _ = writeln!(output);
    }
}

fn write_flashcards(output: &mut String, cards: &[SheetCard]) {
    let _ = writeln!(output, "## Flashcards\n");
    for (i, card) in cards.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. **{}**  \n   {}",
            i + 1,
            escape_markdown(&card.front),
            escape_markdown(&card.back)
        );
    }
    let _ = writeln!(output);
}

fn write_results(output: &mut String, rows: &[ResultRow]) {
    let score = ScoreSummary::from_results(rows);

    let _ = writeln!(output, "## Quiz Results\n");
    let _ = writeln!(
        output,
        "**Score**: {} {}\n",
        score,
        if score.passed() { "&#9989;" } else { "&#10060;" }
    );
    let _ = writeln!(output, "| # | Question | Your Answer | Correct Answer | Result |");
    let _ = writeln!(output, "|---|----------|-------------|----------------|--------|");
    for row in rows {
        let answer = if row.user_answer.trim().is_empty() {
            "*(no answer)*".to_string()
        } else {
            escape_markdown(&row.user_answer)
        };
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            row.question_number,
            escape_markdown(&row.question_text),
            answer,
            escape_markdown(&row.correct_answer),
            if row.is_correct { "Correct" } else { "Incorrect" }
        );
    }
    let _ = writeln!(output);

    let explained: Vec<&ResultRow> = rows
        .iter()
        .filter(|r| !r.explanation.trim().is_empty())
        .collect();
    if !explained.is_empty() {
        let _ = writeln!(output, "### Explanations\n");
        for row in explained {
            let _ = writeln!(
                output,
                "- **Q{}**: {}",
                row.question_number,
                escape_markdown(&row.explanation)
            );
        }
        let _ = writeln!(output);
    }
}

fn write_footer(output: &mut String) {
    let _ = writeln!(output, "---\n");
    let _ = writeln!(
        output,
        "*Generated by Study-AI on {}*",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
}

/// Escapes characters with Markdown meaning.
///
/// Newlines become `<br>` so multi-line text stays inside table cells.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '*' | '_' | '`' | '#' | '[' | ']' | '\\' | '<' | '>' | '|' => {
                result.push('\\');
                result.push(ch);
            }
            '\n' => result.push_str("<br>"),
            _ => result.push(ch),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sheet() -> StudySheet {
        StudySheet {
            title: "Geography".to_string(),
            summary: Some(SheetSummary {
                main_idea: "Capitals of Europe".to_string(),
                key_points: vec![
                    "Paris is in France".to_string(),
                    "Rome is in Italy".to_string(),
                ],
            }),
            flashcards: vec![SheetCard {
                front: "Capital of Spain?".to_string(),
                back: "Madrid".to_string(),
            }],
            results: vec![
                ResultRow {
                    question_number: 1,
                    question_text: "What is the capital of France?".to_string(),
                    question_type: "MCQ".to_string(),
                    user_answer: "Paris".to_string(),
                    correct_answer: "Paris".to_string(),
                    is_correct: true,
                    explanation: "Paris has been the capital for centuries.".to_string(),
                },
                ResultRow {
                    question_number: 2,
                    question_text: "The capital of Italy is _____.".to_string(),
                    question_type: "Fill in the Blank".to_string(),
                    user_answer: String::new(),
                    correct_answer: "Rome".to_string(),
                    is_correct: false,
                    explanation: String::new(),
                },
            ],
        }
    }

    #[test]
    fn test_generate_contains_all_sections() {
        let sheet = sample_sheet();
        let markdown = MarkdownGenerator::new(&sheet).generate();

        assert!(markdown.starts_with("# Study Sheet: Geography\n"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("**Capitals of Europe**"));
        assert!(markdown.contains("- Rome is in Italy"));
        assert!(markdown.contains("## Flashcards"));
        assert!(markdown.contains("1. **Capital of Spain?**"));
        assert!(markdown.contains("## Quiz Results"));
        assert!(markdown.contains("**Score**: 1/2 (50%)"));
        assert!(markdown.contains("*Generated by Study-AI on"));
    }

    #[test]
    fn test_results_table_rows() {
        let sheet = sample_sheet();
        let markdown = MarkdownGenerator::new(&sheet).generate();

        assert!(markdown
            .contains("| 1 | What is the capital of France? | Paris | Paris | Correct |"));
        assert!(markdown.contains(
            "| 2 | The capital of Italy is \\_\\_\\_\\_\\_. | *(no answer)* | Rome | Incorrect |"
        ));
        assert!(markdown.contains("- **Q1**: Paris has been the capital for centuries."));
        assert!(!markdown.contains("**Q2**"));
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let sheet = StudySheet {
            title: "Empty".to_string(),
            ..StudySheet::default()
        };
        let markdown = MarkdownGenerator::new(&sheet).generate();

        assert!(!markdown.contains("## Summary"));
        assert!(!markdown.contains("## Flashcards"));
        assert!(!markdown.contains("## Quiz Results"));
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("a|b"), "a\\|b");
        assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
        assert_eq!(escape_markdown("line1\nline2"), "line1<br>line2");
        assert_eq!(escape_markdown("plain text?"), "plain text?");
    }
}
