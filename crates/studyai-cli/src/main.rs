//! Study-AI CLI
//!
//! Builds a study session from a topic, a text file or a PDF, runs the quiz
//! in the terminal and saves the graded results.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use studyai_core::{
    resolve_api_key, ArtifactGenerator, BuildOptions, Config, Content, Difficulty, ExportOutcome,
    GenerationClient, Question, QuestionType, StudySession,
};
use studyai_llm::GroqClient;
use studyai_report::{timestamped_file_name, MarkdownGenerator, ResultRow};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Option letters shown next to MCQ options.
const OPTION_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// File name prefix for the Markdown study sheet.
const STUDY_SHEET_PREFIX: &str = "study_sheet";

/// Study-AI - Summaries, Flashcards and Quizzes
///
/// Turns a topic, your notes or a PDF into a summary, a set of flashcards and
/// a quiz, then grades your answers.
#[derive(Parser, Debug)]
#[command(name = "studyai")]
#[command(version, about, long_about = None)]
struct Args {
    /// Topic to study (used when neither --text nor --pdf is given)
    #[arg(value_name = "TOPIC")]
    topic: Option<String>,

    /// Study the contents of a UTF-8 text file
    #[arg(long, value_name = "FILE", conflicts_with_all = ["topic", "pdf"])]
    text: Option<PathBuf>,

    /// Study the text extracted from a PDF
    #[arg(long, value_name = "FILE", conflicts_with = "topic")]
    pdf: Option<PathBuf>,

    /// Path to configuration file (default: studyai.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Output directory for results
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Question type: mcq or fill-blank
    #[arg(short = 't', long, value_name = "TYPE")]
    question_type: Option<QuestionType>,

    /// Difficulty: easy, medium or hard
    #[arg(short, long, value_name = "LEVEL")]
    difficulty: Option<Difficulty>,

    /// Number of quiz questions (1-25)
    #[arg(short = 'n', long, value_name = "N")]
    questions: Option<usize>,

    /// Number of flashcards (1-15)
    #[arg(short, long, value_name = "N")]
    flashcards: Option<usize>,

    /// Read answers from a file, one per line, instead of prompting
    #[arg(long, value_name = "FILE")]
    answers: Option<PathBuf>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Runs one study session end to end.
async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(ref output_dir) = args.output_dir {
        config.output_dir.clone_from(output_dir);
    }
    if let Some(question_type) = args.question_type {
        config.quiz.question_type = question_type;
    }
    if let Some(difficulty) = args.difficulty {
        config.quiz.difficulty = difficulty;
    }
    if let Some(questions) = args.questions {
        config.quiz.question_count = questions;
    }
    if let Some(flashcards) = args.flashcards {
        config.quiz.flashcard_count = flashcards;
    }

    // Re-validate after overrides
    config.validate()?;

    print_config(&config);

    let content = resolve_content(&args).await?;
    let mut session = StudySession::from_config(&config);
    session.provide_content(content)?;

    let api_key = resolve_api_key()?;
    let model = GroqClient::new(config.model_settings(api_key))?;
    let client = GenerationClient::new(model)
        .with_max_attempts(config.max_attempts)
        .with_structured_output(config.structured_output);
    let generator = ArtifactGenerator::new(client);

    println!();
    println!("Generating study materials...");
    let options = BuildOptions::from(config.quiz);
    session
        .build_session(&generator, &options, |fraction| {
            print!("\r  Quiz questions: {:>3.0}%", fraction * 100.0);
            let _ = std::io::stdout().flush();
        })
        .await?;
    println!();

    for warning in session.warnings() {
        println!("  Warning: {warning}");
    }

    print_summary(&session);
    print_flashcards(&session);

    session.start_attempt()?;
    let raw_answers = match args.answers {
        Some(ref path) => read_answer_file(path).await?,
        None => prompt_answers(session.questions()).await?,
    };
    for (index, question) in session.questions().to_vec().iter().enumerate() {
        let raw = raw_answers.get(index).map_or("", String::as_str);
        session.record_answer(index, resolve_answer(question, raw))?;
    }

    let results = session.evaluate()?.to_vec();
    print_results(&results);

    let score = session.score();
    println!();
    if score.passed() {
        println!("Score: {score} - passed");
    } else {
        println!("Score: {score} - keep studying");
    }

    save_outputs(&session, &config);

    Ok(())
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Resolves the content source from the arguments.
async fn resolve_content(args: &Args) -> anyhow::Result<Content> {
    if let Some(ref path) = args.text {
        tracing::info!(path = %path.display(), "Loading text content");
        return Ok(Content::load_text_file(path)?);
    }
    if let Some(ref path) = args.pdf {
        tracing::info!(path = %path.display(), "Extracting PDF content");
        return Ok(Content::load_pdf_file(path).await?);
    }
    match args.topic {
        Some(ref topic) => Ok(Content::from_topic(topic.clone())),
        None => anyhow::bail!(
            "No content given\n\nSuggestion: Pass a topic, or use --text FILE or --pdf FILE"
        ),
    }
}

/// Prints the loaded configuration.
fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Model: {}", config.model);
    println!("  Question type: {}", config.quiz.question_type);
    println!("  Difficulty: {}", config.quiz.difficulty);
    println!("  Questions: {}", config.quiz.question_count);
    println!("  Flashcards: {}", config.quiz.flashcard_count);
    println!("  Output directory: {}", config.output_dir);
}

fn print_summary(session: &StudySession) {
    let Some(summary) = session.summary() else {
        return;
    };
    println!();
    println!("Summary");
    println!("  {}", summary.main_idea);
    for point in &summary.key_points {
        println!("  - {point}");
    }
}

fn print_flashcards(session: &StudySession) {
    if session.flashcards().is_empty() {
        return;
    }
    println!();
    println!("Flashcards");
    for (i, card) in session.flashcards().iter().enumerate() {
        println!("  {}. {}", i + 1, card.front);
        println!("     {}", card.back);
    }
}

/// Prints one question with its options.
fn print_question(index: usize, question: &Question) {
    println!();
    println!("Question {}: {}", index + 1, question.prompt_text);
    for (letter, option) in OPTION_LETTERS.iter().zip(&question.options) {
        println!("  {letter}. {option}");
    }
}

/// Asks for one answer per question on stdin.
async fn prompt_answers(questions: &[Question]) -> anyhow::Result<Vec<String>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut answers = Vec::with_capacity(questions.len());

    println!();
    println!("Quiz ({} questions)", questions.len());
    for (index, question) in questions.iter().enumerate() {
        print_question(index, question);
        match question.kind {
            QuestionType::MultipleChoice => print!("Your answer (A-D): "),
            QuestionType::FillBlank => print!("Your answer: "),
        }
        std::io::stdout().flush()?;

        // End of input leaves the remaining questions unanswered.
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        answers.push(line);
    }

    Ok(answers)
}

/// Reads answers from a file, one per line.
async fn read_answer_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to read answers file: {e}\n\nPath: {}",
            path.display()
        )
    })?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Turns typed input into the answer recorded for `question`.
///
/// MCQ input may be the option text, a letter A-D or a number 1-4. Input
/// that matches none of these is kept as typed and grades as incorrect.
fn resolve_answer(question: &Question, raw: &str) -> String {
    let input = raw.trim();
    if input.is_empty() || question.kind != QuestionType::MultipleChoice {
        return input.to_string();
    }
    if question.options.iter().any(|o| o == input) {
        return input.to_string();
    }

    let index = match input.to_ascii_uppercase().as_str() {
        "A" | "1" => Some(0),
        "B" | "2" => Some(1),
        "C" | "3" => Some(2),
        "D" | "4" => Some(3),
        _ => None,
    };

    index
        .and_then(|i| question.options.get(i))
        .map_or_else(|| input.to_string(), Clone::clone)
}

fn print_results(results: &[ResultRow]) {
    println!();
    println!("Results");
    for row in results {
        let mark = if row.is_correct { "correct" } else { "incorrect" };
        println!("  {}. [{mark}] {}", row.question_number, row.question_text);
        let answer = if row.user_answer.is_empty() {
            "(no answer)"
        } else {
            row.user_answer.as_str()
        };
        println!("     Your answer: {answer}");
        if !row.is_correct {
            println!("     Correct answer: {}", row.correct_answer);
        }
        if !row.explanation.is_empty() {
            println!("     {}", row.explanation);
        }
    }
}

/// Saves the CSV results and the Markdown study sheet.
///
/// Failures are reported but never end the run.
fn save_outputs(session: &StudySession, config: &Config) {
    let output_dir = PathBuf::from(&config.output_dir);

    println!();
    match session.save_results(&output_dir, &config.results_prefix) {
        ExportOutcome::Saved(path) => println!("Results saved: {}", path.display()),
        ExportOutcome::NothingToSave => println!("No results to save"),
        ExportOutcome::Failed(e) => eprintln!("Warning: {e}"),
    }

    let markdown = MarkdownGenerator::new(&session.study_sheet()).generate();
    let name = timestamped_file_name(STUDY_SHEET_PREFIX, "md", &Local::now().naive_local());
    let path = output_dir.join(name);
    match std::fs::create_dir_all(&output_dir).and_then(|()| std::fs::write(&path, markdown)) {
        Ok(()) => println!("Study sheet saved: {}", path.display()),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write study sheet");
            eprintln!("Warning: failed to write study sheet {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn mcq() -> Question {
        Question {
            kind: QuestionType::MultipleChoice,
            prompt_text: "Capital of France?".to_string(),
            options: vec![
                "London".to_string(),
                "Paris".to_string(),
                "Rome".to_string(),
                "Madrid".to_string(),
            ],
            correct_answer: "Paris".to_string(),
            explanation: String::new(),
        }
    }

    #[test]
    fn test_resolve_answer_by_letter_and_number() {
        let q = mcq();
        assert_eq!(resolve_answer(&q, "b"), "Paris");
        assert_eq!(resolve_answer(&q, " B "), "Paris");
        assert_eq!(resolve_answer(&q, "4"), "Madrid");
    }

    #[test]
    fn test_resolve_answer_by_text() {
        let q = mcq();
        assert_eq!(resolve_answer(&q, "Rome"), "Rome");
        // Case is preserved so grading stays exact.
        assert_eq!(resolve_answer(&q, "paris"), "paris");
        assert_eq!(resolve_answer(&q, "E"), "E");
        assert_eq!(resolve_answer(&q, ""), "");
    }

    #[test]
    fn test_resolve_answer_prefers_option_text() {
        let mut q = mcq();
        q.options = vec!["4".into(), "3".into(), "2".into(), "1".into()];
        assert_eq!(resolve_answer(&q, "1"), "1");
    }

    #[test]
    fn test_fill_blank_answers_pass_through() {
        let q = Question {
            kind: QuestionType::FillBlank,
            options: Vec::new(),
            ..mcq()
        };
        assert_eq!(resolve_answer(&q, " A "), "A");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "studyai",
            "Photosynthesis",
            "-t",
            "fill-blank",
            "-d",
            "hard",
            "-n",
            "3",
        ])
        .unwrap();
        assert_eq!(args.topic.as_deref(), Some("Photosynthesis"));
        assert_eq!(args.question_type, Some(QuestionType::FillBlank));
        assert_eq!(args.difficulty, Some(Difficulty::Hard));
        assert_eq!(args.questions, Some(3));
    }

    #[test]
    fn test_args_reject_topic_with_file() {
        assert!(Args::try_parse_from(["studyai", "Topic", "--text", "notes.txt"]).is_err());
        assert!(Args::try_parse_from(["studyai", "--text", "a.txt", "--pdf", "b.pdf"]).is_err());
    }
}
