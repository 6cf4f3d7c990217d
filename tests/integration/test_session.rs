//! End-to-end tests for a study session.
//!
//! These drive the full stack (session, generator, generation client, schema
//! validation and CSV export) against a scripted model.

use std::path::PathBuf;

use studyai_core::{
    ArtifactGenerator, ArtifactKind, BuildOptions, Content, Difficulty, ExportOutcome,
    GenerationClient, QuestionType, SessionStatus, StudyError, StudySession,
};
use studyai_llm::{LlmError, ScriptedModel};
use studyai_report::ResultRow;

const SUMMARY: &str = r#"{
    "main_idea": "Photosynthesis turns light into chemical energy.",
    "key_points": ["Happens in chloroplasts", "Needs carbon dioxide and water"]
}"#;

const FLASHCARDS: &str = r#"```json
{"flashcards": [
    {"front": "Where does photosynthesis happen?", "back": "In chloroplasts"},
    {"front": "Which pigment absorbs light?", "back": "Chlorophyll"}
]}
```"#;

/// Builds an MCQ reply whose correct answer is the `n`th option.
fn mcq(n: usize) -> String {
    let options = ["Oxygen", "Carbon dioxide", "Nitrogen", "Helium"];
    format!(
        r#"{{"question": "Question {n}: which gas do plants absorb?", "options": ["Oxygen", "Carbon dioxide", "Nitrogen", "Helium"], "correct_answer": "{}", "explanation": "Plants fix carbon dioxide."}}"#,
        options[n % options.len()]
    )
}

const FILL_BLANK: &str = r#"{
    "question": "The capital of France is _____.",
    "answer": "Paris",
    "explanation": "Paris has been the capital since the 10th century."
}"#;

fn generator(model: &ScriptedModel) -> ArtifactGenerator<ScriptedModel> {
    ArtifactGenerator::new(GenerationClient::new(model.clone()))
}

fn options(question_type: QuestionType, question_count: usize) -> BuildOptions {
    BuildOptions {
        question_type,
        difficulty: Difficulty::Medium,
        question_count,
        flashcard_count: 2,
    }
}

fn temp_output_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

/// Session over "Photosynthesis" with three MCQs, ready to attempt.
async fn photosynthesis_session() -> StudySession {
    let model = ScriptedModel::new()
        .with_reply(SUMMARY)
        .with_reply(FLASHCARDS)
        .with_reply(mcq(0))
        .with_reply(mcq(1))
        .with_reply(mcq(2));

    let mut session = StudySession::new();
    session
        .provide_content(Content::from_topic("Photosynthesis"))
        .expect("content accepted");
    session
        .build_session(
            &generator(&model),
            &options(QuestionType::MultipleChoice, 3),
            |_| {},
        )
        .await
        .expect("build succeeds");
    session
}

// ============================================================================
// Scenarios
// ============================================================================

/// Scenario A: three MCQs, each with four options containing the answer.
#[tokio::test]
async fn test_scenario_a_builds_three_mcqs() {
    let session = photosynthesis_session().await;

    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(session.questions().len(), 3);
    for question in session.questions() {
        assert_eq!(question.kind, QuestionType::MultipleChoice);
        assert_eq!(question.options.len(), 4);
        assert!(question.options.contains(&question.correct_answer));
    }

    // Code fences around the flashcard reply are tolerated.
    assert_eq!(session.flashcards().len(), 2);
    assert!(session.summary().is_some());
}

/// Scenario B: all answers correct gives 3/3.
#[tokio::test]
async fn test_scenario_b_all_correct() {
    let mut session = photosynthesis_session().await;
    session.start_attempt().expect("attempt starts");

    let correct: Vec<String> = session
        .questions()
        .iter()
        .map(|q| q.correct_answer.clone())
        .collect();
    for (i, answer) in correct.into_iter().enumerate() {
        session.record_answer(i, answer).expect("answer recorded");
    }

    let results = session.evaluate().expect("evaluates").to_vec();
    assert!(results.iter().all(|r| r.is_correct));

    let score = session.score();
    assert_eq!(score.correct, 3);
    assert_eq!(score.total, 3);
    assert!((score.percentage() - 100.0).abs() < f64::EPSILON);
    assert_eq!(session.status(), SessionStatus::Submitted);
}

/// Scenario C: fill-blank grading ignores case and surrounding whitespace.
#[tokio::test]
async fn test_scenario_c_fill_blank_grading() {
    let model = ScriptedModel::new()
        .with_reply(SUMMARY)
        .with_reply(FLASHCARDS)
        .with_reply(FILL_BLANK);

    let mut session = StudySession::new();
    session
        .provide_content(Content::from_text("France is a country in Europe."))
        .expect("content accepted");
    session
        .build_session(&generator(&model), &options(QuestionType::FillBlank, 1), |_| {})
        .await
        .expect("build succeeds");

    session.start_attempt().expect("attempt starts");
    session.record_answer(0, " paris ").expect("answer recorded");

    let results = session.evaluate().expect("evaluates");
    assert!(results[0].is_correct);
    assert_eq!(results[0].question_type, "Fill in the Blank");
    assert_eq!(results[0].correct_answer, "Paris");
}

/// Scenario D: a question whose model calls always fail aborts the build.
#[tokio::test]
async fn test_scenario_d_generation_failure() {
    let model = ScriptedModel::new()
        .with_reply(SUMMARY)
        .with_reply(FLASHCARDS)
        .with_reply(mcq(0))
        .with_fallback_error(LlmError::from_status(503, "service unavailable"));

    let mut session = StudySession::new();
    session
        .provide_content(Content::from_topic("Photosynthesis"))
        .expect("content accepted");

    let mut progress = Vec::new();
    let err = session
        .build_session(
            &generator(&model),
            &options(QuestionType::MultipleChoice, 3),
            |p| progress.push(p),
        )
        .await
        .expect_err("build fails");

    match err {
        StudyError::Generation { kind, attempts, .. } => {
            assert_eq!(kind, ArtifactKind::Mcq);
            assert_eq!(attempts, 3);
        }
        other => panic!("expected Generation error, got {other:?}"),
    }
    // summary + flashcards + first question + three failed attempts
    assert_eq!(model.calls(), 6);
    assert_eq!(progress.len(), 1);

    assert_ne!(session.status(), SessionStatus::Ready);
    assert_eq!(session.status(), SessionStatus::ContentProvided);
    assert!(session.summary().is_some());
    assert_eq!(session.questions().len(), 1);
}

/// A failed build can be retried with the same session.
#[tokio::test]
async fn test_retry_after_failed_build() {
    let failing = ScriptedModel::new().with_fallback_error(LlmError::network("offline"));
    let mut session = StudySession::new();
    session
        .provide_content(Content::from_topic("Photosynthesis"))
        .expect("content accepted");
    assert!(session
        .build_session(
            &generator(&failing),
            &options(QuestionType::MultipleChoice, 1),
            |_| {}
        )
        .await
        .is_err());
    assert!(session.summary().is_none());
    assert_eq!(session.warnings().len(), 2);

    let working = ScriptedModel::new()
        .with_reply(SUMMARY)
        .with_reply(FLASHCARDS)
        .with_reply(mcq(1));
    session
        .build_session(
            &generator(&working),
            &options(QuestionType::MultipleChoice, 1),
            |_| {},
        )
        .await
        .expect("retry succeeds");

    assert_eq!(session.status(), SessionStatus::Ready);
    assert!(session.warnings().is_empty());
}

// ============================================================================
// Export
// ============================================================================

#[tokio::test]
async fn test_save_results_writes_one_row_per_question() {
    let mut session = photosynthesis_session().await;
    session.start_attempt().expect("attempt starts");
    session.record_answer(0, "Oxygen").expect("answer recorded");
    session.record_answer(1, "oxygen").expect("answer recorded");
    session.evaluate().expect("evaluates");

    let dir = temp_output_dir("studyai_it_export");
    let path = match session.save_results(&dir, "quiz_results") {
        ExportOutcome::Saved(path) => path,
        other => panic!("expected Saved, got {other:?}"),
    };

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .expect("file name");
    assert!(name.starts_with("quiz_results_"));
    assert!(name.ends_with(".csv"));
    // quiz_results_YYYYMMDD_HHMMSS.csv
    assert_eq!(name.len(), "quiz_results_".len() + 15 + ".csv".len());

    let mut reader = csv::Reader::from_path(&path).expect("readable CSV");
    let headers = reader.headers().expect("header row").clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec![
            "question_number",
            "question_text",
            "question_type",
            "user_answer",
            "correct_answer",
            "is_correct",
            "explanation"
        ]
    );

    let rows: Vec<ResultRow> = reader
        .deserialize()
        .collect::<Result<_, _>>()
        .expect("rows decode");
    assert_eq!(rows.len(), session.results().len());
    assert_eq!(rows, session.results());
    assert!(rows[0].is_correct);
    assert!(!rows[1].is_correct);
    assert!(!rows[2].is_correct);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_save_results_without_results_writes_nothing() {
    let session = StudySession::new();
    let dir = temp_output_dir("studyai_it_no_export");

    assert!(matches!(
        session.save_results(&dir, "quiz_results"),
        ExportOutcome::NothingToSave
    ));
    assert!(!dir.exists());
}

// ============================================================================
// Content and reset
// ============================================================================

#[test]
fn test_empty_content_is_rejected_before_generation() {
    let mut session = StudySession::new();
    let err = session
        .provide_content(Content::from_text(" \n\t "))
        .expect_err("empty content rejected");
    assert!(err.is_content_error());
    assert_eq!(session.status(), SessionStatus::Empty);
}

#[tokio::test]
async fn test_reset_clears_everything() {
    let mut session = photosynthesis_session().await;
    session.start_attempt().expect("attempt starts");
    session.evaluate().expect("evaluates");

    session.reset();

    assert_eq!(session.status(), SessionStatus::Empty);
    assert!(session.content().is_none());
    assert!(session.summary().is_none());
    assert!(session.flashcards().is_empty());
    assert!(session.questions().is_empty());
    assert!(session.answers().is_empty());
    assert!(session.results().is_empty());
}
