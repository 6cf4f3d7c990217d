//! Configuration types for Study-AI.
//!
//! Settings are read from an optional `studyai.json` (camelCase keys, every
//! key optional, unknown keys ignored) and validated after parsing. The model
//! credential is never stored in the file; it comes from `GROQ_API_KEY`.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use studyai_llm::{ModelSettings, DEFAULT_BASE_URL, DEFAULT_MODEL};

use crate::error::{Result, StudyError};

/// The default config file name.
pub const CONFIG_FILE_NAME: &str = "studyai.json";

/// Environment variable holding the model credential.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Upper bound for quiz questions per session.
pub const MAX_QUESTION_COUNT: usize = 25;

/// Upper bound for flashcards per session.
pub const MAX_FLASHCARD_COUNT: usize = 15;

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_temperature() -> f32 {
    studyai_llm::DEFAULT_TEMPERATURE
}

const fn default_model_max_retries() -> u32 {
    studyai_llm::DEFAULT_MAX_RETRIES
}

const fn default_request_timeout() -> u64 {
    studyai_llm::DEFAULT_TIMEOUT_SECS
}

/// Default attempts per artifact in the generation loop.
const fn default_max_attempts() -> u32 {
    3
}

/// Default character budget for the summarization source.
const fn default_summary_char_limit() -> usize {
    4000
}

/// Default character budget for quiz and flashcard sources.
const fn default_source_char_limit() -> usize {
    2000
}

fn default_output_dir() -> String {
    "results".to_string()
}

fn default_results_prefix() -> String {
    "quiz_results".to_string()
}

const fn default_question_count() -> usize {
    5
}

const fn default_flashcard_count() -> usize {
    5
}

/// Main configuration for Study-AI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// OpenAI-compatible endpoint base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sampling temperature, 0.0 to 2.0.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Transport-level retries inside the model client.
    #[serde(default = "default_model_max_retries")]
    pub model_max_retries: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Attempts per artifact in the generation loop.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// How output structure is requested from the model.
    #[serde(default)]
    pub structured_output: StructuredOutput,

    /// Characters of content passed to the summarizer.
    #[serde(default = "default_summary_char_limit")]
    pub summary_char_limit: usize,

    /// Characters of content passed to quiz and flashcard generation.
    #[serde(default = "default_source_char_limit")]
    pub source_char_limit: usize,

    /// Directory for exported results.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// File name prefix for exported results.
    #[serde(default = "default_results_prefix")]
    pub results_prefix: String,

    /// Default quiz settings.
    #[serde(default)]
    pub quiz: QuizDefaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            model_max_retries: default_model_max_retries(),
            request_timeout_secs: default_request_timeout(),
            max_attempts: default_max_attempts(),
            structured_output: StructuredOutput::default(),
            summary_char_limit: default_summary_char_limit(),
            source_char_limit: default_source_char_limit(),
            output_dir: default_output_dir(),
            results_prefix: default_results_prefix(),
            quiz: QuizDefaults::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            StudyError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads `studyai.json` from the given directory, or defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::ConfigParseError` if the file cannot be read or
    /// contains invalid JSON or enum values.
    ///
    /// Returns `StudyError::ConfigValidationError` if a value is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(StudyError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| StudyError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::ConfigValidationError` for the first failing check.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(StudyError::config_validation(
                "model must not be empty",
                "Set model to a Groq model id such as 'llama-3.3-70b-versatile'",
            ));
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(StudyError::config_validation(
                format!("baseUrl '{}' is not an http(s) URL", self.base_url),
                "Set baseUrl to an OpenAI-compatible endpoint, e.g. https://api.groq.com/openai/v1",
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(StudyError::config_validation(
                format!("temperature must be between 0.0 and 2.0, got {}", self.temperature),
                "Set temperature to a value between 0.0 and 2.0 in your studyai.json",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(StudyError::config_validation(
                "requestTimeoutSecs must be greater than 0",
                "Set requestTimeoutSecs to at least 1 second in your studyai.json",
            ));
        }

        if self.max_attempts == 0 {
            return Err(StudyError::config_validation(
                "maxAttempts must be greater than 0",
                "Set maxAttempts to at least 1 in your studyai.json",
            ));
        }

        if self.summary_char_limit == 0 || self.source_char_limit == 0 {
            return Err(StudyError::config_validation(
                "summaryCharLimit and sourceCharLimit must be greater than 0",
                "Remove the limits from studyai.json to use the defaults (4000 and 2000)",
            ));
        }

        if self.output_dir.trim().is_empty() {
            return Err(StudyError::config_validation(
                "outputDir must not be empty",
                "Provide a valid output directory path in your studyai.json (use '.' for current directory)",
            ));
        }

        if self.results_prefix.trim().is_empty() {
            return Err(StudyError::config_validation(
                "resultsPrefix must not be empty",
                "Set resultsPrefix, e.g. \"quiz_results\"",
            ));
        }

        self.quiz.validate()
    }

    /// Builds model client settings from this configuration.
    #[must_use]
    pub fn model_settings(&self, api_key: impl Into<String>) -> ModelSettings {
        ModelSettings::new(api_key)
            .with_base_url(self.base_url.clone())
            .with_model(self.model.clone())
            .with_temperature(self.temperature)
            .with_max_retries(self.model_max_retries)
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
    }
}

/// Reads the model credential from the environment, honouring a `.env` file.
///
/// # Errors
///
/// Returns `StudyError::MissingApiKey` if the variable is unset or blank.
pub fn resolve_api_key() -> Result<String> {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    parse_api_key(std::env::var(API_KEY_ENV).ok())
}

fn parse_api_key(value: Option<String>) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(StudyError::MissingApiKey)
}

// ============================================================================
// Quiz defaults
// ============================================================================

/// Default quiz settings, overridable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDefaults {
    /// Question type for the quiz.
    #[serde(default)]
    pub question_type: QuestionType,

    /// Difficulty of quiz questions.
    #[serde(default)]
    pub difficulty: Difficulty,

    /// Number of quiz questions (1 to 25).
    #[serde(default = "default_question_count")]
    pub question_count: usize,

    /// Number of flashcards (1 to 15).
    #[serde(default = "default_flashcard_count")]
    pub flashcard_count: usize,
}

impl Default for QuizDefaults {
    fn default() -> Self {
        Self {
            question_type: QuestionType::default(),
            difficulty: Difficulty::default(),
            question_count: default_question_count(),
            flashcard_count: default_flashcard_count(),
        }
    }
}

impl QuizDefaults {
    /// Validates the counts.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::ConfigValidationError` if a count is out of range.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_QUESTION_COUNT).contains(&self.question_count) {
            return Err(StudyError::config_validation(
                format!(
                    "quiz.questionCount must be between 1 and {MAX_QUESTION_COUNT}, got {}",
                    self.question_count
                ),
                format!("Ask for between 1 and {MAX_QUESTION_COUNT} questions"),
            ));
        }

        if !(1..=MAX_FLASHCARD_COUNT).contains(&self.flashcard_count) {
            return Err(StudyError::config_validation(
                format!(
                    "quiz.flashcardCount must be between 1 and {MAX_FLASHCARD_COUNT}, got {}",
                    self.flashcard_count
                ),
                format!("Ask for between 1 and {MAX_FLASHCARD_COUNT} flashcards"),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// QuestionType
// ============================================================================

/// Type of quiz question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuestionType {
    /// Four-option multiple choice (default).
    #[default]
    MultipleChoice,
    /// Free-text fill in the blank.
    FillBlank,
}

impl QuestionType {
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "mcq" | "multiple_choice" => Some(Self::MultipleChoice),
            "fill_blank" | "fill_in_the_blank" | "fillblank" => Some(Self::FillBlank),
            _ => None,
        }
    }

    /// Label used in result rows and exports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MultipleChoice => "MCQ",
            Self::FillBlank => "Fill in the Blank",
        }
    }

    const fn as_config_str(self) -> &'static str {
        match self {
            Self::MultipleChoice => "mcq",
            Self::FillBlank => "fill_blank",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_str_case_insensitive(s).ok_or_else(|| {
            format!("invalid question type '{s}': expected one of 'mcq', 'fill_blank'")
        })
    }
}

impl<'de> Deserialize<'de> for QuestionType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for QuestionType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_config_str())
    }
}

// ============================================================================
// Difficulty
// ============================================================================

/// Difficulty requested for quiz questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Difficulty {
    /// Introductory.
    Easy,
    /// Intermediate (default).
    #[default]
    Medium,
    /// Advanced.
    Hard,
}

impl Difficulty {
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    /// Lowercase name, as used in prompts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_str_case_insensitive(s).ok_or_else(|| {
            format!("invalid difficulty '{s}': expected one of 'easy', 'medium', 'hard'")
        })
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for Difficulty {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

// ============================================================================
// StructuredOutput
// ============================================================================

/// How the model is asked to structure its output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StructuredOutput {
    /// JSON mode; the schema is described in the prompt only (default).
    #[default]
    JsonObject,
    /// Schema-constrained decoding with the artifact's JSON Schema.
    JsonSchema,
}

impl StructuredOutput {
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "jsonobject" | "json_object" => Some(Self::JsonObject),
            "jsonschema" | "json_schema" => Some(Self::JsonSchema),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for StructuredOutput {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid structured output mode '{s}': expected one of 'jsonObject', 'jsonSchema'"
            ))
        })
    }
}

impl Serialize for StructuredOutput {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            Self::JsonObject => "jsonObject",
            Self::JsonSchema => "jsonSchema",
        };
        serializer.serialize_str(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = Config::default();

        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.base_url, "https://api.groq.com/openai/v1");
        assert!((config.temperature - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.model_max_retries, 3);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.summary_char_limit, 4000);
        assert_eq!(config.source_char_limit, 2000);
        assert_eq!(config.output_dir, "results");
        assert_eq!(config.results_prefix, "quiz_results");
        assert_eq!(config.structured_output, StructuredOutput::JsonObject);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_quiz_default_values() {
        let quiz = QuizDefaults::default();
        assert_eq!(quiz.question_type, QuestionType::MultipleChoice);
        assert_eq!(quiz.difficulty, Difficulty::Medium);
        assert_eq!(quiz.question_count, 5);
        assert_eq!(quiz.flashcard_count, 5);
    }

    #[test]
    fn test_question_type_case_insensitive() {
        for s in ["mcq", "MCQ", "multiple-choice", "Multiple Choice"] {
            assert_eq!(s.parse::<QuestionType>().unwrap(), QuestionType::MultipleChoice);
        }
        for s in ["fill_blank", "Fill-Blank", "fill in the blank", "FILLBLANK"] {
            assert_eq!(s.parse::<QuestionType>().unwrap(), QuestionType::FillBlank);
        }
        let err = "essay".parse::<QuestionType>().unwrap_err();
        assert!(err.contains("invalid question type"));
    }

    #[test]
    fn test_question_type_serialization() {
        assert_eq!(
            serde_json::to_string(&QuestionType::FillBlank).unwrap(),
            r#""fill_blank""#
        );
        assert_eq!(QuestionType::MultipleChoice.to_string(), "MCQ");
        assert_eq!(QuestionType::FillBlank.to_string(), "Fill in the Blank");
    }

    #[test]
    fn test_difficulty_case_insensitive() {
        let d: Difficulty = serde_json::from_str(r#""HARD""#).unwrap();
        assert_eq!(d, Difficulty::Hard);
        assert_eq!(serde_json::to_string(&Difficulty::Easy).unwrap(), r#""easy""#);

        let result: std::result::Result<Difficulty, _> = serde_json::from_str(r#""extreme""#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("invalid difficulty"));
        assert!(err.contains("extreme"));
    }

    #[test]
    fn test_structured_output_case_insensitive() {
        let mode: StructuredOutput = serde_json::from_str(r#""JSONSCHEMA""#).unwrap();
        assert_eq!(mode, StructuredOutput::JsonSchema);
        assert_eq!(
            serde_json::to_string(&StructuredOutput::JsonObject).unwrap(),
            r#""jsonObject""#
        );
    }

    #[test]
    fn test_config_deserialization_with_overrides() {
        let json = r#"{
            "model": "llama-3.1-8b-instant",
            "temperature": 0.2,
            "maxAttempts": 5,
            "structuredOutput": "jsonSchema",
            "quiz": { "questionType": "fill_blank", "questionCount": 10 }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.model, "llama-3.1-8b-instant");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.structured_output, StructuredOutput::JsonSchema);
        assert_eq!(config.quiz.question_type, QuestionType::FillBlank);
        assert_eq!(config.quiz.question_count, 10);
        // Unspecified nested keys keep their defaults
        assert_eq!(config.quiz.flashcard_count, 5);
        assert_eq!(config.quiz.difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let json = r#"{ "model": "m", "unknownField": true, "quiz": { "extra": 1 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.model, "m");
    }

    #[test]
    fn test_load_from_file_valid_json() {
        use std::io::Write;

        let config_path = std::env::temp_dir().join("test_studyai_valid.json");
        let json = r#"{ "outputDir": "out", "quiz": { "difficulty": "Easy" } }"#;
        let mut file = std::fs::File::create(&config_path).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.output_dir, "out");
        assert_eq!(config.quiz.difficulty, Difficulty::Easy);
        assert_eq!(config.max_attempts, 3);

        std::fs::remove_file(&config_path).ok();
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        use std::io::Write;

        let config_path = std::env::temp_dir().join("test_studyai_invalid.json");
        let mut file = std::fs::File::create(&config_path).unwrap();
        file.write_all(b"{ not valid json }").unwrap();

        let err = Config::load_from_file(&config_path).unwrap_err();
        assert!(
            matches!(&err, StudyError::ConfigParseError { path, message } if *path == config_path && !message.is_empty()),
            "Expected ConfigParseError with correct path, got: {err:?}"
        );

        std::fs::remove_file(&config_path).ok();
    }

    #[test]
    fn test_load_from_file_nonexistent_returns_default() {
        let config = Config::load_from_file(&PathBuf::from("/nonexistent/studyai.json")).unwrap();
        assert_eq!(config.model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_load_from_dir_finds_config() {
        use std::io::Write;

        let dir = std::env::temp_dir().join("test_studyai_config_dir");
        std::fs::create_dir_all(&dir).unwrap();
        let config_path = dir.join(CONFIG_FILE_NAME);
        let mut file = std::fs::File::create(&config_path).unwrap();
        file.write_all(br#"{ "resultsPrefix": "bio" }"#).unwrap();

        let config = Config::load_from_dir(&dir).unwrap();
        assert_eq!(config.results_prefix, "bio");

        std::fs::remove_file(&config_path).ok();
        std::fs::remove_dir(&dir).ok();
    }

    #[test]
    fn test_validation_temperature_range() {
        let config = Config {
            temperature: 2.5,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_validation_zero_attempts() {
        let config = Config {
            max_attempts: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(StudyError::ConfigValidationError { message, .. }) if message.contains("maxAttempts")
        ));
    }

    #[test]
    fn test_validation_bad_base_url() {
        let config = Config {
            base_url: "api.groq.com".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_quiz_counts() {
        let mut config = Config::default();
        config.quiz.question_count = 0;
        assert!(config.validate().is_err());

        config.quiz.question_count = 25;
        assert!(config.validate().is_ok());

        config.quiz.flashcard_count = 16;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("flashcardCount"));
    }

    #[test]
    fn test_model_settings_from_config() {
        let config = Config {
            model: "m".to_string(),
            request_timeout_secs: 30,
            model_max_retries: 1,
            ..Config::default()
        };
        let settings = config.model_settings("key");
        assert_eq!(settings.api_key, "key");
        assert_eq!(settings.model, "m");
        assert_eq!(settings.max_retries, 1);
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_api_key() {
        assert_eq!(parse_api_key(Some(" gsk_1 ".to_string())).unwrap(), "gsk_1");
        assert!(matches!(parse_api_key(Some("  ".to_string())), Err(StudyError::MissingApiKey)));
        assert!(matches!(parse_api_key(None), Err(StudyError::MissingApiKey)));
    }
}
