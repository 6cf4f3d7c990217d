//! Error types for the Study-AI core.
//!
//! Variants are grouped by subsystem and carry an actionable suggestion where
//! the user can do something about the failure.

use std::path::PathBuf;

use crate::schema::ArtifactKind;

/// A specialized `Result` type for Study-AI core operations.
pub type Result<T> = std::result::Result<T, StudyError>;

/// Errors that can occur while building or grading a study session.
#[derive(Debug, thiserror::Error)]
pub enum StudyError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax or values in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your studyai.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    /// No model credential was found.
    #[error("GROQ_API_KEY is not set\n\nSuggestion: Export GROQ_API_KEY or add it to a .env file in the working directory")]
    MissingApiKey,

    // ========================================================================
    // Content Errors
    // ========================================================================
    /// The provided content was empty after trimming.
    #[error("No content provided\n\nSuggestion: Provide a topic, a text file, or a PDF with extractable text")]
    ContentEmpty,

    /// A content file was not found.
    #[error("Content file not found: '{path}'\n\nSuggestion: Check the path passed to --text or --pdf")]
    ContentNotFound {
        /// Path where the file was expected.
        path: PathBuf,
    },

    /// A text content file exceeds the size limit.
    #[error("Content file exceeds size limit (1024KB): '{path}' is {size_kb}KB\n\nSuggestion: Split the notes into smaller files")]
    ContentTooLarge {
        /// Path to the oversized file.
        path: PathBuf,
        /// Actual size in kilobytes.
        size_kb: u64,
    },

    /// A text content file is not valid UTF-8.
    #[error("Content file has invalid encoding: '{path}'\n\nSuggestion: Convert the file to UTF-8 encoding")]
    ContentEncodingError {
        /// Path to the file with encoding issues.
        path: PathBuf,
    },

    /// PDF text extraction failed.
    #[error("Error extracting PDF text: {message}\n\nSuggestion: Ensure pdftotext (poppler-utils) is installed and the PDF is not encrypted")]
    PdfExtraction {
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Generation Errors
    // ========================================================================
    /// No valid artifact could be produced within the attempt budget.
    #[error("Failed to generate {kind} after {attempts} attempt(s): {cause}")]
    Generation {
        /// The artifact being generated.
        kind: ArtifactKind,
        /// Number of attempts made.
        attempts: u32,
        /// The last underlying failure.
        cause: String,
    },

    // ========================================================================
    // Export Errors
    // ========================================================================
    /// Writing the results file failed.
    #[error("Failed to save results to '{path}': {message}\n\nSuggestion: Check write permissions and available disk space")]
    ExportError {
        /// Directory or file being written.
        path: PathBuf,
        /// Description of the write failure.
        message: String,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Invalid state transition attempted.
    #[error("Invalid state transition: cannot go from {from} to {to}")]
    InvalidStateTransition {
        /// The current state.
        from: String,
        /// The attempted target state.
        to: String,
    },

    /// An answer was recorded for a question that does not exist.
    #[error("Answer index {index} is out of range for {len} question(s)")]
    AnswerIndexOutOfRange {
        /// The offending 0-based index.
        index: usize,
        /// Number of questions in the session.
        len: usize,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StudyError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `ContentNotFound` error.
    #[must_use]
    pub fn content_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ContentNotFound { path: path.into() }
    }

    /// Creates a new `ContentTooLarge` error.
    #[must_use]
    pub fn content_too_large(path: impl Into<PathBuf>, size_kb: u64) -> Self {
        Self::ContentTooLarge {
            path: path.into(),
            size_kb,
        }
    }

    /// Creates a new `ContentEncodingError`.
    #[must_use]
    pub fn content_encoding(path: impl Into<PathBuf>) -> Self {
        Self::ContentEncodingError { path: path.into() }
    }

    /// Creates a new `PdfExtraction` error.
    #[must_use]
    pub fn pdf_extraction(message: impl Into<String>) -> Self {
        Self::PdfExtraction {
            message: message.into(),
        }
    }

    /// Creates a new `Generation` error.
    #[must_use]
    pub fn generation(kind: ArtifactKind, attempts: u32, cause: impl std::fmt::Display) -> Self {
        Self::Generation {
            kind,
            attempts,
            cause: cause.to_string(),
        }
    }

    /// Creates a new `ExportError`.
    #[must_use]
    pub fn export(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ExportError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidStateTransition` error.
    #[must_use]
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Returns `true` for failures of the content source, which are reported
    /// before any generation call is made.
    #[must_use]
    pub const fn is_content_error(&self) -> bool {
        matches!(
            self,
            Self::ContentEmpty
                | Self::ContentNotFound { .. }
                | Self::ContentTooLarge { .. }
                | Self::ContentEncodingError { .. }
                | Self::PdfExtraction { .. }
        )
    }
}
