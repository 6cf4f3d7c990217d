//! Content sources: a topic, pasted text, or text extracted from a PDF.
//!
//! PDF extraction pipes the document through the `pdftotext` tool from
//! poppler-utils. A failed extraction is an error; a successful extraction
//! that finds no text is returned as empty content and rejected later when
//! the content is handed to a session.

use std::path::Path;
use std::process::Stdio;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{Result, StudyError};

/// Maximum size of a text content file (1 MiB).
pub const MAX_TEXT_FILE_SIZE: u64 = 1024 * 1024;

/// Runs of three or more line breaks, possibly with whitespace between them.
static BLANK_LINE_RUNS: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*){2,}").ok());

/// Where content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentOrigin {
    /// A short topic string.
    Topic,
    /// Pasted notes or a text file.
    PastedText,
    /// Text extracted from a PDF.
    Pdf,
}

/// Source material for a study session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// Where the text came from.
    pub origin: ContentOrigin,
    /// The raw text.
    pub text: String,
}

impl Content {
    /// Content from a topic string.
    #[must_use]
    pub fn from_topic(topic: impl Into<String>) -> Self {
        Self {
            origin: ContentOrigin::Topic,
            text: topic.into(),
        }
    }

    /// Content from pasted text.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            origin: ContentOrigin::PastedText,
            text: text.into(),
        }
    }

    /// Loads a UTF-8 text file as pasted content.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::ContentNotFound`, `StudyError::ContentTooLarge`
    /// (over 1 MiB) or `StudyError::ContentEncodingError`.
    pub fn load_text_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StudyError::content_not_found(path)
            } else {
                StudyError::Io(e)
            }
        })?;

        let size = metadata.len();
        if size > MAX_TEXT_FILE_SIZE {
            return Err(StudyError::content_too_large(path, size / 1024));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                StudyError::content_encoding(path)
            } else {
                StudyError::Io(e)
            }
        })?;

        debug!(path = %path.display(), bytes = size, "Loaded text content");
        Ok(Self::from_text(text))
    }

    /// Extracts text from PDF bytes.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::PdfExtraction` if `pdftotext` is missing or fails.
    pub async fn from_pdf_bytes(bytes: &[u8]) -> Result<Self> {
        let text = extract_pdf_text(bytes).await?;
        info!(chars = text.chars().count(), "Extracted PDF text");
        Ok(Self {
            origin: ContentOrigin::Pdf,
            text,
        })
    }

    /// Reads a PDF file and extracts its text.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::ContentNotFound` if the file is missing, otherwise
    /// as [`Self::from_pdf_bytes`].
    pub async fn load_pdf_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StudyError::content_not_found(path)
            } else {
                StudyError::Io(e)
            }
        })?;
        Self::from_pdf_bytes(&bytes).await
    }

    /// Returns `true` if the text is blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// The first `limit` characters of the trimmed text.
    #[must_use]
    pub fn excerpt(&self, limit: usize) -> &str {
        truncate_chars(self.text.trim(), limit)
    }

    /// A short title for reports.
    #[must_use]
    pub fn title(&self) -> String {
        match self.origin {
            ContentOrigin::Topic => self.text.trim().to_string(),
            ContentOrigin::PastedText => "Pasted notes".to_string(),
            ContentOrigin::Pdf => "PDF document".to_string(),
        }
    }
}

/// Cuts `text` to at most `limit` characters on a character boundary.
#[must_use]
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

async fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let mut child = tokio::process::Command::new("pdftotext")
        .args(["-layout", "-", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StudyError::pdf_extraction("pdftotext is not installed")
            } else {
                StudyError::pdf_extraction(format!("failed to run pdftotext: {e}"))
            }
        })?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| StudyError::pdf_extraction("pdftotext stdin unavailable"))?;
    let input = bytes.to_vec();
    let writer = tokio::spawn(async move {
        let result = stdin.write_all(&input).await;
        drop(stdin);
        result
    });

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| StudyError::pdf_extraction(format!("pdftotext did not finish: {e}")))?;

    // A write error is expected when pdftotext rejects the input early; its
    // exit status below carries the real cause.
    let _ = writer.await;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr.trim();
        return Err(StudyError::pdf_extraction(if message.is_empty() {
            format!("pdftotext exited with {}", output.status)
        } else {
            message.to_string()
        }));
    }

    Ok(normalize_extracted_text(&String::from_utf8_lossy(
        &output.stdout,
    )))
}

/// Normalizes extracted text: page breaks become line breaks, runs of blank
/// lines collapse to one, trailing whitespace is trimmed.
#[must_use]
pub fn normalize_extracted_text(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\x0c', "\n");
    let text = match BLANK_LINE_RUNS.as_ref() {
        Some(re) => re.replace_all(&text, "\n\n").into_owned(),
        None => text,
    };
    text.trim().to_string()
}
