//! CSV export of graded quiz results.
//!
//! The file has a header row followed by one row per question, with columns in
//! [`ResultRow`] field order.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::{timestamped_file_name, ReportError, Result, ResultRow};

/// CSV exporter over a slice of result rows.
pub struct CsvExporter<'a> {
    rows: &'a [ResultRow],
}

impl<'a> CsvExporter<'a> {
    /// Creates an exporter for the given rows.
    #[must_use]
    pub const fn new(rows: &'a [ResultRow]) -> Self {
        Self { rows }
    }

    /// Renders the rows as CSV text.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Csv`] if a row cannot be encoded.
    pub fn generate(&self) -> Result<String> {
        let mut writer = ::csv::Writer::from_writer(Vec::new());
        for row in self.rows {
            writer.serialize(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ReportError::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| ReportError::InvalidData(e.to_string()))
    }

    /// Writes the CSV to `path`, creating or truncating the file.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Csv`] or [`ReportError::Io`].
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let csv = self.generate()?;
        let mut file = File::create(path)?;
        file.write_all(csv.as_bytes())?;
        Ok(())
    }

    /// Writes `<prefix>_<YYYYMMDD_HHMMSS>.csv` into `dir`, creating the
    /// directory if needed, and returns the written path.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidData`] when there are no rows, otherwise
    /// any error from [`Self::write_to_file`].
    pub fn write_to_dir(&self, dir: &Path, prefix: &str) -> Result<PathBuf> {
        if self.rows.is_empty() {
            return Err(ReportError::InvalidData("no results to export".to_string()));
        }

        fs::create_dir_all(dir)?;
        let name = timestamped_file_name(prefix, "csv", &Local::now().naive_local());
        let path = dir.join(name);
        self.write_to_file(&path)?;
        Ok(path)
    }
}
