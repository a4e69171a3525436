//! Error types for panel assembly.
//!
//! This module defines [`PanelError`] which covers every failure the loader,
//! coverage analysis and merge stages can report.

use thiserror::Error;

/// Errors that can occur while assembling a panel dataset.
#[derive(Error, Debug)]
pub enum PanelError {
    /// A declared input was not found under any accepted name or extension.
    #[error("No file found for {stem} with extensions {extensions:?} in {dir}")]
    MissingFile {
        /// Filename stem that was searched for.
        stem: String,
        /// Extensions tried, in preference order.
        extensions: Vec<String>,
        /// Directory that was searched.
        dir: String,
    },

    /// A required column is absent after alias resolution.
    #[error("None of the expected columns {candidates:?} are present in {dataset}")]
    MissingColumn {
        /// Dataset (or frame) the column was expected in.
        dataset: String,
        /// Candidate names that were tried.
        candidates: Vec<String>,
    },

    /// No company meets the coverage requirement across all datasets.
    #[error(
        "No companies meet the coverage requirement across all datasets and target years. \
         Likely some files lack the full year range or have mismatched company codes.\n{diagnostics}"
    )]
    EmptyRetention {
        /// Rendered per-dataset counts for diagnosis.
        diagnostics: String,
    },

    /// A delimited file could not be parsed even leniently.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A spreadsheet could not be opened or read.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A file search pattern could not be built or walked.
    #[error("Pattern error: {0}")]
    Pattern(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// DataFrame operation failure.
    #[error("DataFrame error: {0}")]
    Frame(#[from] polars::error::PolarsError),
}

impl PanelError {
    /// Builds a [`PanelError::MissingColumn`] from any list of candidate names.
    pub fn missing_column<S: AsRef<str>>(dataset: impl Into<String>, candidates: &[S]) -> Self {
        Self::MissingColumn {
            dataset: dataset.into(),
            candidates: candidates.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }
}

/// Result type alias using [`PanelError`].
pub type Result<T> = std::result::Result<T, PanelError>;
