#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/panel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Tabular load/save primitives.
//!
//! - [`read_table`] / [`write_table`] - Dispatch on the file extension
//! - [`locate`](locate::locate) - Find a source file by stem and extension preference
//! - [`filtered_path`] - Output name of a filtered copy

/// Comma-delimited tables.
pub mod csv;
/// Excel workbooks (read, and `.xlsx` write).
#[cfg(feature = "spreadsheet")]
pub mod excel;
/// Source-file lookup.
pub mod locate;

use panel_core::{PanelError, Result, TableFormat};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};

pub use locate::locate;

/// Suffix appended to the stem of every filtered copy.
pub const FILTERED_SUFFIX: &str = "_filtered";

/// Reads a table, choosing the reader from the file extension.
///
/// # Errors
/// Returns [`PanelError::InvalidParameter`] for an unsupported extension, or
/// whatever the underlying reader reports.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    match TableFormat::from_path(path) {
        Some(TableFormat::Delimited) => csv::read_csv(path),
        #[cfg(feature = "spreadsheet")]
        Some(TableFormat::Spreadsheet) => excel::read_excel(path),
        _ => Err(PanelError::InvalidParameter(format!(
            "unsupported table format: {}",
            path.display()
        ))),
    }
}

/// Writes a table, choosing the writer from the file extension.
///
/// `.csv` files are written as CSV and `.xlsx` files as a one-sheet workbook.
///
/// # Errors
/// Returns [`PanelError::InvalidParameter`] for a format the pipeline cannot
/// write, or whatever the underlying writer reports.
pub fn write_table(frame: &mut DataFrame, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => csv::write_csv(frame, path),
        #[cfg(feature = "spreadsheet")]
        "xlsx" => excel::write_excel(frame, path),
        _ => Err(PanelError::InvalidParameter(format!(
            "cannot write table format: {}",
            path.display()
        ))),
    }
}

/// Output path of the filtered copy of `input` inside `output_dir`.
///
/// Delimited inputs stay `.csv`; spreadsheet inputs become `.xlsx`.
#[must_use]
pub fn filtered_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = TableFormat::from_path(input).map_or("csv", |format| format.output_extension());
    output_dir.join(format!("{stem}{FILTERED_SUFFIX}.{ext}"))
}
