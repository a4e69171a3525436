//! Table format and statement scope definitions.
//!
//! This module defines [`TableFormat`] for choosing a reader/writer from a
//! file extension and [`StatementScope`] for the parent/consolidated choice.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk layout of a source or output table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableFormat {
    /// Comma-delimited text (`.csv`).
    Delimited,
    /// Excel workbook (`.xlsx`, `.xls`, `.xlsm`, `.xlsb`, `.ods`).
    Spreadsheet,
}

impl TableFormat {
    /// Determines the format from a path's extension, case-insensitively.
    ///
    /// Returns `None` for unknown or missing extensions.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Delimited),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Spreadsheet),
            _ => None,
        }
    }

    /// Extension, without the dot, that tables of this format are written with.
    ///
    /// Spreadsheets of any flavor are written back as `.xlsx`.
    #[must_use]
    pub const fn output_extension(&self) -> &'static str {
        match self {
            Self::Delimited => "csv",
            Self::Spreadsheet => "xlsx",
        }
    }
}

/// Which statement rows a row filter keeps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementScope {
    /// Parent-company statements only.
    #[default]
    Parent,
    /// Parent and consolidated statements.
    ParentAndConsolidated,
}

impl StatementScope {
    /// Maps the CLI flag onto a scope.
    #[must_use]
    pub const fn from_flag(include_consolidated: bool) -> Self {
        if include_consolidated {
            Self::ParentAndConsolidated
        } else {
            Self::Parent
        }
    }

    /// Returns true if consolidated rows are kept as well.
    #[must_use]
    pub const fn includes_consolidated(&self) -> bool {
        matches!(self, Self::ParentAndConsolidated)
    }
}
