//! Loading one source table and applying its row filters.

use panel_core::{
    DatasetConfig, PanelError, Result, StatementScope, normalize, resolve::require,
};
use polars::prelude::{BooleanChunked, DataFrame};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// A loaded, row-filtered source table.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Dataset identifier from the registry.
    pub key: String,
    /// File the table was read from.
    pub path: PathBuf,
    /// Table contents.
    pub frame: DataFrame,
    /// Resolved company-identifier column.
    pub company_column: String,
    /// Resolved period-end date column; `None` for static metadata.
    pub date_column: Option<String>,
}

impl Dataset {
    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Returns a copy of this dataset carrying `frame` instead.
    #[must_use]
    pub fn with_frame(&self, frame: DataFrame) -> Self {
        Self {
            key: self.key.clone(),
            path: self.path.clone(),
            frame,
            company_column: self.company_column.clone(),
            date_column: self.date_column.clone(),
        }
    }
}

/// Reads source tables and applies statement-type and year-end filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetLoader {
    scope: StatementScope,
}

impl DatasetLoader {
    /// Create a loader keeping statements of the given scope.
    #[must_use]
    pub const fn new(scope: StatementScope) -> Self {
        Self { scope }
    }

    /// Finds the source file for `config` in `dir`.
    ///
    /// # Errors
    /// Returns [`PanelError::MissingFile`] if no file matches.
    pub fn locate(&self, config: &DatasetConfig, dir: &Path) -> Result<PathBuf> {
        panel_io::locate(dir, &config.stem, "", &config.extensions)
    }

    /// Reads `path` and filters it per `config`.
    ///
    /// # Errors
    /// Returns read errors, or [`PanelError::MissingColumn`] if the declared
    /// filter, company or date column is absent.
    #[instrument(skip(self, config), fields(dataset = %config.key, path = %path.display()))]
    pub fn load(&self, path: &Path, config: &DatasetConfig) -> Result<Dataset> {
        let frame = panel_io::read_table(path)?;
        self.prepare(frame, path, config)
    }

    /// Applies the filters of `config` to an already-read table.
    ///
    /// # Errors
    /// Returns [`PanelError::MissingColumn`] if the declared filter, company or
    /// date column is absent.
    pub fn prepare(&self, frame: DataFrame, path: &Path, config: &DatasetConfig) -> Result<Dataset> {
        let raw_rows = frame.height();
        let frame = apply_row_filter(frame, config, self.scope)?;
        let filtered_rows = frame.height();

        let columns = column_names(&frame);
        let date_column = if config.is_dated() {
            Some(require(&columns, &config.date_columns, &config.key)?)
        } else {
            None
        };
        let frame = match &date_column {
            Some(col) => filter_year_end(frame, col)?,
            None => frame,
        };
        let company_column = require(&columns, &config.company_columns, &config.key)?;

        debug!(
            raw_rows,
            filtered_rows,
            year_end_rows = frame.height(),
            company_column = %company_column,
            date_column = ?date_column,
            "Loaded dataset"
        );

        Ok(Dataset {
            key: config.key.clone(),
            path: path.to_path_buf(),
            frame,
            company_column,
            date_column,
        })
    }
}

/// Column names of `frame` as owned strings.
#[must_use]
pub fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

/// Keeps rows whose statement-type code is accepted under `scope`.
///
/// Codes are compared on their string rendering. Datasets without a filter
/// pass through unchanged.
///
/// # Errors
/// Returns [`PanelError::MissingColumn`] if the filter column is absent.
pub fn apply_row_filter(
    frame: DataFrame,
    config: &DatasetConfig,
    scope: StatementScope,
) -> Result<DataFrame> {
    let Some(filter) = &config.row_filter else {
        return Ok(frame);
    };
    let column = frame
        .column(&filter.column)
        .map_err(|_| PanelError::missing_column(&config.key, &[&filter.column]))?;
    let accepted = filter.accepted(scope);
    let mask: BooleanChunked = normalize::string_values(column)?
        .iter()
        .map(|v| v.as_ref().is_some_and(|v| accepted.contains(v)))
        .collect();
    Ok(frame.filter(&mask)?)
}

/// Keeps rows whose date in `date_column` is a December 31st.
///
/// Dates are parsed permissively; rows with unparsable dates are dropped.
///
/// # Errors
/// Returns an error if `date_column` is absent.
pub fn filter_year_end(frame: DataFrame, date_column: &str) -> Result<DataFrame> {
    let mask: BooleanChunked = normalize::dates_lenient(frame.column(date_column)?)?
        .into_iter()
        .map(|d| d.is_some_and(normalize::is_year_end))
        .collect();
    Ok(frame.filter(&mask)?)
}
