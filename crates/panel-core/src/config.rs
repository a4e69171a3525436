//! Declarative dataset descriptors and the registry holding them.
//!
//! Each source table is described once by a [`DatasetConfig`]: where its file
//! lives, which column aliases identify the company and the period-end date,
//! and which statement rows to keep. Stages look datasets up in a
//! [`DatasetRegistry`] instead of branching on dataset names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::{
    error::{PanelError, Result},
    format::StatementScope,
    types::Year,
};

/// Default target-year window.
pub const DEFAULT_TARGET_YEARS: std::ops::RangeInclusive<Year> = 2018..=2024;

/// Default minimum number of covered target years.
pub const DEFAULT_MIN_YEARS: usize = 3;

/// Returns [`DEFAULT_TARGET_YEARS`] as a set.
#[must_use]
pub fn default_target_years() -> BTreeSet<Year> {
    DEFAULT_TARGET_YEARS.collect()
}

/// Statement-type row filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFilter {
    /// Column holding the statement-type code.
    pub column: String,
    /// Codes kept for parent-only statements.
    pub keep: Vec<String>,
    /// Extra codes kept when consolidated statements are requested.
    #[serde(default)]
    pub consolidated: Vec<String>,
}

impl RowFilter {
    /// Creates a filter on `column` keeping `keep`.
    #[must_use]
    pub fn new(column: impl Into<String>, keep: &[&str]) -> Self {
        Self {
            column: column.into(),
            keep: keep.iter().map(ToString::to_string).collect(),
            consolidated: Vec::new(),
        }
    }

    /// Sets the codes added for consolidated statements.
    #[must_use]
    pub fn with_consolidated(mut self, codes: &[&str]) -> Self {
        self.consolidated = codes.iter().map(ToString::to_string).collect();
        self
    }

    /// Returns the set of codes kept under `scope`.
    #[must_use]
    pub fn accepted(&self, scope: StatementScope) -> BTreeSet<String> {
        let mut codes: BTreeSet<String> = self.keep.iter().cloned().collect();
        if scope.includes_consolidated() {
            codes.extend(self.consolidated.iter().cloned());
        }
        codes
    }
}

/// Descriptor for one source dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Dataset identifier.
    pub key: String,
    /// Prefix put in front of this dataset's columns in the merged table.
    pub prefix: String,
    /// Expected filename stem.
    pub stem: String,
    /// Accepted extensions, in preference order (with leading dot).
    pub extensions: Vec<String>,
    /// Candidate company-identifier column names.
    pub company_columns: Vec<String>,
    /// Candidate period-end date column names; empty for static metadata.
    #[serde(default)]
    pub date_columns: Vec<String>,
    /// Optional statement-type filter.
    #[serde(default)]
    pub row_filter: Option<RowFilter>,
}

impl DatasetConfig {
    /// Creates a descriptor whose prefix equals its key.
    #[must_use]
    pub fn new(key: impl Into<String>, stem: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            prefix: key.clone(),
            key,
            stem: stem.into(),
            extensions: vec![".csv".into(), ".xlsx".into(), ".xls".into()],
            company_columns: Vec::new(),
            date_columns: Vec::new(),
            row_filter: None,
        }
    }

    /// Sets the merge-stage column prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the accepted extensions.
    #[must_use]
    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(ToString::to_string).collect();
        self
    }

    /// Sets the candidate company columns.
    #[must_use]
    pub fn with_company_columns(mut self, columns: &[&str]) -> Self {
        self.company_columns = columns.iter().map(ToString::to_string).collect();
        self
    }

    /// Sets the candidate date columns.
    #[must_use]
    pub fn with_date_columns(mut self, columns: &[&str]) -> Self {
        self.date_columns = columns.iter().map(ToString::to_string).collect();
        self
    }

    /// Sets the statement-type filter.
    #[must_use]
    pub fn with_row_filter(mut self, filter: RowFilter) -> Self {
        self.row_filter = Some(filter);
        self
    }

    /// Returns true if this dataset carries a period-end date.
    #[must_use]
    pub fn is_dated(&self) -> bool {
        !self.date_columns.is_empty()
    }

    /// Returns the first declared date column, if any.
    #[must_use]
    pub fn declared_date_column(&self) -> Option<&str> {
        self.date_columns.first().map(String::as_str)
    }

    fn validate(&self) -> Result<()> {
        if self.key.is_empty() || self.stem.is_empty() {
            return Err(PanelError::InvalidParameter(
                "dataset key and stem must be non-empty".to_string(),
            ));
        }
        if self.company_columns.is_empty() {
            return Err(PanelError::InvalidParameter(format!(
                "dataset {} declares no company column",
                self.key
            )));
        }
        if self.extensions.is_empty() {
            return Err(PanelError::InvalidParameter(format!(
                "dataset {} declares no accepted extension",
                self.key
            )));
        }
        Ok(())
    }
}

/// Ordered collection of dataset descriptors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetRegistry {
    datasets: Vec<DatasetConfig>,
}

impl DatasetRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The five CSMAR tables the panel is built from.
    #[must_use]
    pub fn csmar() -> Self {
        let statement_filter = RowFilter::new("Typrep", &["B"]).with_consolidated(&["A"]);
        let diversification_filter =
            RowFilter::new("StateTypeCode", &["2"]).with_consolidated(&["1"]);

        let datasets = vec![
            DatasetConfig::new("cg_co", "CG_Co")
                .with_extensions(&[".xlsx", ".xls"])
                .with_company_columns(&["Stkcd"]),
            DatasetConfig::new("fs_combas", "FS_Combas")
                .with_extensions(&[".xlsx", ".xls"])
                .with_company_columns(&["Stkcd"])
                .with_date_columns(&["Accper"])
                .with_row_filter(statement_filter.clone()),
            DatasetConfig::new("fs_comins", "FS_Comins")
                .with_extensions(&[".xlsx", ".xls"])
                .with_company_columns(&["Stkcd"])
                .with_date_columns(&["Accper"])
                .with_row_filter(statement_filter),
            DatasetConfig::new("mc_diversified_degree", "MC_DiverOperationsDegree")
                .with_prefix("mc_degree")
                .with_company_columns(&["Symbol"])
                .with_date_columns(&["EndDate"])
                .with_row_filter(diversification_filter.clone()),
            DatasetConfig::new("mc_diversified_product", "MC_DiverOperationsPro")
                .with_prefix("mc_pro")
                .with_company_columns(&["Symbol"])
                .with_date_columns(&["EndDate"])
                .with_row_filter(diversification_filter),
        ];
        Self { datasets }
    }

    /// Register a dataset.
    ///
    /// # Errors
    /// Returns [`PanelError::InvalidParameter`] if the descriptor is incomplete
    /// or its key or prefix is already registered.
    pub fn register(&mut self, config: DatasetConfig) -> Result<()> {
        config.validate()?;
        if self
            .datasets
            .iter()
            .any(|d| d.key == config.key || d.prefix == config.prefix)
        {
            return Err(PanelError::InvalidParameter(format!(
                "dataset {} (prefix {}) is already registered",
                config.key, config.prefix
            )));
        }
        self.datasets.push(config);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    ///
    /// # Errors
    /// See [`register`](Self::register).
    pub fn with(mut self, config: DatasetConfig) -> Result<Self> {
        self.register(config)?;
        Ok(self)
    }

    /// Parses a registry from a JSON array of descriptors.
    ///
    /// # Errors
    /// Returns [`PanelError::Parse`] for malformed JSON and
    /// [`PanelError::InvalidParameter`] for invalid or duplicate descriptors.
    pub fn from_json(json: &str) -> Result<Self> {
        let configs: Vec<DatasetConfig> =
            serde_json::from_str(json).map_err(|e| PanelError::Parse(e.to_string()))?;
        configs
            .into_iter()
            .try_fold(Self::new(), |registry, config| registry.with(config))
    }

    /// Reads a registry from a JSON file.
    ///
    /// # Errors
    /// See [`from_json`](Self::from_json); also fails if the file cannot be read.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Looks a dataset up by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DatasetConfig> {
        self.datasets.iter().find(|d| d.key == key)
    }

    /// Iterates datasets in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &DatasetConfig> {
        self.datasets.iter()
    }

    /// Number of registered datasets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    /// Returns true if no dataset is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl<'a> IntoIterator for &'a DatasetRegistry {
    type Item = &'a DatasetConfig;
    type IntoIter = std::slice::Iter<'a, DatasetConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.datasets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csmar_registry() {
        let registry = DatasetRegistry::csmar();
        assert_eq!(registry.len(), 5);
        let prefixes: Vec<&str> = registry.iter().map(|d| d.prefix.as_str()).collect();
        assert_eq!(
            prefixes,
            ["cg_co", "fs_combas", "fs_comins", "mc_degree", "mc_pro"]
        );

        let co = registry.get("cg_co").unwrap();
        assert!(!co.is_dated());
        assert!(co.row_filter.is_none());

        let pro = registry.get("mc_diversified_product").unwrap();
        assert_eq!(pro.prefix, "mc_pro");
        assert_eq!(pro.declared_date_column(), Some("EndDate"));
        assert_eq!(pro.extensions[0], ".csv");
    }

    #[test]
    fn test_row_filter_scope() {
        let filter = RowFilter::new("Typrep", &["B"]).with_consolidated(&["A"]);
        let parent = filter.accepted(StatementScope::Parent);
        assert_eq!(parent.into_iter().collect::<Vec<_>>(), vec!["B"]);
        let both = filter.accepted(StatementScope::ParentAndConsolidated);
        assert_eq!(both.into_iter().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = DatasetRegistry::csmar();
        let dup = DatasetConfig::new("other", "Other")
            .with_prefix("mc_pro")
            .with_company_columns(&["Symbol"]);
        assert!(matches!(
            registry.register(dup),
            Err(PanelError::InvalidParameter(_))
        ));

        let no_company = DatasetConfig::new("x", "X");
        assert!(registry.register(no_company).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let registry = DatasetRegistry::csmar();
        let json = serde_json::to_string(&registry).unwrap();
        assert_eq!(DatasetRegistry::from_json(&json).unwrap(), registry);
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"[{"key":"k","prefix":"k","stem":"K","extensions":[".csv"],"company_columns":["Symbol"]}]"#;
        let registry = DatasetRegistry::from_json(json).unwrap();
        let k = registry.get("k").unwrap();
        assert!(!k.is_dated());
        assert!(k.row_filter.is_none());
        assert!(DatasetRegistry::from_json("{not json").is_err());
    }

    #[test]
    fn test_default_years() {
        let years = default_target_years();
        assert_eq!(years.len(), 7);
        assert_eq!(years.first(), Some(&2018));
        assert_eq!(years.last(), Some(&2024));
    }
}
