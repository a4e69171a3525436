//! Bringing a source table onto the canonical merge keys.

use panel_core::{
    COMPANY_KEY, DATE_KEY, DatasetConfig, Result, normalize,
    resolve::{COMPANY_FALLBACKS, DATE_FALLBACKS, require},
};
use polars::prelude::{Column, DataFrame, PlSmallStr};
use std::collections::HashSet;
use tracing::debug;

/// A source table as read from disk, with its declared key columns.
#[derive(Debug, Clone)]
pub struct MergeSource {
    /// Prefix for this source's columns in the merged table.
    pub prefix: String,
    /// Table contents.
    pub frame: DataFrame,
    /// Candidate company columns, tried before the common fallbacks.
    pub company_columns: Vec<String>,
    /// Declared date column; `None` for static metadata.
    pub date_column: Option<String>,
}

impl MergeSource {
    /// Creates a source from a registry descriptor and its table.
    #[must_use]
    pub fn from_config(config: &DatasetConfig, frame: DataFrame) -> Self {
        Self {
            prefix: config.prefix.clone(),
            frame,
            company_columns: config.company_columns.clone(),
            date_column: config.declared_date_column().map(str::to_string),
        }
    }

    /// Rewrites the table onto canonical keys with prefixed value columns.
    ///
    /// The company key is the normalized first present of the declared company
    /// columns, then `Stkcd`, `Symbol`. The date key is the ISO rendering of
    /// the declared date column, or of the first present fallback
    /// (`Accper`, `Accper.1`, `EndDate`, `EndDate.1`) when the declared name
    /// is absent; unparsable dates give a null key.
    ///
    /// # Errors
    /// Returns [`PanelError::MissingColumn`](panel_core::PanelError::MissingColumn)
    /// if no company column, or no date column of a dated source, is found.
    pub fn into_keyed(self) -> Result<KeyedSource> {
        let present: Vec<String> = self
            .frame
            .get_column_names()
            .into_iter()
            .map(ToString::to_string)
            .collect();

        let company_candidates: Vec<&str> = self
            .company_columns
            .iter()
            .map(String::as_str)
            .chain(COMPANY_FALLBACKS.iter().copied())
            .collect();
        let company_column = require(&present, &company_candidates, &self.prefix)?;

        let date_column = match &self.date_column {
            Some(declared) => {
                let candidates: Vec<&str> = std::iter::once(declared.as_str())
                    .chain(DATE_FALLBACKS.iter().copied())
                    .collect();
                Some(require(&present, &candidates, &self.prefix)?)
            }
            None => None,
        };

        let companies: Vec<Option<String>> =
            normalize::company_ids(self.frame.column(&company_column)?)?
                .into_iter()
                .map(|c| c.map(|c| c.as_str().to_string()))
                .collect();

        let mut frame = self.frame;
        if let Some(date_column) = &date_column {
            let dates: Vec<Option<String>> =
                normalize::dates_lenient(frame.column(date_column)?)?
                    .into_iter()
                    .map(|d| d.map(|d| d.format("%Y-%m-%d").to_string()))
                    .collect();
            if date_column != DATE_KEY {
                frame = frame.drop(date_column)?;
            }
            frame.with_column(Column::new(PlSmallStr::from_static(DATE_KEY), dates))?;
            debug!(source = %self.prefix, column = %date_column, "Resolved date column");
        }
        frame.with_column(Column::new(PlSmallStr::from_static(COMPANY_KEY), companies))?;

        let keys: &[&str] = if date_column.is_some() {
            &[COMPANY_KEY, DATE_KEY]
        } else {
            &[COMPANY_KEY]
        };
        let columns = frame
            .get_columns()
            .iter()
            .map(|c| {
                let mut c = c.clone();
                if !keys.contains(&c.name().as_str()) {
                    let prefixed = format!("{}_{}", self.prefix, c.name());
                    c.rename(PlSmallStr::from(prefixed));
                }
                c
            })
            .collect::<Vec<_>>();

        Ok(KeyedSource {
            prefix: self.prefix,
            frame: DataFrame::new(columns)?,
            dated: date_column.is_some(),
        })
    }
}

/// A source table on canonical keys, ready to join.
#[derive(Debug, Clone)]
pub struct KeyedSource {
    /// Prefix carried by every non-key column.
    pub prefix: String,
    /// Table with `Symbol`, optionally `Date`, and prefixed value columns.
    pub frame: DataFrame,
    /// Whether the table joins on `Date` as well as `Symbol`.
    pub dated: bool,
}

impl KeyedSource {
    /// Join key columns.
    #[must_use]
    pub fn keys(&self) -> &'static [&'static str] {
        if self.dated {
            &[COMPANY_KEY, DATE_KEY]
        } else {
            &[COMPANY_KEY]
        }
    }

    /// Number of rows sharing a join key with an earlier row.
    ///
    /// # Errors
    /// Returns an error if a key column is missing.
    pub fn duplicate_keys(&self) -> Result<usize> {
        let mut key_values = Vec::with_capacity(self.keys().len());
        for key in self.keys() {
            key_values.push(normalize::string_values(self.frame.column(key)?)?);
        }
        let mut seen = HashSet::with_capacity(self.frame.height());
        let duplicates = (0..self.frame.height())
            .filter(|&row| {
                let key: Vec<Option<&str>> =
                    key_values.iter().map(|col| col[row].as_deref()).collect();
                !seen.insert(key)
            })
            .count();
        Ok(duplicates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_core::PanelError;
    use polars::prelude::*;

    fn names(frame: &DataFrame) -> Vec<String> {
        frame
            .get_column_names()
            .into_iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_prefixes_value_columns() {
        let source = MergeSource {
            prefix: "fs_combas".into(),
            frame: DataFrame::new(vec![
                Column::new("Stkcd".into(), vec![1.0_f64, 2.0]),
                Column::new("Accper".into(), vec!["2020-12-31", "2020-12-31"]),
                Column::new("Typrep".into(), vec!["B", "B"]),
            ])
            .unwrap(),
            company_columns: vec!["Stkcd".into()],
            date_column: Some("Accper".into()),
        };

        let keyed = source.into_keyed().unwrap();
        assert!(keyed.dated);
        let cols = names(&keyed.frame);
        assert_eq!(cols.len(), 4);
        for expected in ["Symbol", "Date", "fs_combas_Stkcd", "fs_combas_Typrep"] {
            assert!(cols.contains(&expected.to_string()), "missing {expected}");
        }
        let ids = normalize::string_values(keyed.frame.column("Symbol").unwrap()).unwrap();
        assert_eq!(ids, vec![Some("1".to_string()), Some("2".to_string())]);
    }

    #[test]
    fn test_duplicate_suffixed_date_column() {
        let source = MergeSource {
            prefix: "fs_comins".into(),
            frame: DataFrame::new(vec![
                Column::new("Stkcd".into(), vec!["1"]),
                Column::new("Accper.1".into(), vec!["2020/12/31"]),
            ])
            .unwrap(),
            company_columns: vec!["Stkcd".into()],
            date_column: Some("Accper".into()),
        };

        let keyed = source.into_keyed().unwrap();
        let dates = normalize::string_values(keyed.frame.column("Date").unwrap()).unwrap();
        assert_eq!(dates, vec![Some("2020-12-31".to_string())]);
        assert!(!names(&keyed.frame).iter().any(|c| c.contains("Accper")));
    }

    #[test]
    fn test_missing_date_column() {
        let source = MergeSource {
            prefix: "mc_pro".into(),
            frame: DataFrame::new(vec![Column::new("Symbol".into(), vec!["1"])]).unwrap(),
            company_columns: vec!["Symbol".into()],
            date_column: Some("EndDate".into()),
        };
        assert!(matches!(source.into_keyed(), Err(PanelError::MissingColumn { .. })));
    }

    #[test]
    fn test_undated_source_prefixes_date_like_columns() {
        let source = MergeSource {
            prefix: "cg_co".into(),
            frame: DataFrame::new(vec![
                Column::new("Stkcd".into(), vec![1_i64]),
                Column::new("Date".into(), vec!["2001-01-01"]),
            ])
            .unwrap(),
            company_columns: vec!["Stkcd".into()],
            date_column: None,
        };
        let keyed = source.into_keyed().unwrap();
        assert_eq!(keyed.keys(), &["Symbol"]);
        assert!(names(&keyed.frame).contains(&"cg_co_Date".to_string()));
    }

    #[test]
    fn test_duplicate_keys() {
        let source = MergeSource {
            prefix: "mc_pro".into(),
            frame: DataFrame::new(vec![
                Column::new("Symbol".into(), vec!["1", "1", "2"]),
                Column::new("EndDate".into(), vec!["2020-12-31", "2020-12-31", "2020-12-31"]),
                Column::new("ProductName_EN".into(), vec!["Steel", "Cement", "Glass"]),
            ])
            .unwrap(),
            company_columns: vec!["Symbol".into()],
            date_column: Some("EndDate".into()),
        };
        assert_eq!(source.into_keyed().unwrap().duplicate_keys().unwrap(), 1);
    }
}
