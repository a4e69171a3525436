//! The deduplicated `(company, date)` key table.

use panel_core::{
    COMPANY_KEY, CompanyId, DATE_KEY, Result, SpineKey, normalize::{self, parse_date_strict},
};
use polars::prelude::{Column, DataFrame, PlSmallStr};
use std::collections::HashSet;
use tracing::debug;

use crate::source::KeyedSource;

/// Union of the keys of every dated source, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Spine {
    keys: Vec<SpineKey>,
}

impl Spine {
    /// Builds a spine from explicit keys, dropping repeats.
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = SpineKey>,
    {
        let mut seen = HashSet::new();
        let keys = keys.into_iter().filter(|k| seen.insert(k.clone())).collect();
        Self { keys }
    }

    /// Keys in first-seen order.
    #[must_use]
    pub fn keys(&self) -> &[SpineKey] {
        &self.keys
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The spine as a two-column `Symbol`/`Date` frame, dates in ISO form.
    ///
    /// # Errors
    /// Returns an error if the frame cannot be assembled.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let companies: Vec<String> = self.keys.iter().map(|k| k.company.to_string()).collect();
        let dates: Vec<String> = self
            .keys
            .iter()
            .map(|k| k.date.format("%Y-%m-%d").to_string())
            .collect();
        Ok(DataFrame::new(vec![
            Column::new(PlSmallStr::from_static(COMPANY_KEY), companies),
            Column::new(PlSmallStr::from_static(DATE_KEY), dates),
        ])?)
    }
}

/// Distinct `(company, date)` keys of one keyed source.
///
/// Rows with a null company or date are skipped.
///
/// # Errors
/// Returns an error if a key column is missing.
pub fn source_keys(source: &KeyedSource) -> Result<Vec<SpineKey>> {
    let companies = normalize::string_values(source.frame.column(COMPANY_KEY)?)?;
    let dates = normalize::string_values(source.frame.column(DATE_KEY)?)?;

    let mut seen = HashSet::new();
    Ok(companies
        .into_iter()
        .zip(dates)
        .filter_map(|(company, date)| {
            let company = CompanyId::parse(company.as_deref()?)?;
            let date = parse_date_strict(date.as_deref()?)?;
            Some(SpineKey::new(company, date))
        })
        .filter(|k| seen.insert(k.clone()))
        .collect())
}

/// Unions the keys of every dated source; undated sources contribute nothing.
///
/// # Errors
/// Returns an error if a dated source lacks its key columns.
pub fn build_spine<'a, I>(sources: I) -> Result<Spine>
where
    I: IntoIterator<Item = &'a KeyedSource>,
{
    let mut keys = Vec::new();
    for source in sources.into_iter().filter(|s| s.dated) {
        let own = source_keys(source)?;
        debug!(source = %source.prefix, keys = own.len(), "Spine keys from source");
        keys.extend(own);
    }
    let spine = Spine::from_keys(keys);
    debug!(keys = spine.len(), "Built spine");
    Ok(spine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MergeSource;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn keyed(prefix: &str, rows: &[(&str, &str)]) -> KeyedSource {
        MergeSource {
            prefix: prefix.into(),
            frame: DataFrame::new(vec![
                Column::new("Symbol".into(), rows.iter().map(|r| r.0).collect::<Vec<_>>()),
                Column::new("EndDate".into(), rows.iter().map(|r| r.1).collect::<Vec<_>>()),
            ])
            .unwrap(),
            company_columns: vec!["Symbol".into()],
            date_column: Some("EndDate".into()),
        }
        .into_keyed()
        .unwrap()
    }

    fn key(company: &str, year: i32) -> SpineKey {
        SpineKey::new(
            CompanyId::new(company),
            NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
        )
    }

    #[test]
    fn test_union_not_intersection() {
        let a = keyed("a", &[("1", "2019-12-31"), ("1", "2019-12-31"), ("1", "2020-12-31")]);
        let b = keyed("b", &[("1", "2020-12-31"), ("2", "2020-12-31")]);

        let spine = build_spine([&a, &b]).unwrap();
        assert_eq!(
            spine.keys(),
            &[key("1", 2019), key("1", 2020), key("2", 2020)]
        );
    }

    #[test]
    fn test_undated_sources_ignored() {
        let meta = MergeSource {
            prefix: "cg_co".into(),
            frame: DataFrame::new(vec![Column::new("Stkcd".into(), vec!["9"])]).unwrap(),
            company_columns: vec!["Stkcd".into()],
            date_column: None,
        }
        .into_keyed()
        .unwrap();
        let a = keyed("a", &[("1", "2019-12-31")]);

        let spine = build_spine([&meta, &a]).unwrap();
        assert_eq!(spine.keys(), &[key("1", 2019)]);
    }

    #[test]
    fn test_null_keys_skipped() {
        let a = keyed("a", &[("1", "garbage"), ("", "2019-12-31"), ("2", "2019-12-31")]);
        assert_eq!(build_spine([&a]).unwrap().keys(), &[key("2", 2019)]);
    }

    #[test]
    fn test_to_frame() {
        let spine = Spine::from_keys([key("1", 2019), key("1", 2019), key("2", 2020)]);
        let frame = spine.to_frame().unwrap();
        assert_eq!(frame.height(), 2);
        let dates = normalize::string_values(frame.column("Date").unwrap()).unwrap();
        assert_eq!(dates, vec![Some("2019-12-31".to_string()), Some("2020-12-31".to_string())]);
    }

    proptest! {
        #[test]
        fn prop_spine_covers_largest_source(
            sources in prop::collection::vec(
                prop::collection::vec((0u8..6, 2018i32..2022), 0..20),
                1..5,
            )
        ) {
            let keyed_sources: Vec<KeyedSource> = sources
                .iter()
                .enumerate()
                .map(|(i, rows)| {
                    let rows: Vec<(String, String)> = rows
                        .iter()
                        .map(|(c, y)| (c.to_string(), format!("{y}-12-31")))
                        .collect();
                    let borrowed: Vec<(&str, &str)> =
                        rows.iter().map(|(c, d)| (c.as_str(), d.as_str())).collect();
                    keyed(&format!("s{i}"), &borrowed)
                })
                .collect();

            let spine = build_spine(&keyed_sources).unwrap();
            let largest = keyed_sources
                .iter()
                .map(|s| source_keys(s).unwrap().len())
                .max()
                .unwrap_or(0);
            prop_assert!(spine.len() >= largest);

            let unique: HashSet<_> = spine.keys().iter().collect();
            prop_assert_eq!(unique.len(), spine.len());
        }
    }
}
