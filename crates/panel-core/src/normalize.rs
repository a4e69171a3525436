//! Identifier and date normalization over DataFrame columns.
//!
//! Source tables arrive with company codes stored as integers, floats or
//! strings, and period-end dates in several textual layouts. Everything here
//! works on the string rendering of a column so the dtype a reader inferred
//! never changes the outcome.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::{Column, DataType};

use crate::{
    error::Result,
    types::{CompanyId, Year},
};

/// Date layout accepted by strict parsing.
pub const STRICT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Date-only layouts tried, in order, by permissive parsing.
const LENIENT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d", "%m/%d/%Y", "%d.%m.%Y",
];

/// Date-time layouts tried, in order, by permissive parsing.
const LENIENT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

/// Returns the string rendering of every value in `column`, nulls kept.
pub fn string_values(column: &Column) -> Result<Vec<Option<String>>> {
    let cast = column.cast(&DataType::String)?;
    let values = cast
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

/// Normalizes a company-identifier column.
///
/// Nulls and values that are blank after normalization yield `None`.
pub fn company_ids(column: &Column) -> Result<Vec<Option<CompanyId>>> {
    Ok(string_values(column)?
        .iter()
        .map(|v| v.as_deref().and_then(CompanyId::parse))
        .collect())
}

/// Parses a date in `YYYY-MM-DD` layout only.
#[must_use]
pub fn parse_date_strict(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), STRICT_DATE_FORMAT).ok()
}

/// Parses a date in any of the layouts seen across source files.
#[must_use]
pub fn parse_date_lenient(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    LENIENT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            LENIENT_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parses every value permissively; unparsable values become `None`.
pub fn dates_lenient(column: &Column) -> Result<Vec<Option<NaiveDate>>> {
    Ok(string_values(column)?
        .iter()
        .map(|v| v.as_deref().and_then(parse_date_lenient))
        .collect())
}

/// Parses a date column, strict first.
///
/// Strict ISO parsing is applied to the whole column; only when it yields no
/// value at all is the column re-parsed permissively. A column mixing ISO and
/// other layouts therefore keeps only its ISO rows.
pub fn dates(column: &Column) -> Result<Vec<Option<NaiveDate>>> {
    let raw = string_values(column)?;
    let strict: Vec<Option<NaiveDate>> = raw
        .iter()
        .map(|v| v.as_deref().and_then(parse_date_strict))
        .collect();
    if strict.iter().any(Option::is_some) {
        return Ok(strict);
    }
    Ok(raw
        .iter()
        .map(|v| v.as_deref().and_then(parse_date_lenient))
        .collect())
}

/// Extracts the calendar year of every value, strict first (see [`dates`]).
pub fn years(column: &Column) -> Result<Vec<Option<Year>>> {
    Ok(dates(column)?
        .into_iter()
        .map(|d| d.map(|d| d.year()))
        .collect())
}

/// Returns true for December 31st.
#[must_use]
pub fn is_year_end(date: NaiveDate) -> bool {
    date.month() == 12 && date.day() == 31
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_company_ids_from_mixed_dtypes() {
        let ints = Column::new("Stkcd".into(), vec![600000_i64, 1]);
        let ids = company_ids(&ints).unwrap();
        assert_eq!(ids[0].as_ref().unwrap().as_str(), "600000");
        assert_eq!(ids[1].as_ref().unwrap().as_str(), "1");

        let floats = Column::new("Stkcd".into(), vec![600000.0_f64]);
        assert_eq!(
            company_ids(&floats).unwrap()[0].as_ref().unwrap().as_str(),
            "600000"
        );

        let strings = Column::new("Stkcd".into(), vec![Some(" 600000.0 "), None, Some("")]);
        let ids = company_ids(&strings).unwrap();
        assert_eq!(ids[0].as_ref().unwrap().as_str(), "600000");
        assert!(ids[1].is_none());
        assert!(ids[2].is_none());
    }

    #[test]
    fn test_lenient_layouts() {
        assert_eq!(parse_date_lenient("2020/12/31"), Some(ymd(2020, 12, 31)));
        assert_eq!(parse_date_lenient("20201231"), Some(ymd(2020, 12, 31)));
        assert_eq!(
            parse_date_lenient("2020-12-31 00:00:00"),
            Some(ymd(2020, 12, 31))
        );
        assert_eq!(parse_date_lenient("not a date"), None);
        assert_eq!(parse_date_lenient(""), None);
    }

    #[test]
    fn test_strict_first_keeps_iso_rows_only() {
        let col = Column::new("Accper".into(), vec!["2019-12-31", "2020/12/31", "junk"]);
        assert_eq!(years(&col).unwrap(), vec![Some(2019), None, None]);
    }

    #[test]
    fn test_falls_back_when_no_iso_row() {
        let col = Column::new("EndDate".into(), vec!["2019/12/31", "junk", "20211231"]);
        assert_eq!(years(&col).unwrap(), vec![Some(2019), None, Some(2021)]);
    }

    #[test]
    fn test_integer_dates() {
        let col = Column::new("EndDate".into(), vec![20181231_i64, 20190630]);
        assert_eq!(
            dates(&col).unwrap(),
            vec![Some(ymd(2018, 12, 31)), Some(ymd(2019, 6, 30))]
        );
    }

    #[test]
    fn test_is_year_end() {
        assert!(is_year_end(ymd(2020, 12, 31)));
        assert!(!is_year_end(ymd(2020, 12, 30)));
        assert!(!is_year_end(ymd(2020, 6, 30)));
    }
}
