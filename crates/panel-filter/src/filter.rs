//! Restricting a dataset to retained companies and target years.

use panel_core::{CompanyId, Result, Year, normalize};
use polars::prelude::{BooleanChunked, Column, DataFrame, PlSmallStr};
use std::collections::BTreeSet;

use crate::loader::Dataset;

/// Keeps rows of retained companies in target years.
///
/// The company column is rewritten with normalized identifiers; every other
/// column and the row order are kept. Several rows per company and year (one
/// per product segment, say) all survive.
///
/// # Errors
/// Returns an error if either column is absent.
pub fn filter_companies_years(
    frame: &DataFrame,
    company_column: &str,
    year_column: Option<&str>,
    retained: &BTreeSet<CompanyId>,
    target_years: &BTreeSet<Year>,
) -> Result<DataFrame> {
    let companies = normalize::company_ids(frame.column(company_column)?)?;
    let years = match year_column {
        Some(col) => Some(normalize::years(frame.column(col)?)?),
        None => None,
    };

    let mask: BooleanChunked = companies
        .iter()
        .enumerate()
        .map(|(i, company)| {
            let company_kept = company.as_ref().is_some_and(|c| retained.contains(c));
            let year_kept = years
                .as_ref()
                .is_none_or(|years| years[i].is_some_and(|y| target_years.contains(&y)));
            company_kept && year_kept
        })
        .collect();

    let normalized: Vec<Option<String>> = companies
        .into_iter()
        .map(|c| c.map(|c| c.as_str().to_string()))
        .collect();
    let mut out = frame.clone();
    out.with_column(Column::new(PlSmallStr::from(company_column), normalized))?;
    Ok(out.filter(&mask)?)
}

/// Applies [`filter_companies_years`] to a loaded dataset.
///
/// # Errors
/// See [`filter_companies_years`].
pub fn filter_dataset(
    dataset: &Dataset,
    retained: &BTreeSet<CompanyId>,
    target_years: &BTreeSet<Year>,
) -> Result<Dataset> {
    let frame = filter_companies_years(
        &dataset.frame,
        &dataset.company_column,
        dataset.date_column.as_deref(),
        retained,
        target_years,
    )?;
    Ok(dataset.with_frame(frame))
}
