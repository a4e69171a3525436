//! Per-dataset year coverage and cross-dataset retention.
//!
//! Every dataset is first reduced to the same neutral shape, a map from
//! [`CompanyId`] to the years it was observed in, so the retention step never
//! sees per-dataset schemas.

use panel_core::{CompanyId, PanelError, Result, Year, normalize};
use polars::prelude::DataFrame;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Years observed per company in one dataset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompanyYears {
    years: BTreeMap<CompanyId, BTreeSet<Year>>,
    listed: usize,
    dated: bool,
}

impl CompanyYears {
    /// Collects the observed years per company from `frame`.
    ///
    /// Without a year column every non-null company counts, with no years.
    /// Rows whose company or year cannot be extracted are skipped.
    ///
    /// # Errors
    /// Returns an error if either column is absent.
    pub fn observe(frame: &DataFrame, company_column: &str, year_column: Option<&str>) -> Result<Self> {
        let companies = normalize::company_ids(frame.column(company_column)?)?;
        let listed = companies.iter().flatten().collect::<BTreeSet<_>>().len();
        let mut years: BTreeMap<CompanyId, BTreeSet<Year>> = BTreeMap::new();

        let Some(year_column) = year_column else {
            for company in companies.into_iter().flatten() {
                years.entry(company).or_default();
            }
            return Ok(Self {
                years,
                listed,
                dated: false,
            });
        };

        let observed = normalize::years(frame.column(year_column)?)?;
        let mut skipped = 0usize;
        for (company, year) in companies.into_iter().zip(observed) {
            match (company, year) {
                (Some(company), Some(year)) => {
                    years.entry(company).or_default().insert(year);
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!(skipped, "Rows without usable company or year");
        }
        Ok(Self {
            years,
            listed,
            dated: true,
        })
    }

    /// Builds coverage directly from `(company, year)` observations.
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = (CompanyId, Year)>,
    {
        let mut years: BTreeMap<CompanyId, BTreeSet<Year>> = BTreeMap::new();
        for (company, year) in observations {
            years.entry(company).or_default().insert(year);
        }
        Self {
            listed: years.len(),
            years,
            dated: true,
        }
    }

    /// Companies whose observed years hit at least `min_years` of `target_years`.
    ///
    /// Undated datasets cover every company they list.
    #[must_use]
    pub fn covered(&self, target_years: &BTreeSet<Year>, min_years: usize) -> BTreeSet<CompanyId> {
        self.years
            .iter()
            .filter(|(_, years)| {
                !self.dated || years.intersection(target_years).count() >= min_years
            })
            .map(|(company, _)| company.clone())
            .collect()
    }

    /// Number of distinct non-null company ids, whether or not any of their
    /// rows carried a usable year.
    #[must_use]
    pub const fn companies(&self) -> usize {
        self.listed
    }

    /// Smallest and largest year observed across all companies.
    #[must_use]
    pub fn year_range(&self) -> Option<(Year, Year)> {
        let mut all = self.years.values().flatten();
        let first = *all.next()?;
        Some(all.fold((first, first), |(lo, hi), &y| (lo.min(y), hi.max(y))))
    }
}

/// Companies in `frame` covering at least `min_years` of `target_years`.
///
/// # Errors
/// Returns an error if either column is absent.
pub fn coverage(
    frame: &DataFrame,
    company_column: &str,
    year_column: Option<&str>,
    target_years: &BTreeSet<Year>,
    min_years: usize,
) -> Result<BTreeSet<CompanyId>> {
    Ok(CompanyYears::observe(frame, company_column, year_column)?.covered(target_years, min_years))
}

/// Intersection of all coverage sets; empty when there are none.
pub fn intersect<'a, I>(sets: I) -> BTreeSet<CompanyId>
where
    I: IntoIterator<Item = &'a BTreeSet<CompanyId>>,
{
    let mut sets = sets.into_iter();
    let Some(first) = sets.next() else {
        return BTreeSet::new();
    };
    sets.fold(first.clone(), |acc, set| acc.intersection(set).cloned().collect())
}

/// Intersects coverage sets, failing when nothing is retained.
///
/// `diagnostics` renders the per-dataset counts carried by the error.
///
/// # Errors
/// Returns [`PanelError::EmptyRetention`] when the intersection is empty.
pub fn retain<'a, I, F>(sets: I, diagnostics: F) -> Result<BTreeSet<CompanyId>>
where
    I: IntoIterator<Item = &'a BTreeSet<CompanyId>>,
    F: FnOnce() -> String,
{
    let retained = intersect(sets);
    if retained.is_empty() {
        return Err(PanelError::EmptyRetention {
            diagnostics: diagnostics(),
        });
    }
    Ok(retained)
}
