//! Coverage diagnostics printed after analysis.

use panel_core::Year;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Coverage counts for one dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatasetCoverage {
    /// Dataset identifier.
    pub key: String,
    /// Source file.
    pub path: PathBuf,
    /// Resolved company column.
    pub company_column: String,
    /// Resolved date column.
    pub date_column: Option<String>,
    /// Rows after statement-type and year-end filtering.
    pub rows: usize,
    /// Distinct normalized companies.
    pub unique_companies: usize,
    /// Companies meeting the year threshold.
    pub covered_companies: usize,
    /// Smallest and largest year observed.
    pub year_range: Option<(Year, Year)>,
}

/// Per-dataset coverage for one run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CoverageReport {
    /// Target years.
    pub target_years: BTreeSet<Year>,
    /// Minimum covered years.
    pub min_years: usize,
    /// One entry per dataset, in registry order.
    pub datasets: Vec<DatasetCoverage>,
    /// Companies covered in every dataset.
    pub retained: usize,
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Companies with coverage across all datasets (>= {} of {:?}): {}",
            self.min_years, self.target_years, self.retained
        )?;
        for ds in &self.datasets {
            write!(
                f,
                "- {}: rows={}, unique companies={}, companies meeting threshold={}.",
                ds.key, ds.rows, ds.unique_companies, ds.covered_companies
            )?;
            if let Some((lo, hi)) = ds.year_range {
                write!(f, " years min/max: {lo}-{hi}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let report = CoverageReport {
            target_years: (2018..=2019).collect(),
            min_years: 2,
            datasets: vec![
                DatasetCoverage {
                    key: "cg_co".into(),
                    path: "CG_Co.xlsx".into(),
                    company_column: "Stkcd".into(),
                    date_column: None,
                    rows: 10,
                    unique_companies: 10,
                    covered_companies: 10,
                    year_range: None,
                },
                DatasetCoverage {
                    key: "fs_combas".into(),
                    path: "FS_Combas.xlsx".into(),
                    company_column: "Stkcd".into(),
                    date_column: Some("Accper".into()),
                    rows: 30,
                    unique_companies: 12,
                    covered_companies: 0,
                    year_range: Some((2010, 2015)),
                },
            ],
            retained: 0,
        };

        let text = report.to_string();
        assert!(text.starts_with("Companies with coverage across all datasets (>= 2 of {2018, 2019}): 0"));
        assert!(text.contains("- cg_co: rows=10, unique companies=10, companies meeting threshold=10.\n"));
        assert!(text.contains("years min/max: 2010-2015"));
    }
}
