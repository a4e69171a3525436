//! Filter-stage orchestration: load, analyze, retain, persist.

use panel_core::{
    CompanyId, DEFAULT_MIN_YEARS, DatasetRegistry, PanelError, Result, StatementScope, Year,
    default_target_years,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::{
    coverage::{CompanyYears, retain},
    filter::filter_dataset,
    loader::{Dataset, DatasetLoader},
    report::{CoverageReport, DatasetCoverage},
};

/// Options for the filter stage.
#[derive(Clone, Debug)]
pub struct FilterOptions {
    /// Directory holding the source files.
    pub data_dir: PathBuf,
    /// Directory the filtered copies are written to.
    pub output_dir: PathBuf,
    /// Years a company must be observed in.
    pub target_years: BTreeSet<Year>,
    /// Minimum number of target years per company and dataset.
    pub min_years: usize,
    /// Which statement rows to keep.
    pub scope: StatementScope,
}

impl FilterOptions {
    /// Defaults for `data_dir`: output to `<data_dir>/filtered`, 2018-2024,
    /// at least 3 years, parent statements only.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            output_dir: data_dir.join("filtered"),
            data_dir,
            target_years: default_target_years(),
            min_years: DEFAULT_MIN_YEARS,
            scope: StatementScope::Parent,
        }
    }

    /// Sets the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Sets the target years.
    #[must_use]
    pub fn with_target_years(mut self, years: impl IntoIterator<Item = Year>) -> Self {
        self.target_years = years.into_iter().collect();
        self
    }

    /// Sets the minimum number of covered years.
    #[must_use]
    pub const fn with_min_years(mut self, min_years: usize) -> Self {
        self.min_years = min_years;
        self
    }

    /// Also keep consolidated statements.
    #[must_use]
    pub const fn with_consolidated(mut self, include: bool) -> Self {
        self.scope = StatementScope::from_flag(include);
        self
    }

    /// Checks the year settings are usable.
    ///
    /// # Errors
    /// Returns [`PanelError::InvalidParameter`] for an empty year set or a
    /// threshold outside `1..=target_years.len()`.
    pub fn validate(&self) -> Result<()> {
        if self.target_years.is_empty() {
            return Err(PanelError::InvalidParameter(
                "at least one target year is required".to_string(),
            ));
        }
        if self.min_years == 0 || self.min_years > self.target_years.len() {
            return Err(PanelError::InvalidParameter(format!(
                "min years must be between 1 and {} (got {})",
                self.target_years.len(),
                self.min_years
            )));
        }
        Ok(())
    }
}

/// Datasets loaded and analyzed, with the companies retained across all of them.
#[derive(Debug)]
pub struct Analysis {
    /// Loaded datasets, in registry order.
    pub datasets: Vec<Dataset>,
    /// Companies covered in every dataset.
    pub retained: BTreeSet<CompanyId>,
    /// Per-dataset diagnostics.
    pub report: CoverageReport,
}

/// One persisted filtered copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilteredOutput {
    /// Dataset identifier.
    pub key: String,
    /// File written.
    pub path: PathBuf,
    /// Rows written.
    pub rows: usize,
}

/// Result of a full filter-stage run.
#[derive(Debug)]
pub struct FilterOutcome {
    /// Per-dataset diagnostics.
    pub report: CoverageReport,
    /// Files written, in registry order.
    pub outputs: Vec<FilteredOutput>,
}

/// Loads every registered dataset and computes the retained companies.
///
/// # Errors
/// Fails on the first dataset that cannot be located or loaded, and with
/// [`PanelError::EmptyRetention`] when no company is covered everywhere.
#[instrument(skip_all, fields(data_dir = %options.data_dir.display()))]
pub fn analyze(registry: &DatasetRegistry, options: &FilterOptions) -> Result<Analysis> {
    options.validate()?;
    let loader = DatasetLoader::new(options.scope);

    let mut datasets = Vec::with_capacity(registry.len());
    for config in registry {
        let path = loader.locate(config, &options.data_dir)?;
        datasets.push(loader.load(&path, config)?);
    }
    analyze_loaded(datasets, &options.target_years, options.min_years)
}

/// Computes coverage and retention over already-loaded datasets.
///
/// # Errors
/// Returns [`PanelError::EmptyRetention`] when no company is covered everywhere.
pub fn analyze_loaded(
    datasets: Vec<Dataset>,
    target_years: &BTreeSet<Year>,
    min_years: usize,
) -> Result<Analysis> {
    let mut report = CoverageReport {
        target_years: target_years.clone(),
        min_years,
        ..Default::default()
    };
    let mut covered = Vec::with_capacity(datasets.len());

    for ds in &datasets {
        let observed = CompanyYears::observe(&ds.frame, &ds.company_column, ds.date_column.as_deref())?;
        let set = observed.covered(target_years, min_years);
        report.datasets.push(DatasetCoverage {
            key: ds.key.clone(),
            path: ds.path.clone(),
            company_column: ds.company_column.clone(),
            date_column: ds.date_column.clone(),
            rows: ds.height(),
            unique_companies: observed.companies(),
            covered_companies: set.len(),
            year_range: observed.year_range(),
        });
        covered.push(set);
    }

    let retained = match retain(&covered, || report.to_string()) {
        Ok(retained) => retained,
        Err(err) => {
            warn!("{report}");
            return Err(err);
        }
    };
    report.retained = retained.len();
    info!("{report}");

    Ok(Analysis {
        datasets,
        retained,
        report,
    })
}

/// Filters every analyzed dataset and writes the copies to `output_dir`.
///
/// # Errors
/// Fails on the first dataset that cannot be filtered or written; files
/// already written stay in place.
pub fn persist(analysis: &Analysis, output_dir: &Path) -> Result<Vec<FilteredOutput>> {
    let mut outputs = Vec::with_capacity(analysis.datasets.len());
    for ds in &analysis.datasets {
        let mut filtered = filter_dataset(ds, &analysis.retained, &analysis.report.target_years)?;
        let path = panel_io::filtered_path(output_dir, &ds.path);
        panel_io::write_table(&mut filtered.frame, &path)?;
        info!(dataset = %ds.key, path = %path.display(), rows = filtered.height(), "Saved filtered dataset");
        outputs.push(FilteredOutput {
            key: ds.key.clone(),
            path,
            rows: filtered.height(),
        });
    }
    Ok(outputs)
}

/// Runs the whole filter stage.
///
/// # Errors
/// See [`analyze`] and [`persist`].
pub fn run(registry: &DatasetRegistry, options: &FilterOptions) -> Result<FilterOutcome> {
    let analysis = analyze(registry, options)?;
    let outputs = persist(&analysis, &options.output_dir)?;
    Ok(FilterOutcome {
        report: analysis.report,
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn dataset(key: &str, rows: &[(&str, &str)]) -> Dataset {
        let frame = DataFrame::new(vec![
            Column::new("Symbol".into(), rows.iter().map(|r| r.0).collect::<Vec<_>>()),
            Column::new("EndDate".into(), rows.iter().map(|r| r.1).collect::<Vec<_>>()),
        ])
        .unwrap();
        Dataset {
            key: key.to_string(),
            path: PathBuf::from(format!("{key}.csv")),
            frame,
            company_column: "Symbol".to_string(),
            date_column: Some("EndDate".to_string()),
        }
    }

    const FULL: &[(&str, &str)] = &[
        ("A", "2018-12-31"),
        ("A", "2019-12-31"),
        ("A", "2020-12-31"),
        ("A", "2021-12-31"),
        ("B", "2018-12-31"),
        ("B", "2019-12-31"),
        ("B", "2020-12-31"),
    ];

    #[test]
    fn test_options_validation() {
        let options = FilterOptions::new("/data");
        assert_eq!(options.output_dir, PathBuf::from("/data/filtered"));
        assert!(options.validate().is_ok());
        assert!(options.clone().with_min_years(0).validate().is_err());
        assert!(options.clone().with_min_years(8).validate().is_err());
        assert!(options.with_target_years([]).validate().is_err());
    }

    #[test]
    fn test_fourth_dataset_drops_company() {
        let datasets = vec![
            dataset("one", FULL),
            dataset("two", FULL),
            dataset("three", FULL),
            dataset("four", &[("A", "2018-12-31"), ("A", "2019-12-31"), ("B", "2018-12-31"), ("B", "2019-12-31"), ("B", "2021-12-31")]),
        ];
        let target: BTreeSet<Year> = (2018..=2021).collect();

        let analysis = analyze_loaded(datasets, &target, 3).unwrap();
        assert_eq!(analysis.retained, BTreeSet::from([CompanyId::new("B")]));
        assert_eq!(analysis.report.retained, 1);
        assert_eq!(analysis.report.datasets[3].covered_companies, 1);
        assert_eq!(analysis.report.datasets[0].covered_companies, 2);
    }

    #[test]
    fn test_empty_retention_carries_counts() {
        let datasets = vec![
            dataset("fs_combas", FULL),
            dataset("mc_pro", &[("Z", "2018-12-31")]),
        ];
        let target: BTreeSet<Year> = (2018..=2021).collect();

        let err = analyze_loaded(datasets, &target, 3).unwrap_err();
        match err {
            PanelError::EmptyRetention { diagnostics } => {
                assert!(diagnostics.contains("- fs_combas: rows=7, unique companies=2, companies meeting threshold=2."));
                assert!(diagnostics.contains("- mc_pro: rows=1, unique companies=1, companies meeting threshold=0."));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unique_companies_include_unparsable_years() {
        let datasets = vec![
            dataset("fs_combas", FULL),
            dataset(
                "mc_pro",
                &[("A", "2018-12-31"), ("B", "12/31/2018"), ("C", "12/31/2019")],
            ),
        ];
        let target: BTreeSet<Year> = (2018..=2021).collect();

        let analysis = analyze_loaded(datasets, &target, 1).unwrap();
        let mc_pro = &analysis.report.datasets[1];
        assert_eq!(mc_pro.unique_companies, 3);
        assert_eq!(mc_pro.covered_companies, 1);
        assert_eq!(analysis.retained, BTreeSet::from([CompanyId::new("A")]));
    }

    #[test]
    fn test_persist_keeps_spreadsheet_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut workbook = dataset("cg_co", &[("A", "2019-12-31"), ("C", "2019-12-31")]);
        workbook.path = PathBuf::from("raw/CG_Co.xlsx");
        let datasets = vec![workbook, dataset("mc_pro", FULL)];
        let target: BTreeSet<Year> = (2018..=2021).collect();

        let analysis = analyze_loaded(datasets, &target, 1).unwrap();
        let outputs = persist(&analysis, dir.path()).unwrap();

        assert_eq!(outputs[0].path, dir.path().join("CG_Co_filtered.xlsx"));
        assert_eq!(outputs[0].rows, 1);
        assert_eq!(outputs[1].path, dir.path().join("mc_pro_filtered.csv"));
        assert_eq!(outputs[1].rows, 4);

        let written = panel_io::read_table(&outputs[0].path).unwrap();
        assert_eq!(written.height(), 1);
        let ids = panel_core::normalize::string_values(written.column("Symbol").unwrap()).unwrap();
        assert_eq!(ids, vec![Some("A".to_string())]);
    }
}
