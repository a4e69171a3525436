#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/panel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Filter stage of panel assembly.
//!
//! - [`DatasetLoader`] - Reads a source and applies statement-type and year-end filters
//! - [`CompanyYears`] - Years observed per company, and the threshold test
//! - [`intersect`] / [`retain`] - Companies covered in every dataset
//! - [`filter_companies_years`] - Restricts a table to retained companies and years
//! - [`run`](stage::run) - The whole stage, from source files to filtered copies

/// Per-dataset coverage and cross-dataset retention.
pub mod coverage;
/// Company/year restriction.
pub mod filter;
/// Source loading and row filters.
pub mod loader;
/// Coverage diagnostics.
pub mod report;
/// Stage orchestration.
pub mod stage;

pub use coverage::{CompanyYears, coverage, intersect, retain};
pub use filter::{filter_companies_years, filter_dataset};
pub use loader::{Dataset, DatasetLoader};
pub use report::{CoverageReport, DatasetCoverage};
pub use stage::{
    Analysis, FilterOptions, FilterOutcome, FilteredOutput, analyze, analyze_loaded, persist, run,
};
