#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/panel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types for financial panel assembly.
//!
//! This crate provides the foundations shared by the filter and merge stages:
//!
//! - [`CompanyId`](types::CompanyId) - Normalized company identifier
//! - [`SpineKey`](types::SpineKey) - `(company, period-end date)` key of the merged panel
//! - [`DatasetRegistry`](config::DatasetRegistry) - Declarative source descriptors
//! - [`resolve`](resolve::resolve) - Column alias resolution
//! - [`PanelError`](error::PanelError) - Error taxonomy

/// Dataset descriptors and registry.
pub mod config;
/// Error types for panel operations.
pub mod error;
/// Table format and statement scope definitions.
pub mod format;
/// Identifier and date normalization.
pub mod normalize;
/// Column-name resolution.
pub mod resolve;
/// Core data types (CompanyId, SpineKey, Year).
pub mod types;

// Re-export commonly used items at crate root
pub use config::{
    DEFAULT_MIN_YEARS, DEFAULT_TARGET_YEARS, DatasetConfig, DatasetRegistry, RowFilter,
    default_target_years,
};
pub use error::{PanelError, Result};
pub use format::{StatementScope, TableFormat};
pub use types::{CompanyId, SpineKey, Year};

/// Canonical company key column of filtered and merged tables.
pub const COMPANY_KEY: &str = "Symbol";

/// Canonical period-end date key column of the merged table.
pub const DATE_KEY: &str = "Date";
