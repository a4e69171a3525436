#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/panel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Financial panel assembly.
//!
//! This crate re-exports the core types and both stages, and provides
//! [`build`] to run them back to back. The stages hand off through the
//! filtered copies written to disk, so either can also be run on its own.
//!
//! # Features
//!
//! - `spreadsheet` - Read Excel sources (on by default)

// Core types and configuration
pub use panel_core::*;

// Stages
pub use panel_filter::{
    CoverageReport, Dataset, DatasetCoverage, DatasetLoader, FilterOptions, FilterOutcome,
    FilteredOutput,
};
pub use panel_merge::{MergeOptions, MergeOutcome, Spine};

/// Filter stage.
pub use panel_filter as filter;
/// Merge stage.
pub use panel_merge as merge;
/// Table load/save primitives.
pub use panel_io as io;

mod pipeline;
pub use pipeline::{BuildOutcome, build};
