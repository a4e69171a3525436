#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/panel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Merge stage of panel assembly.
//!
//! - [`MergeSource`] / [`KeyedSource`] - A source before and after key canonicalization
//! - [`build_spine`] - Union of `(Symbol, Date)` keys over dated sources
//! - [`merge`] - Spine-preserving left joins with prefixed columns
//! - [`run`](stage::run) - The whole stage, from filtered copies to the merged CSV

/// Spine-preserving joins.
pub mod merge;
/// Key canonicalization of a source.
pub mod source;
/// The `(company, date)` key table.
pub mod spine;
/// Stage orchestration.
pub mod stage;

pub use merge::{merge, merge_sources};
pub use source::{KeyedSource, MergeSource};
pub use spine::{Spine, build_spine, source_keys};
pub use stage::{MergeOptions, MergeOutcome, run};
