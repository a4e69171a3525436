//! Left-joining every source onto the spine.

use panel_core::Result;
use polars::prelude::*;
use tracing::{debug, instrument, warn};

use crate::{
    source::{KeyedSource, MergeSource},
    spine::{Spine, build_spine},
};

/// Left-joins every keyed source onto `spine`, in order.
///
/// Dated sources join on `Symbol` and `Date`, undated ones on `Symbol` only.
/// Spine keys without a match get null columns for that source. The result
/// has one row per spine key unless a source carries several rows for one
/// key, in which case those spine rows fan out; this is logged, never
/// deduplicated.
///
/// # Errors
/// Returns an error if a join fails.
#[instrument(skip_all, fields(spine = spine.len(), sources = sources.len()))]
pub fn merge(spine: &Spine, sources: &[KeyedSource]) -> Result<DataFrame> {
    let mut merged = spine.to_frame()?;

    for source in sources {
        let duplicates = source.duplicate_keys()?;
        if duplicates > 0 {
            warn!(
                source = %source.prefix,
                duplicates,
                "Source repeats join keys; matching spine rows fan out"
            );
        }

        let on: Vec<Expr> = source.keys().iter().map(|k| col(*k)).collect();
        merged = merged
            .lazy()
            .join(
                source.frame.clone().lazy(),
                on.clone(),
                on,
                JoinArgs::new(JoinType::Left),
            )
            .collect()?;
        debug!(source = %source.prefix, rows = merged.height(), cols = merged.width(), "Joined source");
    }

    if merged.height() != spine.len() {
        warn!(
            spine = spine.len(),
            merged = merged.height(),
            "Merged row count differs from spine"
        );
    }
    Ok(merged)
}

/// Keys every source, builds the spine from the dated ones, and merges.
///
/// # Errors
/// Returns [`PanelError::MissingColumn`](panel_core::PanelError::MissingColumn)
/// if a source lacks its key columns, or an error if a join fails.
pub fn merge_sources(sources: Vec<MergeSource>) -> Result<(Spine, DataFrame)> {
    let keyed = sources
        .into_iter()
        .map(MergeSource::into_keyed)
        .collect::<Result<Vec<_>>>()?;
    let spine = build_spine(&keyed)?;
    let merged = merge(&spine, &keyed)?;
    Ok((spine, merged))
}
