//! Both stages, back to back.

use panel_core::{DatasetRegistry, Result};
use panel_filter::{FilterOptions, FilterOutcome};
use panel_merge::{MergeOptions, MergeOutcome};
use std::path::Path;
use tracing::{info, instrument};

/// Result of [`build`].
#[derive(Debug)]
pub struct BuildOutcome {
    /// Filter-stage result.
    pub filter: FilterOutcome,
    /// Merge-stage result.
    pub merge: MergeOutcome,
}

/// Filters every source, then merges the filtered copies.
///
/// The merged table goes to `merged_output`, or to
/// `<output_dir>/merged_filtered.csv` when `None`.
///
/// # Errors
/// Returns the first error of either stage. A failed merge leaves the filtered
/// copies in place.
#[instrument(skip_all, fields(data_dir = %options.data_dir.display()))]
pub fn build(
    registry: &DatasetRegistry,
    options: &FilterOptions,
    merged_output: Option<&Path>,
) -> Result<BuildOutcome> {
    let filter = panel_filter::run(registry, options)?;

    let output = merged_output.map_or_else(
        || options.output_dir.join("merged_filtered.csv"),
        Path::to_path_buf,
    );
    let merge_options = MergeOptions::new(&options.output_dir).with_output(output);
    let merge = panel_merge::run(registry, &merge_options)?;

    info!(
        retained = filter.report.retained,
        rows = merge.rows,
        output = %merge.output.display(),
        "Panel built"
    );
    Ok(BuildOutcome { filter, merge })
}
