//! Merge-stage orchestration over the persisted filtered copies.

use panel_core::{DatasetRegistry, PanelError, Result};
use panel_io::FILTERED_SUFFIX;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::{merge::merge_sources, source::MergeSource};

/// Extensions of filtered copies, in preference order.
const FILTERED_EXTENSIONS: &[&str] = &[".csv", ".xlsx", ".xls"];

/// Options for the merge stage.
#[derive(Clone, Debug)]
pub struct MergeOptions {
    /// Base data directory; its `filtered` subdirectory is preferred when present.
    pub data_dir: PathBuf,
    /// Merged CSV to write.
    pub output: PathBuf,
}

impl MergeOptions {
    /// Defaults for `data_dir`: write `<data_dir>/filtered/merged_filtered.csv`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            output: data_dir.join("filtered").join("merged_filtered.csv"),
            data_dir,
        }
    }

    /// Sets the output file.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Directory the filtered copies are read from.
    #[must_use]
    pub fn source_dir(&self) -> PathBuf {
        let filtered = self.data_dir.join("filtered");
        if filtered.is_dir() {
            filtered
        } else {
            self.data_dir.clone()
        }
    }
}

/// Result of a merge-stage run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeOutcome {
    /// File written.
    pub output: PathBuf,
    /// Rows in the merged table.
    pub rows: usize,
    /// Keys in the spine.
    pub spine_rows: usize,
    /// Dataset keys that were found and merged.
    pub merged: Vec<String>,
    /// Dataset keys whose filtered copy was not found.
    pub skipped: Vec<String>,
}

/// Locates a filtered copy in `dir`, falling back to `fallback`.
fn locate_filtered(dir: &Path, fallback: &Path, stem: &str) -> Result<Option<PathBuf>> {
    let extensions: Vec<String> = FILTERED_EXTENSIONS.iter().map(ToString::to_string).collect();
    for candidate_dir in [dir, fallback] {
        match panel_io::locate(candidate_dir, stem, FILTERED_SUFFIX, &extensions) {
            Ok(path) => return Ok(Some(path)),
            Err(PanelError::MissingFile { .. }) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

/// Reads every available filtered copy, merges them and writes the result.
///
/// Datasets whose filtered copy is missing are skipped with a warning.
///
/// # Errors
/// Returns [`PanelError::MissingFile`] when no filtered copy is found at all,
/// or the first read, key-resolution or write error.
#[instrument(skip_all, fields(data_dir = %options.data_dir.display()))]
pub fn run(registry: &DatasetRegistry, options: &MergeOptions) -> Result<MergeOutcome> {
    let source_dir = options.source_dir();
    let mut sources = Vec::with_capacity(registry.len());
    let mut merged_keys = Vec::new();
    let mut skipped = Vec::new();

    for config in registry {
        match locate_filtered(&source_dir, &options.data_dir, &config.stem)? {
            Some(path) => {
                let frame = panel_io::read_table(&path)?;
                info!(dataset = %config.key, path = %path.display(), rows = frame.height(), "Loaded filtered dataset");
                sources.push(MergeSource::from_config(config, frame));
                merged_keys.push(config.key.clone());
            }
            None => {
                warn!(dataset = %config.key, dir = %source_dir.display(), "No filtered file, skipping");
                skipped.push(config.key.clone());
            }
        }
    }

    if sources.is_empty() {
        return Err(PanelError::MissingFile {
            stem: format!("*{FILTERED_SUFFIX}"),
            extensions: FILTERED_EXTENSIONS.iter().map(ToString::to_string).collect(),
            dir: source_dir.display().to_string(),
        });
    }

    let (spine, mut merged) = merge_sources(sources)?;
    panel_io::write_table(&mut merged, &options.output)?;
    info!(
        path = %options.output.display(),
        rows = merged.height(),
        spine = spine.len(),
        "Merged file written"
    );

    Ok(MergeOutcome {
        output: options.output.clone(),
        rows: merged.height(),
        spine_rows: spine.len(),
        merged: merged_keys,
        skipped,
    })
}
