//! Source-file lookup by filename stem.

use panel_core::{PanelError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Finds `<stem><suffix><ext>` in `dir`.
///
/// Extensions are tried in order for an exact name first; then, per extension,
/// the lexicographically first file matching `<stem>*<suffix><ext>` is taken.
///
/// # Errors
/// Returns [`PanelError::MissingFile`] when neither pass finds a file.
pub fn locate(dir: &Path, stem: &str, suffix: &str, extensions: &[String]) -> Result<PathBuf> {
    for ext in extensions {
        let candidate = dir.join(format!("{stem}{suffix}{ext}"));
        if candidate.is_file() {
            debug!(path = %candidate.display(), "Located input");
            return Ok(candidate);
        }
    }

    let escaped_dir = glob::Pattern::escape(&dir.to_string_lossy());
    for ext in extensions {
        let pattern = format!(
            "{escaped_dir}/{}*{}",
            glob::Pattern::escape(stem),
            glob::Pattern::escape(&format!("{suffix}{ext}"))
        );
        let mut matches: Vec<PathBuf> = glob::glob(&pattern)
            .map_err(|e| PanelError::Pattern(e.to_string()))?
            .filter_map(std::result::Result::ok)
            .filter(|p| p.is_file())
            .collect();
        matches.sort();
        if let Some(first) = matches.into_iter().next() {
            debug!(path = %first.display(), "Located input by pattern");
            return Ok(first);
        }
    }

    Err(PanelError::MissingFile {
        stem: format!("{stem}{suffix}"),
        extensions: extensions.to_vec(),
        dir: dir.display().to_string(),
    })
}
