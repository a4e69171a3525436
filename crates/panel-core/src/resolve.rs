//! Column-name resolution across historical file variants.
//!
//! The same logical column has carried several names over time (`Stkcd` vs
//! `Symbol`, `Accper` vs `EndDate`, or `Accper.1` after a prior join added a
//! duplicate suffix). These helpers pick the first candidate that is present.

use crate::error::{PanelError, Result};

/// Date-column names tried at merge time when a declared name is absent.
pub const DATE_FALLBACKS: &[&str] = &["Accper", "Accper.1", "EndDate", "EndDate.1"];

/// Company-column names tried at merge time after the declared ones.
pub const COMPANY_FALLBACKS: &[&str] = &["Stkcd", "Symbol"];

/// Returns the first candidate that appears in `present`.
#[must_use]
pub fn resolve<'a, P, C>(present: &[P], candidates: &'a [C]) -> Option<&'a str>
where
    P: AsRef<str>,
    C: AsRef<str>,
{
    candidates
        .iter()
        .map(|c| c.as_ref())
        .find(|c| present.iter().any(|p| p.as_ref() == *c))
}

/// Like [`resolve`], failing with [`PanelError::MissingColumn`] when nothing matches.
pub fn require<P, C>(present: &[P], candidates: &[C], dataset: &str) -> Result<String>
where
    P: AsRef<str>,
    C: AsRef<str>,
{
    resolve(present, candidates)
        .map(str::to_string)
        .ok_or_else(|| PanelError::missing_column(dataset, candidates))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_present_wins() {
        let present = ["Symbol", "Stkcd", "EndDate"];
        assert_eq!(resolve(&present, &["Stkcd", "Symbol"]), Some("Stkcd"));
        assert_eq!(resolve(&present, &["Accper", "EndDate"]), Some("EndDate"));
    }

    #[test]
    fn test_duplicate_suffixed_fallback() {
        let present = vec!["Symbol".to_string(), "Accper.1".to_string()];
        let mut candidates = vec!["Accper"];
        candidates.extend_from_slice(DATE_FALLBACKS);
        assert_eq!(resolve(&present, &candidates), Some("Accper.1"));
    }

    #[test]
    fn test_required_column_missing() {
        let present = ["a", "b"];
        let err = require(&present, &["c", "d"], "fs_combas").unwrap_err();
        assert!(matches!(
            err,
            PanelError::MissingColumn { ref dataset, ref candidates }
                if dataset == "fs_combas" && candidates.len() == 2
        ));
    }

    #[test]
    fn test_empty_candidates() {
        let present = ["a"];
        let none: [&str; 0] = [];
        assert_eq!(resolve(&present, &none), None);
    }
}
