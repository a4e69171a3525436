//! Core data types for panel assembly.
//!
//! This module defines the key types shared by every stage:
//!
//! - [`CompanyId`] - Normalized company identifier
//! - [`Year`] - Calendar year used as the coverage unit
//! - [`SpineKey`] - The `(company, period-end date)` pair keying the merged panel

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar year extracted from a period-end date.
pub type Year = i32;

/// A normalized company identifier.
///
/// Identifiers are trimmed and lose a trailing `.0` on creation, which is the
/// artifact left when a code passes through a float-typed spreadsheet column.
/// Leading zeros are kept as-is, so `"000001"` and `"1"` stay distinct.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompanyId(String);

impl CompanyId {
    /// Creates a new identifier from its raw representation.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(normalize_token(raw.as_ref()).to_string())
    }

    /// Creates an identifier, returning `None` when nothing is left after normalization.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let token = normalize_token(raw);
        (!token.is_empty()).then(|| Self(token.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Trims whitespace and strips one trailing `.0`.
#[must_use]
pub fn normalize_token(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed.strip_suffix(".0").unwrap_or(trimmed)
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A `(company, period-end date)` pair; unique across the spine.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpineKey {
    /// Normalized company identifier.
    pub company: CompanyId,
    /// Period-end date.
    pub date: NaiveDate,
}

impl SpineKey {
    /// Creates a new spine key.
    #[must_use]
    pub const fn new(company: CompanyId, date: NaiveDate) -> Self {
        Self { company, date }
    }
}

impl fmt::Display for SpineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.company, self.date)
    }
}
