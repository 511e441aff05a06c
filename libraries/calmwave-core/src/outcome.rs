//! Outcome of a write that targets an existing row

use serde::{Deserialize, Serialize};

/// Whether a write found its target.
///
/// Storage failures travel separately as [`crate::CatalogError`], so a caller sees three
/// distinguishable cases: `Ok(Success)`, `Ok(NotFound)` and `Err(_)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// At least one row was affected
    Success,
    /// No row matched
    NotFound,
}

impl Outcome {
    /// Classify a write by its affected-row count
    pub fn from_rows_affected(rows: u64) -> Self {
        if rows == 0 {
            Self::NotFound
        } else {
            Self::Success
        }
    }

    /// The write found its target
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// Nothing matched
    pub fn is_not_found(self) -> bool {
        self == Self::NotFound
    }
}
