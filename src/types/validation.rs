use serde::{Deserialize, Serialize};

use crate::cell_key::ColumnKey;

/// Result of one rule evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationOutcome {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// A recorded validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub message: String,
    pub column: ColumnKey,
    pub row_index: usize,
}

/// Summary reported once after a multi-cell paste or import.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PasteSummary {
    /// Cells written.
    pub total: usize,
    /// Written cells that failed validation.
    pub errors: usize,
    /// `errors / total`, `0.0` when nothing was written.
    pub rate: f64,
}

impl PasteSummary {
    pub fn new(total: usize, errors: usize) -> Self {
        let rate = if total == 0 {
            0.0
        } else {
            errors as f64 / total as f64
        };
        Self {
            total,
            errors,
            rate,
        }
    }
}
