//! Grid configuration.
//!
//! Every field has a default, so hosts only send the values they override:
//!
//! ```
//! let config = cellgrid::GridConfig::from_json(r#"{ "debounceMs": 150 }"#).unwrap();
//! assert_eq!(config.debounce_ms, 150);
//! assert_eq!(config.editable_header_row, Some(-1));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Tunables for one grid instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    /// Quiet period before a typed value is validated.
    pub debounce_ms: u32,
    /// Bulk revalidation runs in a single pass up to this many cells.
    pub sync_revalidation_limit: usize,
    /// Cells processed per chunk above the limit.
    pub revalidation_chunk_size: usize,
    /// Hand bulk revalidation to a background worker when one can be started.
    pub use_worker: bool,
    /// The only header row whose cells can be navigated to and edited.
    pub editable_header_row: Option<i32>,
    /// Distance from the viewport edge that starts drag auto-scroll.
    pub autoscroll_edge_px: f32,
    /// Auto-scroll tick interval.
    pub autoscroll_interval_ms: u32,
    /// Scroll distance per tick when the pointer is at (or past) the edge.
    pub autoscroll_max_step_px: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            sync_revalidation_limit: 2_000,
            revalidation_chunk_size: 500,
            use_worker: false,
            editable_header_row: Some(-1),
            autoscroll_edge_px: 32.0,
            autoscroll_interval_ms: 50,
            autoscroll_max_step_px: 24.0,
        }
    }
}

impl GridConfig {
    /// Parse a (partial) JSON config and check it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall the interaction loop.
    pub fn validate(&self) -> Result<()> {
        if self.revalidation_chunk_size == 0 {
            return Err(GridError::Config(
                "revalidationChunkSize must be at least 1".into(),
            ));
        }
        if self.autoscroll_interval_ms == 0 {
            return Err(GridError::Config(
                "autoscrollIntervalMs must be at least 1".into(),
            ));
        }
        if !(self.autoscroll_edge_px.is_finite() && self.autoscroll_edge_px > 0.0) {
            return Err(GridError::Config(
                "autoscrollEdgePx must be a positive number".into(),
            ));
        }
        if !(self.autoscroll_max_step_px.is_finite() && self.autoscroll_max_step_px > 0.0) {
            return Err(GridError::Config(
                "autoscrollMaxStepPx must be a positive number".into(),
            ));
        }
        if let Some(row) = self.editable_header_row {
            if row >= 0 {
                return Err(GridError::Config(format!(
                    "editableHeaderRow must be negative, got {row}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GridConfig::from_json("{}").unwrap();
        assert_eq!(config, GridConfig::default());
        assert_eq!(config.debounce_ms, 300);
        assert!(!config.use_worker);
    }

    #[test]
    fn test_partial_override() {
        let config =
            GridConfig::from_json(r#"{"useWorker": true, "editableHeaderRow": null}"#).unwrap();
        assert!(config.use_worker);
        assert_eq!(config.editable_header_row, None);
        assert_eq!(config.revalidation_chunk_size, 500);
    }

    #[test]
    fn test_rejects_zero_chunk() {
        let err = GridConfig::from_json(r#"{"revalidationChunkSize": 0}"#).unwrap_err();
        assert!(matches!(err, GridError::Config(_)));
    }

    #[test]
    fn test_rejects_body_row_as_header() {
        assert!(GridConfig::from_json(r#"{"editableHeaderRow": 0}"#).is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            GridConfig::from_json("{not json").unwrap_err(),
            GridError::Json(_)
        ));
    }
}
