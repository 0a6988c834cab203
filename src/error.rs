//! Structured error types for cellgrid.
//!
//! Validation failures are data (see [`crate::types::ValidationError`]) and never
//! travel through this type. `GridError` covers API misuse and collaborator
//! failures only.

/// All errors that can occur while driving a grid.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// A positional coordinate does not address a cell in the grid.
    #[error("Cell ({row}, {col}) is outside the grid")]
    OutOfBounds { row: i32, col: u32 },

    /// No column exists at the given position.
    #[error("Unknown column at position {0}")]
    UnknownColumn(u32),

    /// The cell exists but its column does not accept edits.
    #[error("Column {0} is not editable")]
    ReadOnly(u32),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON (de)serialization of columns, rows or config failed.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The persistence collaborator rejected a write.
    #[error("Commit failed: {0}")]
    Commit(String),

    /// The background validation worker could not be used.
    #[error("Validation worker: {0}")]
    Worker(String),

    /// Platform clipboard failure.
    #[error("Clipboard: {0}")]
    Clipboard(String),

    /// Catch-all for string errors from host callbacks.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

impl From<String> for GridError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for GridError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<GridError> for wasm_bindgen::JsValue {
    fn from(e: GridError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
