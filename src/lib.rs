//! cellgrid - spreadsheet-style editing core for virtualized grids
//!
//! Everything between "the user pressed a key" and "the dataset changed":
//! - Selection (single cell, ranges, rows, Ctrl-toggled sets, drag with edge auto-scroll)
//! - Keyboard navigation that skips non-navigable header cells
//! - Cell editing through an overlay input, in place, or a digit-buffer date-time editor
//! - Tab-separated copy/paste with a per-paste validation summary
//! - Debounced per-cell validation and chunked or background bulk revalidation
//! - Error bookkeeping that survives row and column insertion, deletion and reorder
//!
//! Rendering, persistence and rule definitions stay with the host and are
//! reached through the traits in [`adapter`].
//!
//! # Usage (Rust)
//!
//! ```
//! use cellgrid::{CellPos, CellValue, ColumnDescriptor, Grid, Row, TableData, ValidationOutcome};
//!
//! let columns = vec![ColumnDescriptor::new(0, "number", "qty")];
//! let rows = vec![Row::new().with("qty", "3")];
//! let mut grid = Grid::builder(TableData::new(columns, rows))
//!     .rules(|value: &CellValue, _: &str| match value.display().parse::<f64>() {
//!         Ok(_) => ValidationOutcome::ok(),
//!         Err(_) => ValidationOutcome::invalid("Not a number"),
//!     })
//!     .build()
//!     .unwrap();
//!
//! grid.select_cell(CellPos::new(0, 0));
//! grid.paste_text("abc").unwrap();
//! assert!(grid.error_at(CellPos::new(0, 0)).is_some());
//! ```
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { WebGrid } from 'cellgrid';
//! await init();
//! const grid = new WebGrid(columns, rows, config, callbacks, container);
//! ```

pub mod adapter;
pub mod cell_key;
pub mod clipboard;
pub mod clock;
pub mod commit;
pub mod config;
pub mod editor;
pub mod error;
pub mod grid;
pub mod layout;
pub mod navigation;
pub mod remap;
pub mod selection;
pub mod table;
pub mod types;
pub mod validation;

#[cfg(target_arch = "wasm32")]
pub mod web;

use wasm_bindgen::prelude::*;

pub use adapter::{
    CellIdentity, CellStore, CommitSink, GeometryProvider, GridEvents, Rect, StructureStore,
    ValidationRules,
};
pub use cell_key::{ColumnKey, ErrorKey};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GridConfig;
pub use error::{GridError, Result};
pub use grid::{Grid, GridBuilder, Modifiers, PointerButton, TickReport};
pub use navigation::{Direction, Key, KeyInput};
pub use selection::{SelectionMode, SelectionState};
pub use table::TableData;
pub use types::*;

#[cfg(target_arch = "wasm32")]
pub use web::WebGrid;

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
