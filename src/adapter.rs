//! Boundary contracts between the grid core and its host.
//!
//! Rendering, persistence and rule definitions live outside this crate; the
//! core reaches them only through these traits.

use serde::{Deserialize, Serialize};

use crate::cell_key::ColumnKey;
use crate::error::Result;
use crate::types::{CellPos, CellValue, ColumnDescriptor, PasteSummary, ValidationOutcome};

/// Externally supplied per-type validation rules.
///
/// Implementations should be pure. Any `Fn(&CellValue, &str) -> ValidationOutcome`
/// closure is a rule set.
pub trait ValidationRules {
    fn validate(&self, value: &CellValue, column_type: &str) -> ValidationOutcome;
}

impl<F> ValidationRules for F
where
    F: Fn(&CellValue, &str) -> ValidationOutcome,
{
    fn validate(&self, value: &CellValue, column_type: &str) -> ValidationOutcome {
        self(value, column_type)
    }
}

/// Read/write access to the dataset, by position.
pub trait CellStore {
    /// Columns in position order.
    fn columns(&self) -> &[ColumnDescriptor];

    /// Number of body rows.
    fn row_count(&self) -> usize;

    /// Current value at `row` (negative for header rows, which return the
    /// header's display text without markup).
    fn cell_value(&self, row: i32, column: &ColumnDescriptor) -> CellValue;

    fn set_cell_value(&mut self, row: i32, column: &ColumnDescriptor, value: CellValue)
        -> Result<()>;

    /// Position in the unfiltered dataset for a derived view.
    fn original_index(&self, row: usize) -> Option<usize>;

    fn column_at(&self, col: u32) -> Option<&ColumnDescriptor> {
        self.columns()
            .get(usize::try_from(col).ok()?)
            .filter(|c| c.col_index == col)
            .or_else(|| self.columns().iter().find(|c| c.col_index == col))
    }

    fn column_count(&self) -> u32 {
        u32::try_from(self.columns().len()).unwrap_or(u32::MAX)
    }
}

/// A store the grid may restructure itself.
pub trait StructureStore: CellStore {
    /// Insert `count` empty rows before `at`. Returns the actual insertion index.
    fn insert_rows(&mut self, at: usize, count: usize) -> usize;

    /// Remove rows. Returns the removed indices, sorted and deduplicated.
    fn delete_rows(&mut self, indices: &[usize]) -> Vec<usize>;

    /// Replace the column set.
    fn set_columns(&mut self, columns: Vec<ColumnDescriptor>);
}

/// Identity of a written cell as seen by the persistence hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellIdentity {
    pub row: i32,
    pub column: ColumnKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_index: Option<usize>,
}

/// Fire-and-forget persistence hook, invoked on every confirmed edit,
/// pasted cell and imported cell.
pub trait CommitSink {
    fn commit_write(
        &mut self,
        cell: &CellIdentity,
        old: &CellValue,
        new: &CellValue,
        column: &ColumnDescriptor,
    ) -> Result<()>;
}

/// Discards every write.
#[derive(Debug, Default)]
pub struct NoopCommitSink;

impl CommitSink for NoopCommitSink {
    fn commit_write(
        &mut self,
        _cell: &CellIdentity,
        _old: &CellValue,
        _new: &CellValue,
        _column: &ColumnDescriptor,
    ) -> Result<()> {
        Ok(())
    }
}

/// Screen rectangle in logical (CSS) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Geometry of the rendered grid.
///
/// Virtualization means a cell may not exist on screen; callers ask for
/// [`GeometryProvider::ensure_visible`] before reading its rect.
pub trait GeometryProvider {
    /// Scroll so that `pos` is materialized and on screen.
    fn ensure_visible(&mut self, pos: CellPos);

    /// Screen rect of a materialized cell.
    fn cell_rect(&self, pos: CellPos) -> Option<Rect>;

    /// Cell under a screen point.
    fn cell_at_point(&self, x: f32, y: f32) -> Option<CellPos>;

    /// Visible area of the grid on screen.
    fn viewport_rect(&self) -> Rect;

    /// Scroll the body by a delta. Returns `false` when already at the limit.
    fn scroll_by(&mut self, dx: f32, dy: f32) -> bool;

    /// The grid gained or lost rows or columns.
    fn grid_resized(&mut self, _rows: usize, _cols: u32) {}
}

/// Progress and summary notifications for bulk operations.
pub trait GridEvents {
    /// Bulk revalidation or import progress, `0.0..=100.0`.
    fn on_progress(&mut self, _percent: f32) {}

    /// Reported once after a multi-cell paste or import.
    fn on_summary(&mut self, _summary: &PasteSummary) {}
}

/// Ignores every notification.
#[derive(Debug, Default)]
pub struct NoopEvents;

impl GridEvents for NoopEvents {}
