use serde::{Deserialize, Serialize};

/// Positional cell coordinate.
///
/// `row` is negative for header rows (`-1` is the header row closest to the
/// body). Only valid until the next structural mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPos {
    pub row: i32,
    pub col: u32,
}

impl CellPos {
    pub const fn new(row: i32, col: u32) -> Self {
        Self { row, col }
    }

    pub fn is_header(&self) -> bool {
        self.row < 0
    }

    /// Body row index, `None` for header rows.
    pub fn body_row(&self) -> Option<usize> {
        usize::try_from(self.row).ok()
    }
}

/// Rectangular range between an anchor (`start`) and a moving end (`end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellPos,
    pub end: CellPos,
}

impl CellRange {
    pub fn new(start: CellPos, end: CellPos) -> Self {
        Self { start, end }
    }

    pub fn single(pos: CellPos) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Top-left and bottom-right corners.
    pub fn bounds(&self) -> (CellPos, CellPos) {
        (
            CellPos::new(self.start.row.min(self.end.row), self.start.col.min(self.end.col)),
            CellPos::new(self.start.row.max(self.end.row), self.start.col.max(self.end.col)),
        )
    }

    pub fn contains(&self, pos: CellPos) -> bool {
        let (min, max) = self.bounds();
        pos.row >= min.row && pos.row <= max.row && pos.col >= min.col && pos.col <= max.col
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// Number of rows and columns covered.
    pub fn size(&self) -> (u32, u32) {
        let (min, max) = self.bounds();
        (max.row.abs_diff(min.row) + 1, max.col - min.col + 1)
    }
}
