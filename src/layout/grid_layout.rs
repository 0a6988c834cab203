//! Pre-computed layout data for a grid.
//!
//! Column positions are computed once; rows share one height so row lookup is
//! arithmetic. Header rows form a fixed band above the scrolling body.

use crate::adapter::{GeometryProvider, Rect};
use crate::types::CellPos;

use super::Viewport;

/// Default column width in pixels.
pub const DEFAULT_COL_WIDTH: f32 = 96.0;

/// Default row height in pixels.
pub const DEFAULT_ROW_HEIGHT: f32 = 24.0;

/// Pre-computed layout data for a grid
#[derive(Debug, Clone)]
pub struct GridLayout {
    /// Cumulative column positions (`col_positions[i]` = x of column i's left edge)
    pub col_positions: Vec<f32>,
    /// Height shared by header and body rows
    pub row_height: f32,
    /// Number of body rows
    pub row_count: usize,
    /// Number of header rows above the body
    pub header_rows: u32,
}

impl GridLayout {
    pub fn new(col_widths: &[f32], row_count: usize, row_height: f32, header_rows: u32) -> Self {
        let mut col_positions = Vec::with_capacity(col_widths.len() + 1);
        let mut x = 0.0f32;
        col_positions.push(x);
        for w in col_widths {
            x += w.max(0.0);
            col_positions.push(x);
        }
        Self {
            col_positions,
            row_height: row_height.max(1.0),
            row_count,
            header_rows,
        }
    }

    /// Uniform columns.
    pub fn uniform(cols: u32, rows: usize) -> Self {
        let widths = vec![DEFAULT_COL_WIDTH; usize::try_from(cols).unwrap_or(0)];
        Self::new(&widths, rows, DEFAULT_ROW_HEIGHT, 1)
    }

    pub fn col_count(&self) -> u32 {
        u32::try_from(self.col_positions.len().saturating_sub(1)).unwrap_or(u32::MAX)
    }

    /// Height of the fixed header band.
    pub fn header_height(&self) -> f32 {
        self.header_rows as f32 * self.row_height
    }

    /// Find column at x position (binary search)
    pub fn col_at_x(&self, x: f32) -> Option<u32> {
        if x < 0.0 || x >= self.total_width() {
            return None;
        }
        match self
            .col_positions
            .binary_search_by(|pos| pos.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal))
        {
            Ok(i) => u32::try_from(i).ok(),
            Err(i) => u32::try_from(i.saturating_sub(1)).ok(),
        }
    }

    /// Find body row at a body-relative y position
    pub fn row_at_y(&self, y: f32) -> Option<usize> {
        if y < 0.0 {
            return None;
        }
        let row = (y / self.row_height).floor();
        if row.is_finite() && row < self.row_count as f32 {
            // Bounded by row_count above.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Some(row as usize)
        } else {
            None
        }
    }

    pub fn col_x(&self, col: u32) -> Option<f32> {
        self.col_positions.get(usize::try_from(col).ok()?).copied()
    }

    pub fn col_width(&self, col: u32) -> Option<f32> {
        let i = usize::try_from(col).ok()?;
        Some(self.col_positions.get(i + 1)? - self.col_positions.get(i)?)
    }

    /// Top of a body row in body coordinates
    pub fn row_y(&self, row: usize) -> f32 {
        row as f32 * self.row_height
    }

    /// Get total width of the grid
    pub fn total_width(&self) -> f32 {
        self.col_positions.last().copied().unwrap_or(0.0)
    }

    /// Get total height of the body
    pub fn total_height(&self) -> f32 {
        self.row_count as f32 * self.row_height
    }
}

/// [`GeometryProvider`] over a [`GridLayout`] and a [`Viewport`].
///
/// Only rows inside the viewport are "materialized": `cell_rect` returns
/// `None` for anything scrolled out of view, as a virtualized renderer would.
#[derive(Debug, Clone)]
pub struct GridGeometry {
    pub layout: GridLayout,
    pub viewport: Viewport,
}

impl GridGeometry {
    pub fn new(layout: GridLayout, width: f32, height: f32) -> Self {
        let mut viewport = Viewport::new();
        viewport.resize(width, height);
        Self { layout, viewport }
    }

    /// Height available to body rows.
    fn body_height(&self) -> f32 {
        (self.viewport.height - self.layout.header_height()).max(0.0)
    }

    fn header_row_at(&self, y: f32) -> Option<i32> {
        let band = (y / self.layout.row_height).floor();
        let header_rows = i32::try_from(self.layout.header_rows).ok()?;
        if !(0.0..header_rows as f32).contains(&band) {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        Some(band as i32 - header_rows)
    }
}

impl GeometryProvider for GridGeometry {
    fn ensure_visible(&mut self, pos: CellPos) {
        if let (Some(x), Some(w)) = (self.layout.col_x(pos.col), self.layout.col_width(pos.col)) {
            if x < self.viewport.scroll_x {
                self.viewport.scroll_x = x;
            } else if x + w > self.viewport.scroll_x + self.viewport.width {
                self.viewport.scroll_x = x + w - self.viewport.width;
            }
        }
        if let Some(row) = pos.body_row() {
            let y = self.layout.row_y(row);
            let h = self.layout.row_height;
            let body_height = self.body_height();
            if y < self.viewport.scroll_y {
                self.viewport.scroll_y = y;
            } else if y + h > self.viewport.scroll_y + body_height {
                self.viewport.scroll_y = y + h - body_height;
            }
        }
        self.viewport.clamp_scroll(&self.layout);
    }

    fn cell_rect(&self, pos: CellPos) -> Option<Rect> {
        let x = self.layout.col_x(pos.col)? - self.viewport.scroll_x;
        let width = self.layout.col_width(pos.col)?;
        let header_height = self.layout.header_height();
        let y = match pos.body_row() {
            Some(row) => {
                if row >= self.layout.row_count {
                    return None;
                }
                let (first, last) = self.viewport.visible_rows(&self.layout, self.body_height());
                if row < first || row > last {
                    return None;
                }
                header_height + self.layout.row_y(row) - self.viewport.scroll_y
            }
            None => {
                let from_top = i32::try_from(self.layout.header_rows).ok()? + pos.row;
                if from_top < 0 {
                    return None;
                }
                from_top as f32 * self.layout.row_height
            }
        };
        Some(Rect::new(x, y, width, self.layout.row_height))
    }

    fn cell_at_point(&self, x: f32, y: f32) -> Option<CellPos> {
        if !self.viewport_rect().contains(x, y) {
            return None;
        }
        let col = self.layout.col_at_x(x + self.viewport.scroll_x)?;
        let header_height = self.layout.header_height();
        if y < header_height {
            return Some(CellPos::new(self.header_row_at(y)?, col));
        }
        let row = self
            .layout
            .row_at_y(y - header_height + self.viewport.scroll_y)?;
        Some(CellPos::new(i32::try_from(row).ok()?, col))
    }

    fn viewport_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.viewport.width, self.viewport.height)
    }

    fn scroll_by(&mut self, dx: f32, dy: f32) -> bool {
        self.viewport.scroll_by(dx, dy, &self.layout, self.body_height())
    }

    fn grid_resized(&mut self, rows: usize, cols: u32) {
        self.layout.row_count = rows;
        if cols != self.layout.col_count() {
            let widths = vec![DEFAULT_COL_WIDTH; usize::try_from(cols).unwrap_or(0)];
            self.layout = GridLayout::new(
                &widths,
                rows,
                self.layout.row_height,
                self.layout.header_rows,
            );
        }
        self.viewport.clamp_scroll(&self.layout);
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

    fn geometry() -> GridGeometry {
        // 10 columns x 100px, 1000 rows x 20px, one header row; 500 x 220 viewport
        let layout = GridLayout::new(&[100.0; 10], 1000, 20.0, 1);
        GridGeometry::new(layout, 500.0, 220.0)
    }

    #[test]
    fn test_hit_test_header_and_body() {
        let g = geometry();
        assert_eq!(g.cell_at_point(150.0, 10.0), Some(CellPos::new(-1, 1)));
        assert_eq!(g.cell_at_point(150.0, 25.0), Some(CellPos::new(0, 1)));
        assert_eq!(g.cell_at_point(450.0, 219.0), Some(CellPos::new(9, 4)));
        assert_eq!(g.cell_at_point(-1.0, 50.0), None);
    }

    #[test]
    fn test_offscreen_rows_are_not_materialized() {
        let mut g = geometry();
        assert!(g.cell_rect(CellPos::new(500, 0)).is_none());
        g.ensure_visible(CellPos::new(500, 0));
        let rect = g.cell_rect(CellPos::new(500, 0)).unwrap();
        assert!(rect.y >= 20.0 && rect.bottom() <= 220.0);
    }

    #[test]
    fn test_scroll_limits() {
        let mut g = geometry();
        assert!(!g.scroll_by(0.0, -10.0));
        assert!(g.scroll_by(0.0, 40.0));
        assert_eq!(g.cell_at_point(10.0, 25.0), Some(CellPos::new(2, 0)));
        assert!(g.scroll_by(0.0, 1.0e9));
        assert!(!g.scroll_by(0.0, 10.0));
    }
}
