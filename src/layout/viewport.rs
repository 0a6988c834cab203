//! Viewport state management for scrolling.

use super::GridLayout;

/// Viewport state - represents the visible area of the grid
#[derive(Debug, Clone)]
pub struct Viewport {
    /// Horizontal scroll position in grid coordinates
    pub scroll_x: f32,
    /// Vertical scroll position in body coordinates
    pub scroll_y: f32,
    /// Viewport width in pixels
    pub width: f32,
    /// Viewport height in pixels, header band included
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    /// Create a new viewport with default values
    pub fn new() -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            width: 800.0,
            height: 600.0,
        }
    }

    /// Get visible body row range (inclusive) for the given body height.
    pub fn visible_rows(&self, layout: &GridLayout, body_height: f32) -> (usize, usize) {
        let last_row = layout.row_count.saturating_sub(1);
        let start = layout.row_at_y(self.scroll_y).unwrap_or(last_row);
        // A row counts as visible once any part of it is on screen.
        let end = layout
            .row_at_y(self.scroll_y + body_height - 0.5)
            .unwrap_or(last_row);
        (start.min(last_row), end.min(last_row))
    }

    /// Clamp scroll position to valid range.
    pub fn clamp_scroll(&mut self, layout: &GridLayout) {
        let body_height = (self.height - layout.header_height()).max(0.0);
        let max_x = (layout.total_width() - self.width).max(0.0);
        let max_y = (layout.total_height() - body_height).max(0.0);
        self.scroll_x = self.scroll_x.clamp(0.0, max_x);
        self.scroll_y = self.scroll_y.clamp(0.0, max_y);
    }

    /// Scroll by delta amounts. Returns whether the position changed.
    pub fn scroll_by(
        &mut self,
        delta_x: f32,
        delta_y: f32,
        layout: &GridLayout,
        body_height: f32,
    ) -> bool {
        let max_x = (layout.total_width() - self.width).max(0.0);
        let max_y = (layout.total_height() - body_height).max(0.0);
        let new_x = (self.scroll_x + delta_x).clamp(0.0, max_x);
        let new_y = (self.scroll_y + delta_y).clamp(0.0, max_y);
        let dx = new_x - self.scroll_x;
        let dy = new_y - self.scroll_y;
        if dx.abs() > f32::EPSILON || dy.abs() > f32::EPSILON {
            self.scroll_x = new_x;
            self.scroll_y = new_y;
            return true;
        }
        false
    }

    /// Resize the viewport
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }
}
