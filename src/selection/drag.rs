//! Edge auto-scroll while drag-selecting.
//!
//! Off-screen rows are not materialized, so the drag target cannot be
//! tracked by element. Each tick scrolls the viewport and re-resolves the
//! cell under the last known pointer position instead.

use crate::adapter::{GeometryProvider, Rect};
use crate::config::GridConfig;
use crate::types::CellPos;

/// Fixed-interval edge scroller for drag selection.
#[derive(Debug, Clone)]
pub struct AutoScroller {
    edge_px: f32,
    interval_ms: f64,
    max_step_px: f32,
    pointer: Option<(f32, f32)>,
    velocity: (f32, f32),
    next_tick_at: Option<f64>,
}

impl AutoScroller {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            edge_px: config.autoscroll_edge_px,
            interval_ms: f64::from(config.autoscroll_interval_ms),
            max_step_px: config.autoscroll_max_step_px,
            pointer: None,
            velocity: (0.0, 0.0),
            next_tick_at: None,
        }
    }

    /// Whether the ticker is armed.
    pub fn is_running(&self) -> bool {
        self.next_tick_at.is_some()
    }

    /// Deadline of the next tick, if armed.
    pub fn next_deadline(&self) -> Option<f64> {
        self.next_tick_at
    }

    /// Record the pointer position during a drag and arm or disarm the
    /// ticker depending on how close it is to the viewport edge.
    pub fn pointer_moved(&mut self, x: f32, y: f32, viewport: Rect, now_ms: f64) {
        self.pointer = Some((x, y));
        self.velocity = (
            self.axis_step(x, viewport.x, viewport.right()),
            self.axis_step(y, viewport.y, viewport.bottom()),
        );
        if self.velocity == (0.0, 0.0) {
            self.next_tick_at = None;
        } else if self.next_tick_at.is_none() {
            self.next_tick_at = Some(now_ms + self.interval_ms);
        }
    }

    /// Run one tick if due. Returns the cell now under the pointer when the
    /// viewport actually moved.
    pub fn tick(&mut self, now_ms: f64, geometry: &mut dyn GeometryProvider) -> Option<CellPos> {
        let due = self.next_tick_at?;
        if now_ms < due {
            return None;
        }
        let (dx, dy) = self.velocity;
        if !geometry.scroll_by(dx, dy) {
            self.stop();
            return None;
        }
        self.next_tick_at = Some(now_ms + self.interval_ms);

        let (x, y) = self.pointer?;
        let view = geometry.viewport_rect();
        // Pointers outside the grid resolve to the nearest edge cell.
        let x = x.clamp(view.x, (view.right() - 1.0).max(view.x));
        let y = y.clamp(view.y, (view.bottom() - 1.0).max(view.y));
        geometry.cell_at_point(x, y)
    }

    /// Disarm the ticker. Called on pointer-up.
    pub fn stop(&mut self) {
        self.next_tick_at = None;
        self.velocity = (0.0, 0.0);
        self.pointer = None;
    }

    /// Signed scroll step for one axis: grows linearly from zero at the edge
    /// band's inner boundary to `max_step_px` at (or past) the edge.
    fn axis_step(&self, pos: f32, low: f32, high: f32) -> f32 {
        let band = self.edge_px;
        if pos < low + band {
            let depth = ((low + band - pos) / band).min(1.0);
            -(self.max_step_px * depth).max(1.0)
        } else if pos > high - band {
            let depth = ((pos - (high - band)) / band).min(1.0);
            (self.max_step_px * depth).max(1.0)
        } else {
            0.0
        }
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
    use crate::layout::{GridGeometry, GridLayout};

    fn geometry() -> GridGeometry {
        GridGeometry::new(GridLayout::uniform(4, 200), 400.0, 240.0)
    }

    #[test]
    fn test_idle_in_middle() {
        let mut scroller = AutoScroller::new(&GridConfig::default());
        let view = Rect::new(0.0, 0.0, 400.0, 240.0);
        scroller.pointer_moved(200.0, 120.0, view, 0.0);
        assert!(!scroller.is_running());
    }

    #[test]
    fn test_scrolls_near_bottom_and_stops_on_release() {
        let mut geo = geometry();
        let view = geo.viewport_rect();
        let mut scroller = AutoScroller::new(&GridConfig::default());
        scroller.pointer_moved(50.0, view.bottom() - 2.0, view, 0.0);
        assert!(scroller.is_running());

        assert!(scroller.tick(10.0, &mut geo).is_none(), "not yet due");
        let target = scroller.tick(50.0, &mut geo).unwrap();
        assert!(target.row > 0);
        assert_eq!(scroller.next_deadline(), Some(100.0));

        scroller.stop();
        assert!(!scroller.is_running());
        assert!(scroller.tick(500.0, &mut geo).is_none());
    }

    #[test]
    fn test_stops_at_scroll_limit() {
        let mut geo = geometry();
        let view = geo.viewport_rect();
        let mut scroller = AutoScroller::new(&GridConfig::default());
        // Already at the top: scrolling up cannot move.
        scroller.pointer_moved(50.0, view.y + 1.0, view, 0.0);
        assert!(scroller.is_running());
        assert!(scroller.tick(50.0, &mut geo).is_none());
        assert!(!scroller.is_running());
    }
}
