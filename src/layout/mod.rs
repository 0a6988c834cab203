//! Native geometry for hosts without a DOM.
//!
//! This module handles:
//! - Pre-computing column positions and uniform row positions
//! - Managing viewport state (scroll position, visible range)
//! - Binary search for cell lookup at screen coordinates
//! - A [`GeometryProvider`](crate::adapter::GeometryProvider) over both
//!
//! The browser adapter measures real elements instead; this implementation
//! backs tests, benches and terminal hosts.

mod grid_layout;
mod viewport;

pub use grid_layout::{GridGeometry, GridLayout, DEFAULT_COL_WIDTH, DEFAULT_ROW_HEIGHT};
pub use viewport::Viewport;
