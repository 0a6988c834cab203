//! Millisecond clocks for debounce timers and auto-scroll ticks.
//!
//! Timers in this crate are deadline records; the host loop asks for due work
//! (see [`crate::grid::Grid::tick`]). The clock is injectable so tests can
//! drive time by hand.

use std::cell::Cell;

/// Monotonic millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall clock: `performance.now()` in the browser, [`std::time::Instant`] elsewhere.
#[derive(Debug)]
pub struct SystemClock {
    #[cfg(not(target_arch = "wasm32"))]
    origin: std::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            origin: std::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> f64 {
        if let Some(window) = web_sys::window() {
            if let Some(perf) = window.performance() {
                return perf.now();
            }
        }
        js_sys::Date::now()
    }
}

/// Hand-driven clock.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}
