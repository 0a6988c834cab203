//! `WebGrid` - the grid exported to JavaScript.
//!
//! Wraps one [`Grid`] over an in-memory [`TableData`], a DOM input overlay
//! for editing, and a `setTimeout` loop that drives [`Grid::tick`] whenever a
//! debounce timer, a drag auto-scroll or a bulk revalidation is pending.
//!
//! ```javascript
//! import init, { WebGrid } from 'cellgrid';
//! await init();
//! const grid = new WebGrid(columns, rows, { debounceMs: 200 }, callbacks, container);
//! grid.set_render_callback(() => redraw(grid.selection(), grid.errors()));
//! ```

mod bridge;
mod input;

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

use crate::adapter::CellStore;
use crate::clock::{Clock, SystemClock};
use crate::config::GridConfig;
use crate::grid::{Grid, Modifiers, PointerButton};
use crate::navigation::{Key, KeyInput};
use crate::table::TableData;
use crate::types::{CellPos, ColumnDescriptor, Row};
use crate::validation::RevalidationStatus;
use bridge::{
    read_clipboard, to_js, JsCallbacks, JsCommitSink, JsEvents, JsGeometry, JsRules, WebClipboard,
};
use input::InputOverlay;

struct SharedState {
    grid: Grid<TableData>,
    overlay: InputOverlay,
    /// Cell the overlay is currently shown over.
    overlay_cell: Option<CellPos>,
    container: Option<HtmlElement>,
    render_callback: Option<Function>,
    tick_timer: Option<i32>,
    tick_closure: Option<Closure<dyn FnMut()>>,
    clock: SystemClock,
}

/// One interactive grid bound to the page.
#[wasm_bindgen]
pub struct WebGrid {
    state: Rc<RefCell<SharedState>>,
}

fn invoke_render_callback(callback: Option<Function>) {
    if let Some(callback) = callback {
        let _ = callback.call0(&JsValue::NULL);
    }
}

impl WebGrid {
    /// Show, refresh or hide the input overlay to match the editor.
    fn sync_overlay(s: &mut SharedState) {
        match s.grid.editor().cell() {
            Some(pos) => {
                let text = s.grid.editor().text().unwrap_or_default();
                if s.overlay_cell != Some(pos) {
                    let rect = s.grid.geometry().cell_rect(pos).unwrap_or_default();
                    s.overlay.show(rect, &text, s.container.as_ref());
                    s.overlay_cell = Some(pos);
                } else if s.overlay.value().as_deref() != Some(text.as_str()) {
                    s.overlay.set_value(&text);
                }
            }
            None => {
                if s.overlay_cell.take().is_some() {
                    s.overlay.hide();
                }
            }
        }
    }

    /// Bookkeeping after any state change: overlay, timers, redraw.
    fn after_change(state: &Rc<RefCell<SharedState>>) {
        let callback = {
            let mut s = state.borrow_mut();
            Self::sync_overlay(&mut s);
            s.render_callback.clone()
        };
        Self::schedule_tick(state);
        invoke_render_callback(callback);
    }

    fn schedule_tick(state: &Rc<RefCell<SharedState>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let mut s = state.borrow_mut();
        if let Some(timer_id) = s.tick_timer.take() {
            window.clear_timeout_with_handle(timer_id);
        }
        let delay = if s.grid.validation().is_revalidating() {
            Some(0.0)
        } else {
            let now = s.clock.now_ms();
            s.grid.next_deadline().map(|at| (at - now).max(0.0))
        };
        let Some(delay) = delay else {
            return;
        };
        if s.tick_closure.is_none() {
            let weak_state = Rc::downgrade(state);
            let closure = Closure::wrap(Box::new(move || {
                if let Some(state) = weak_state.upgrade() {
                    WebGrid::handle_tick(&state);
                }
            }) as Box<dyn FnMut()>);
            s.tick_closure = Some(closure);
        }
        let Some(callback) = s.tick_closure.as_ref() else {
            return;
        };
        #[allow(clippy::cast_possible_truncation)]
        let delay = delay.ceil().min(f64::from(i32::MAX)) as i32;
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            delay,
        ) {
            Ok(id) => s.tick_timer = Some(id),
            Err(_) => s.tick_timer = None,
        }
    }

    fn handle_tick(state: &Rc<RefCell<SharedState>>) {
        let callback = {
            let mut s = state.borrow_mut();
            s.tick_timer = None;
            let report = s.grid.tick();
            Self::sync_overlay(&mut s);
            let changed =
                report.validations > 0 || report.scrolled || report.revalidated.is_some();
            if changed {
                s.render_callback.clone()
            } else {
                None
            }
        };
        Self::schedule_tick(state);
        invoke_render_callback(callback);
    }

    fn with_grid<T>(&self, f: impl FnOnce(&mut Grid<TableData>) -> T) -> T {
        let result = f(&mut self.state.borrow_mut().grid);
        Self::after_change(&self.state);
        result
    }
}

#[wasm_bindgen]
impl WebGrid {
    /// `columns` and `rows` are plain JSON-shaped arrays, `config` a partial
    /// `GridConfig` (or `undefined`), `callbacks` the host hooks.
    #[wasm_bindgen(constructor)]
    pub fn new(
        columns: JsValue,
        rows: JsValue,
        config: JsValue,
        callbacks: JsValue,
        container: Option<HtmlElement>,
    ) -> Result<WebGrid, JsValue> {
        console_error_panic_hook::set_once();

        let columns: Vec<ColumnDescriptor> = serde_wasm_bindgen::from_value(columns)?;
        let rows: Vec<Row> = serde_wasm_bindgen::from_value(rows)?;
        let config: GridConfig = if config.is_undefined() || config.is_null() {
            GridConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        let callbacks = JsCallbacks::new(callbacks);

        let mut builder = Grid::builder(TableData::new(columns, rows))
            .config(config)
            .rules(JsRules(callbacks.clone()))
            .commit_sink(JsCommitSink(callbacks.clone()))
            .events(JsEvents(callbacks.clone()))
            .clipboard(WebClipboard::default());
        if JsGeometry::available(&callbacks) {
            builder = builder.geometry(JsGeometry(callbacks));
        }
        let grid = builder.build()?;

        Ok(WebGrid {
            state: Rc::new(RefCell::new(SharedState {
                grid,
                overlay: InputOverlay::new(),
                overlay_cell: None,
                container,
                render_callback: None,
                tick_timer: None,
                tick_closure: None,
                clock: SystemClock::new(),
            })),
        })
    }

    #[wasm_bindgen]
    pub fn set_render_callback(&mut self, callback: Option<Function>) {
        self.state.borrow_mut().render_callback = callback;
    }

    /// Forward a `keydown`. Returns `true` when the grid handled it and the
    /// host should `preventDefault()`.
    ///
    /// While a text editor is open, typing and caret keys stay with the
    /// native input; only Enter, Tab and Escape are taken.
    #[wasm_bindgen]
    pub fn key_down(
        &mut self,
        key: &str,
        shift: bool,
        ctrl: bool,
        meta: bool,
        alt: bool,
    ) -> Result<bool, JsValue> {
        let input = KeyInput::from_dom(key, shift, ctrl, meta, alt);
        {
            let s = self.state.borrow();
            let editor = s.grid.editor();
            let native_text = editor.cell().is_some_and(|pos| {
                !s.grid
                    .store()
                    .column_at(pos.col)
                    .is_some_and(ColumnDescriptor::is_date_time)
            });
            let editor_key = matches!(input.key, Key::Enter | Key::Tab | Key::Escape);
            if native_text && !editor_key {
                return Ok(false);
            }
        }
        Ok(self.with_grid(|grid| grid.handle_key(input))?)
    }

    /// The overlay's text changed.
    #[wasm_bindgen]
    pub fn edit_input(&mut self, text: &str) -> bool {
        self.with_grid(|grid| grid.input_edit(text))
    }

    /// The overlay lost focus.
    #[wasm_bindgen]
    pub fn edit_blur(&mut self) -> Result<(), JsValue> {
        // Hiding the overlay blurs it while the state is borrowed; that blur is ours.
        let Ok(mut s) = self.state.try_borrow_mut() else {
            return Ok(());
        };
        let result = s.grid.blur_edit();
        drop(s);
        Self::after_change(&self.state);
        result?;
        Ok(())
    }

    /// `button` follows `MouseEvent.button`: 2 is the secondary button.
    #[wasm_bindgen]
    pub fn pointer_down(
        &mut self,
        x: f32,
        y: f32,
        button: i16,
        shift: bool,
        ctrl: bool,
    ) -> Result<bool, JsValue> {
        let button = if button == 2 {
            PointerButton::Secondary
        } else {
            PointerButton::Primary
        };
        let modifiers = Modifiers { shift, ctrl };
        Ok(self.with_grid(|grid| grid.pointer_down(x, y, button, modifiers))?)
    }

    #[wasm_bindgen]
    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        self.with_grid(|grid| grid.pointer_move(x, y))
    }

    #[wasm_bindgen]
    pub fn pointer_up(&mut self) -> bool {
        self.with_grid(Grid::pointer_up)
    }

    #[wasm_bindgen]
    pub fn double_click(&mut self, x: f32, y: f32) -> Result<bool, JsValue> {
        Ok(self.with_grid(|grid| grid.double_click(x, y))?)
    }

    #[wasm_bindgen]
    pub fn row_header_click(&mut self, row: i32, shift: bool, ctrl: bool) -> bool {
        self.with_grid(|grid| grid.row_header_click(row, Modifiers { shift, ctrl }))
    }

    /// Copy the selection to `navigator.clipboard`. Returns the text.
    #[wasm_bindgen]
    pub fn copy(&mut self) -> Result<String, JsValue> {
        Ok(self.with_grid(Grid::copy)?)
    }

    /// Read `navigator.clipboard` and paste at the selected cell. Resolves
    /// to the paste summary.
    #[wasm_bindgen]
    pub fn paste(&self) -> js_sys::Promise {
        let state = Rc::clone(&self.state);
        wasm_bindgen_futures::future_to_promise(async move {
            let text = read_clipboard().await?;
            let summary = state.borrow_mut().grid.paste_text(&text);
            WebGrid::after_change(&state);
            Ok(to_js(&summary?))
        })
    }

    /// Paste text the host already has, e.g. from a `paste` event.
    #[wasm_bindgen]
    pub fn paste_text(&mut self, text: &str) -> Result<JsValue, JsValue> {
        let summary = self.with_grid(|grid| grid.paste_text(text))?;
        Ok(to_js(&summary))
    }

    /// Start revalidating every editable cell. Returns the flat error map
    /// when the pass finished synchronously, `null` when it continues in
    /// the background (progress goes to `onProgress`).
    #[wasm_bindgen]
    pub fn revalidate(&mut self) -> JsValue {
        self.with_grid(|grid| match grid.start_revalidation() {
            RevalidationStatus::Completed(_) => to_js(&grid.errors().to_flat_map()),
            RevalidationStatus::Pending => JsValue::NULL,
        })
    }

    #[wasm_bindgen]
    pub fn insert_rows(&mut self, at: u32, count: u32) -> u32 {
        let at = self.with_grid(|grid| grid.insert_rows(at as usize, count as usize));
        u32::try_from(at).unwrap_or(u32::MAX)
    }

    #[wasm_bindgen]
    pub fn delete_rows(&mut self, indices: Vec<u32>) -> Vec<u32> {
        let indices: Vec<usize> = indices.into_iter().map(|i| i as usize).collect();
        self.with_grid(|grid| grid.delete_rows(&indices))
            .into_iter()
            .filter_map(|i| u32::try_from(i).ok())
            .collect()
    }

    /// Replace the columns. Returns how many errors no longer had a cell.
    #[wasm_bindgen]
    pub fn set_columns(&mut self, columns: JsValue) -> Result<u32, JsValue> {
        let columns: Vec<ColumnDescriptor> = serde_wasm_bindgen::from_value(columns)?;
        let dropped = self.with_grid(|grid| grid.set_columns(columns));
        Ok(u32::try_from(dropped).unwrap_or(u32::MAX))
    }

    /// Current `SelectionState`.
    #[wasm_bindgen]
    pub fn selection(&self) -> JsValue {
        to_js(self.state.borrow().grid.selection_state())
    }

    /// Errors as a flat `{ "<row>_<column key>": message }` map.
    #[wasm_bindgen]
    pub fn errors(&self) -> JsValue {
        to_js(&self.state.borrow().grid.errors().to_flat_map())
    }

    #[wasm_bindgen]
    pub fn error_at(&self, row: i32, col: u32) -> Option<String> {
        let s = self.state.borrow();
        s.grid
            .error_at(CellPos::new(row, col))
            .map(|e| e.message.clone())
    }

    #[wasm_bindgen]
    pub fn cell_value(&self, row: i32, col: u32) -> JsValue {
        let s = self.state.borrow();
        s.grid
            .cell_value(CellPos::new(row, col))
            .map_or(JsValue::NULL, |v| to_js(&v))
    }

    /// Current rows, including edits.
    #[wasm_bindgen]
    pub fn rows(&self) -> JsValue {
        to_js(self.state.borrow().grid.store().rows())
    }
}

impl Drop for WebGrid {
    fn drop(&mut self) {
        let Ok(mut s) = self.state.try_borrow_mut() else {
            return;
        };
        if let (Some(window), Some(timer_id)) = (web_sys::window(), s.tick_timer.take()) {
            window.clear_timeout_with_handle(timer_id);
        }
        s.tick_closure = None;
    }
}
