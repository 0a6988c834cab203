//! Collaborators backed by JS callbacks.
//!
//! The host passes one plain object; every entry is optional:
//!
//! ```javascript
//! {
//!   validate(value, columnType) { return true | "message" | { valid, message } },
//!   commitWrite(cell, oldValue, newValue, column) {},
//!   onProgress(percent) {},
//!   onSummary({ total, errors, rate }) {},
//!   // geometry (all four, or none to use the built-in uniform layout)
//!   cellAtPoint(x, y) { return { row, col } | null },
//!   cellRect(row, col) { return { x, y, width, height } | null },
//!   ensureVisible(row, col) {},
//!   viewportRect() { return { x, y, width, height } },
//!   scrollBy(dx, dy) { return true },
//!   gridResized(rows, cols) {},
//! }
//! ```
//!
//! Callbacks run while the grid is borrowed and must not call back into it.

use js_sys::{Array, Function, Object, Reflect};
use serde::Serialize;
use tracing::warn;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::adapter::{CellIdentity, CommitSink, GeometryProvider, GridEvents, Rect, ValidationRules};
use crate::clipboard::ClipboardBackend;
use crate::error::{GridError, Result};
use crate::types::{CellPos, CellValue, ColumnDescriptor, PasteSummary, ValidationOutcome};

/// Serialize for JS with `null` for missing values and plain objects for maps.
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}

fn js_error(e: &JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{e:?}"))
}

/// The host's callback object.
#[derive(Clone)]
pub(crate) struct JsCallbacks {
    target: Object,
}

impl JsCallbacks {
    pub(crate) fn new(target: JsValue) -> Self {
        Self {
            target: target.dyn_into::<Object>().unwrap_or_else(|_| Object::new()),
        }
    }

    fn function(&self, name: &str) -> Option<Function> {
        Reflect::get(&self.target, &JsValue::from_str(name))
            .ok()?
            .dyn_into::<Function>()
            .ok()
    }

    pub(crate) fn has(&self, name: &str) -> bool {
        self.function(name).is_some()
    }

    /// `Ok(None)` when the callback is absent.
    fn call(&self, name: &str, args: &[JsValue]) -> std::result::Result<Option<JsValue>, JsValue> {
        let Some(f) = self.function(name) else {
            return Ok(None);
        };
        let args: Array = args.iter().collect();
        f.apply(&JsValue::NULL, &args).map(Some)
    }

    /// Call and log a throw; returns the value when there is one.
    fn call_logged(&self, name: &str, args: &[JsValue]) -> Option<JsValue> {
        match self.call(name, args) {
            Ok(value) => value.filter(|v| !v.is_undefined() && !v.is_null()),
            Err(e) => {
                warn!(callback = name, error = %js_error(&e), "callback threw");
                None
            }
        }
    }
}

fn pos_args(pos: CellPos) -> [JsValue; 2] {
    [JsValue::from(pos.row), JsValue::from(pos.col)]
}

/// `validate(value, columnType)`. No callback accepts everything.
pub(crate) struct JsRules(pub(crate) JsCallbacks);

impl ValidationRules for JsRules {
    fn validate(&self, value: &CellValue, column_type: &str) -> ValidationOutcome {
        let args = [to_js(value), JsValue::from_str(column_type)];
        match self.0.call("validate", &args) {
            Ok(Some(result)) => outcome_from_js(result),
            Ok(None) => ValidationOutcome::ok(),
            Err(e) => {
                warn!(column_type, error = %js_error(&e), "validate callback threw");
                ValidationOutcome::invalid("Validation failed")
            }
        }
    }
}

/// `true`/`undefined` pass, `false` fails, a string is the failure message,
/// an object is a full `{ valid, message }` outcome.
fn outcome_from_js(result: JsValue) -> ValidationOutcome {
    if result.is_undefined() || result.is_null() {
        return ValidationOutcome::ok();
    }
    if let Some(valid) = result.as_bool() {
        return if valid {
            ValidationOutcome::ok()
        } else {
            ValidationOutcome::invalid("Invalid value")
        };
    }
    if let Some(message) = result.as_string() {
        return ValidationOutcome::invalid(message);
    }
    serde_wasm_bindgen::from_value(result)
        .unwrap_or_else(|_| ValidationOutcome::invalid("Invalid value"))
}

/// `commitWrite(cell, oldValue, newValue, column)`.
pub(crate) struct JsCommitSink(pub(crate) JsCallbacks);

impl CommitSink for JsCommitSink {
    fn commit_write(
        &mut self,
        cell: &CellIdentity,
        old: &CellValue,
        new: &CellValue,
        column: &ColumnDescriptor,
    ) -> Result<()> {
        let args = [to_js(cell), to_js(old), to_js(new), to_js(column)];
        self.0
            .call("commitWrite", &args)
            .map(|_| ())
            .map_err(|e| GridError::Commit(js_error(&e)))
    }
}

/// `onProgress(percent)` and `onSummary(summary)`.
pub(crate) struct JsEvents(pub(crate) JsCallbacks);

impl GridEvents for JsEvents {
    fn on_progress(&mut self, percent: f32) {
        self.0.call_logged("onProgress", &[JsValue::from(percent)]);
    }

    fn on_summary(&mut self, summary: &PasteSummary) {
        self.0.call_logged("onSummary", &[to_js(summary)]);
    }
}

/// Geometry answered by the host's renderer.
pub(crate) struct JsGeometry(pub(crate) JsCallbacks);

impl JsGeometry {
    pub(crate) fn available(callbacks: &JsCallbacks) -> bool {
        ["cellAtPoint", "cellRect", "ensureVisible", "viewportRect"]
            .iter()
            .all(|name| callbacks.has(name))
    }
}

impl GeometryProvider for JsGeometry {
    fn ensure_visible(&mut self, pos: CellPos) {
        self.0.call_logged("ensureVisible", &pos_args(pos));
    }

    fn cell_rect(&self, pos: CellPos) -> Option<Rect> {
        let value = self.0.call_logged("cellRect", &pos_args(pos))?;
        serde_wasm_bindgen::from_value(value).ok()
    }

    fn cell_at_point(&self, x: f32, y: f32) -> Option<CellPos> {
        let value = self
            .0
            .call_logged("cellAtPoint", &[JsValue::from(x), JsValue::from(y)])?;
        serde_wasm_bindgen::from_value(value).ok()
    }

    fn viewport_rect(&self) -> Rect {
        self.0
            .call_logged("viewportRect", &[])
            .and_then(|v| serde_wasm_bindgen::from_value(v).ok())
            .unwrap_or_default()
    }

    fn scroll_by(&mut self, dx: f32, dy: f32) -> bool {
        self.0
            .call_logged("scrollBy", &[JsValue::from(dx), JsValue::from(dy)])
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn grid_resized(&mut self, rows: usize, cols: u32) {
        let rows = u32::try_from(rows).unwrap_or(u32::MAX);
        self.0
            .call_logged("gridResized", &[JsValue::from(rows), JsValue::from(cols)]);
    }
}

/// `navigator.clipboard`. Writes are fire-and-forget; reads are async and
/// go through [`read_clipboard`], so the synchronous read only returns
/// what this page copied last.
#[derive(Default)]
pub(crate) struct WebClipboard {
    last: Option<String>,
}

impl ClipboardBackend for WebClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        self.last = Some(text.to_string());
        let window = web_sys::window().ok_or_else(|| GridError::Clipboard("no window".into()))?;
        let promise = window.navigator().clipboard().write_text(text);
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                warn!(error = %js_error(&e), "clipboard write rejected");
            }
        });
        Ok(())
    }

    fn read_text(&mut self) -> Result<String> {
        self.last
            .clone()
            .ok_or_else(|| GridError::Clipboard("clipboard is empty".into()))
    }
}

/// Read the system clipboard.
pub(crate) async fn read_clipboard() -> std::result::Result<String, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let text = JsFuture::from(window.navigator().clipboard().read_text()).await?;
    text.as_string()
        .ok_or_else(|| JsValue::from_str("clipboard did not return text"))
}
