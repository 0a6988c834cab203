//! DOM `<input>` placed over the cell being edited.
//!
//! Text keys go to the element natively; the JS side forwards its `input`
//! and `blur` events and the navigation keys (Enter/Escape/Tab) to
//! [`super::WebGrid`].

use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, HtmlInputElement};

use crate::adapter::Rect;

pub(crate) struct InputOverlay {
    input: Option<HtmlInputElement>,
}

impl InputOverlay {
    pub(crate) fn new() -> Self {
        InputOverlay { input: None }
    }

    /// Show over `rect` (CSS pixels relative to `container`) with `value`
    /// selected.
    pub(crate) fn show(&mut self, rect: Rect, value: &str, container: Option<&HtmlElement>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Some(input) = self.get_or_create_input(&document, container) else {
            return;
        };
        let style = input.style();
        let _ = style.set_property("display", "block");
        let _ = style.set_property("left", &format!("{}px", rect.x));
        let _ = style.set_property("top", &format!("{}px", rect.y));
        let _ = style.set_property("width", &format!("{}px", rect.width.max(24.0)));
        let _ = style.set_property("height", &format!("{}px", rect.height.max(16.0)));

        input.set_value(value);
        let _ = input.focus();
        input.select();
    }

    /// Replace the text without moving focus, e.g. for the date-time template.
    pub(crate) fn set_value(&self, value: &str) {
        if let Some(ref input) = self.input {
            input.set_value(value);
        }
    }

    pub(crate) fn hide(&mut self) {
        if let Some(ref input) = self.input {
            let _ = input.style().set_property("display", "none");
            let _ = input.blur();
        }
    }

    pub(crate) fn value(&self) -> Option<String> {
        self.input.as_ref().map(HtmlInputElement::value)
    }

    fn get_or_create_input(
        &mut self,
        document: &Document,
        container: Option<&HtmlElement>,
    ) -> Option<&HtmlInputElement> {
        if self.input.is_none() {
            let input = document
                .create_element("input")
                .ok()?
                .dyn_into::<HtmlInputElement>()
                .ok()?;
            input.set_type("text");
            let style = input.style();
            for (name, value) in [
                ("position", "absolute"),
                ("z-index", "1000"),
                ("box-sizing", "border-box"),
                ("border", "2px solid #4285f4"),
                ("outline", "none"),
                ("padding", "0 4px"),
                ("font-family", "inherit"),
                ("font-size", "13px"),
                ("background", "#fff"),
                ("display", "none"),
            ] {
                let _ = style.set_property(name, value);
            }
            if let Some(c) = container {
                let _ = c.append_child(&input);
            } else if let Some(body) = document.body() {
                let _ = body.append_child(&input);
            }
            self.input = Some(input);
        }
        self.input.as_ref()
    }
}

impl Drop for InputOverlay {
    fn drop(&mut self) {
        if let Some(ref input) = self.input {
            if let Some(parent) = input.parent_node() {
                let _ = parent.remove_child(input);
            }
        }
    }
}
