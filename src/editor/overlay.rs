use super::session::{EditCommit, EditingSession, OpenRequest};
use crate::adapter::Rect;
use crate::types::{CellPos, CellValue};

#[derive(Debug, Clone)]
struct OpenEdit {
    pos: CellPos,
    original: CellValue,
    buffer: String,
    rect: Option<Rect>,
}

/// Floating editor drawn over the target cell.
///
/// Pure data: the host reads [`OverlayEditor::rect`] and
/// [`EditingSession::text`] to draw its input element and feeds keystrokes
/// back through [`EditingSession::input`].
#[derive(Debug, Clone, Default)]
pub struct OverlayEditor {
    edit: Option<OpenEdit>,
}

impl OverlayEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the overlay should be drawn.
    pub fn rect(&self) -> Option<Rect> {
        self.edit.as_ref().and_then(|e| e.rect)
    }

    /// Follow the cell after a scroll.
    pub fn reposition(&mut self, rect: Option<Rect>) {
        if let Some(edit) = self.edit.as_mut() {
            edit.rect = rect;
        }
    }
}

impl EditingSession for OverlayEditor {
    fn open(&mut self, request: OpenRequest) {
        let buffer = request.seed_text();
        self.edit = Some(OpenEdit {
            pos: request.pos,
            original: request.current,
            buffer,
            rect: request.rect,
        });
    }

    fn is_open(&self) -> bool {
        self.edit.is_some()
    }

    fn cell(&self) -> Option<CellPos> {
        self.edit.as_ref().map(|e| e.pos)
    }

    fn input(&mut self, text: &str) {
        if let Some(edit) = self.edit.as_mut() {
            edit.buffer = text.to_string();
        }
    }

    fn text(&self) -> String {
        self.edit
            .as_ref()
            .map(|e| e.buffer.clone())
            .unwrap_or_default()
    }

    fn value(&self) -> CellValue {
        CellValue::from_input(&self.text())
    }

    fn confirm(&mut self) -> Option<EditCommit> {
        let edit = self.edit.take()?;
        Some(EditCommit {
            pos: edit.pos,
            value: CellValue::from_input(&edit.buffer),
            original: edit.original,
        })
    }

    fn cancel(&mut self) -> Option<(CellPos, CellValue)> {
        self.edit.take().map(|e| (e.pos, e.original))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn test_type_to_edit_keeps_original() {
        let mut editor = OverlayEditor::new();
        editor.open(OpenRequest::new(CellPos::new(2, 1), "old".into()).with_initial("n"));
        assert_eq!(editor.text(), "n");
        editor.type_char('e');
        editor.type_char('w');
        let commit = editor.confirm().unwrap();
        assert_eq!(commit.value, CellValue::from("new"));
        assert_eq!(commit.original, CellValue::from("old"));
        assert!(commit.is_changed());
    }

    #[test]
    fn test_confirm_is_idempotent() {
        let mut editor = OverlayEditor::new();
        editor.open(OpenRequest::new(CellPos::new(0, 0), "same".into()));
        let first = editor.confirm().unwrap();
        assert!(!first.is_changed());
        assert!(editor.confirm().is_none());
        assert!(editor.on_blur().is_none());
    }

    #[test]
    fn test_cancel_returns_original() {
        let mut editor = OverlayEditor::new();
        editor.open(OpenRequest::new(CellPos::new(1, 1), CellValue::Number(3.0)));
        editor.input("nope");
        assert_eq!(
            editor.cancel(),
            Some((CellPos::new(1, 1), CellValue::Number(3.0)))
        );
        assert!(!editor.is_open());
    }

    #[test]
    fn test_blank_input_clears() {
        let mut editor = OverlayEditor::new();
        editor.open(OpenRequest::new(CellPos::new(0, 0), "x".into()));
        editor.backspace();
        assert_eq!(editor.confirm().unwrap().value, CellValue::Null);
    }
}
