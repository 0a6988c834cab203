use super::session::{EditCommit, EditingSession, OpenRequest};
use crate::types::{CellPos, CellValue};

/// Capability to make a cell's own element editable.
pub trait CellSurface {
    fn set_editable(&mut self, pos: CellPos, editable: bool);

    fn set_text(&mut self, pos: CellPos, text: &str);

    fn focus(&mut self, pos: CellPos);
}

#[derive(Debug, Clone)]
struct OpenEdit {
    pos: CellPos,
    original: CellValue,
    buffer: String,
}

/// Fallback editor that edits the cell element in place.
///
/// Text can bleed into neighboring cells while typing, which is why the
/// overlay is preferred when the host can draw one.
#[derive(Debug)]
pub struct InPlaceEditor<S: CellSurface> {
    surface: S,
    edit: Option<OpenEdit>,
}

impl<S: CellSurface> InPlaceEditor<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            edit: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn close(&mut self) -> Option<OpenEdit> {
        let edit = self.edit.take()?;
        self.surface.set_editable(edit.pos, false);
        Some(edit)
    }
}

impl<S: CellSurface> EditingSession for InPlaceEditor<S> {
    fn open(&mut self, request: OpenRequest) {
        self.close();
        let buffer = request.seed_text();
        self.surface.set_editable(request.pos, true);
        self.surface.set_text(request.pos, &buffer);
        self.surface.focus(request.pos);
        self.edit = Some(OpenEdit {
            pos: request.pos,
            original: request.current,
            buffer,
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
        let edit = self.close()?;
        Some(EditCommit {
            pos: edit.pos,
            value: CellValue::from_input(&edit.buffer),
            original: edit.original,
        })
    }

    fn cancel(&mut self) -> Option<(CellPos, CellValue)> {
        let edit = self.close()?;
        // The element still shows the typed text; put the old value back.
        self.surface.set_text(edit.pos, &edit.original.display());
        Some((edit.pos, edit.original))
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

    #[derive(Debug, Default)]
    struct FakeSurface {
        editable: Vec<(CellPos, bool)>,
        text: Option<String>,
        focused: Option<CellPos>,
    }

    impl CellSurface for FakeSurface {
        fn set_editable(&mut self, pos: CellPos, editable: bool) {
            self.editable.push((pos, editable));
        }

        fn set_text(&mut self, _pos: CellPos, text: &str) {
            self.text = Some(text.to_string());
        }

        fn focus(&mut self, pos: CellPos) {
            self.focused = Some(pos);
        }
    }

    #[test]
    fn test_marks_element_editable_and_restores() {
        let pos = CellPos::new(3, 2);
        let mut editor = InPlaceEditor::new(FakeSurface::default());
        editor.open(OpenRequest::new(pos, "before".into()));
        assert_eq!(editor.surface().focused, Some(pos));
        editor.input("after");
        let (cell, original) = editor.cancel().unwrap();
        assert_eq!(cell, pos);
        assert_eq!(original, CellValue::from("before"));
        assert_eq!(editor.surface().text.as_deref(), Some("before"));
        assert_eq!(editor.surface().editable, vec![(pos, true), (pos, false)]);
    }

    #[test]
    fn test_confirm_matches_overlay_contract() {
        let mut editor = InPlaceEditor::new(FakeSurface::default());
        editor.open(OpenRequest::new(CellPos::new(0, 0), "a".into()).with_initial("b"));
        let commit = editor.confirm().unwrap();
        assert_eq!(commit.value, CellValue::from("b"));
        assert_eq!(commit.original, CellValue::from("a"));
        assert!(editor.confirm().is_none());
    }
}
