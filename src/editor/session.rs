use crate::adapter::Rect;
use crate::types::{CellPos, CellValue};

/// Everything an editor needs to open on a cell.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenRequest {
    pub pos: CellPos,
    /// The cell's value before the edit.
    pub current: CellValue,
    /// Seed text for type-to-edit; `None` starts from `current`.
    pub initial: Option<String>,
    /// On-screen rect of the cell, once it is materialized.
    pub rect: Option<Rect>,
}

impl OpenRequest {
    pub fn new(pos: CellPos, current: CellValue) -> Self {
        Self {
            pos,
            current,
            initial: None,
            rect: None,
        }
    }

    #[must_use]
    pub fn with_initial(mut self, initial: impl Into<String>) -> Self {
        self.initial = Some(initial.into());
        self
    }

    #[must_use]
    pub fn with_rect(mut self, rect: Option<Rect>) -> Self {
        self.rect = rect;
        self
    }

    /// Text the editing surface starts with.
    pub fn seed_text(&self) -> String {
        self.initial
            .clone()
            .unwrap_or_else(|| self.current.display())
    }
}

/// A confirmed edit ready for the commit path.
#[derive(Debug, Clone, PartialEq)]
pub struct EditCommit {
    pub pos: CellPos,
    pub value: CellValue,
    /// Value before the edit opened, even for type-to-edit.
    pub original: CellValue,
}

impl EditCommit {
    pub fn is_changed(&self) -> bool {
        self.value != self.original
    }
}

/// Shared contract of every editing strategy.
///
/// `confirm` reads only the session's own buffer and closes it, so a second
/// call (say, a blur racing an Enter) returns `None`.
pub trait EditingSession {
    fn open(&mut self, request: OpenRequest);

    fn is_open(&self) -> bool;

    /// Cell being edited.
    fn cell(&self) -> Option<CellPos>;

    /// Replace the buffer with the surface's current text.
    fn input(&mut self, text: &str);

    /// Text the surface should show.
    fn text(&self) -> String;

    /// Value that would be committed now.
    fn value(&self) -> CellValue;

    /// Close and hand back the buffered value.
    fn confirm(&mut self) -> Option<EditCommit>;

    /// Close without committing. Returns the cell and its pre-edit value.
    fn cancel(&mut self) -> Option<(CellPos, CellValue)>;

    /// Focus left the surface.
    fn on_blur(&mut self) -> Option<EditCommit> {
        self.confirm()
    }

    fn type_char(&mut self, ch: char) {
        let mut text = self.text();
        text.push(ch);
        self.input(&text);
    }

    fn backspace(&mut self) {
        let mut text = self.text();
        text.pop();
        self.input(&text);
    }
}
