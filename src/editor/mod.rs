//! Cell editing.
//!
//! Editing strategies implement [`EditingSession`]:
//! - [`OverlayEditor`]: a floating input over the cell (preferred)
//! - [`InPlaceEditor`]: the cell's own element made editable
//! - [`DateTimeEditor`]: a digit buffer for `dateTime` columns
//!
//! [`EditController`] picks the session for a column and turns keys pressed
//! inside the editor into commit / cancel / move decisions.

mod datetime;
mod inplace;
mod overlay;
mod session;

pub use datetime::{
    format_date_time, parse_digits, render_digits, DateTimeEditor, DATE_TIME_DIGITS,
};
pub use inplace::{CellSurface, InPlaceEditor};
pub use overlay::OverlayEditor;
pub use session::{EditCommit, EditingSession, OpenRequest};

use crate::navigation::{Direction, Key, KeyInput};
use crate::types::{CellPos, CellValue, ColumnDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Active {
    Text,
    DateTime,
}

/// Result of a key pressed while editing.
#[derive(Debug, Clone, PartialEq)]
pub enum EditKeyOutcome {
    /// Not an editor key.
    Ignored,
    /// The buffer changed.
    Updated,
    /// The session closed with a value; the cursor should then move.
    Committed {
        commit: EditCommit,
        advance: Direction,
    },
    /// The session closed without a value.
    Cancelled { pos: CellPos, original: CellValue },
}

/// Owns the editing sessions and routes keys to the active one.
pub struct EditController {
    text: Box<dyn EditingSession>,
    date_time: DateTimeEditor,
    active: Option<Active>,
    column: Option<ColumnDescriptor>,
}

impl std::fmt::Debug for EditController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditController")
            .field("active", &self.active)
            .field("cell", &self.cell())
            .finish()
    }
}

impl Default for EditController {
    fn default() -> Self {
        Self::new(Box::new(OverlayEditor::new()))
    }
}

impl EditController {
    /// `text` edits every column that is not `dateTime`.
    pub fn new(text: Box<dyn EditingSession>) -> Self {
        Self {
            text,
            date_time: DateTimeEditor::new(),
            active: None,
            column: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn session(&self) -> Option<&dyn EditingSession> {
        match self.active? {
            Active::Text => Some(self.text.as_ref()),
            Active::DateTime => Some(&self.date_time),
        }
    }

    fn session_mut(&mut self) -> Option<&mut dyn EditingSession> {
        match self.active? {
            Active::Text => Some(self.text.as_mut()),
            Active::DateTime => Some(&mut self.date_time),
        }
    }

    pub fn cell(&self) -> Option<CellPos> {
        self.session().and_then(|s| s.cell())
    }

    /// Column of the open session, as it was when the session opened.
    pub fn column(&self) -> Option<&ColumnDescriptor> {
        self.active.and(self.column.as_ref())
    }

    pub fn text(&self) -> Option<String> {
        self.session().map(|s| s.text())
    }

    pub fn value(&self) -> Option<CellValue> {
        self.session().map(|s| s.value())
    }

    /// Open the session suited to `column`. Any open session is cancelled
    /// first.
    pub fn open(&mut self, request: OpenRequest, column: &ColumnDescriptor) {
        self.cancel();
        let active = if column.is_date_time() {
            Active::DateTime
        } else {
            Active::Text
        };
        self.active = Some(active);
        self.column = Some(column.clone());
        if let Some(session) = self.session_mut() {
            session.open(request);
        }
    }

    pub fn input(&mut self, text: &str) -> bool {
        match self.session_mut() {
            Some(session) => {
                session.input(text);
                true
            }
            None => false,
        }
    }

    pub fn confirm(&mut self) -> Option<EditCommit> {
        let commit = self.session_mut()?.confirm();
        self.active = None;
        commit
    }

    pub fn cancel(&mut self) -> Option<(CellPos, CellValue)> {
        let cancelled = self.session_mut()?.cancel();
        self.active = None;
        cancelled
    }

    /// Focus left the editor. `Some` when the session auto-saved.
    pub fn blur(&mut self) -> Option<EditCommit> {
        let commit = self.session_mut()?.on_blur();
        self.active = None;
        commit
    }

    /// Enter commits and moves down (Shift+Enter up), Tab commits and moves
    /// right (Shift+Tab left), Escape cancels.
    pub fn handle_key(&mut self, input: KeyInput) -> EditKeyOutcome {
        let Some(session) = self.session_mut() else {
            return EditKeyOutcome::Ignored;
        };
        let advance = match input.key {
            Key::Enter if input.shift => Direction::Up,
            Key::Enter => Direction::Down,
            Key::Tab if input.shift => Direction::Left,
            Key::Tab => Direction::Right,
            Key::Escape => {
                return match self.cancel() {
                    Some((pos, original)) => EditKeyOutcome::Cancelled { pos, original },
                    None => EditKeyOutcome::Ignored,
                };
            }
            Key::Backspace => {
                session.backspace();
                return EditKeyOutcome::Updated;
            }
            Key::Char(ch) if !input.ctrl && !input.alt => {
                session.type_char(ch);
                return EditKeyOutcome::Updated;
            }
            _ => return EditKeyOutcome::Ignored,
        };
        match self.confirm() {
            Some(commit) => EditKeyOutcome::Committed { commit, advance },
            None => EditKeyOutcome::Ignored,
        }
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

    fn text_column() -> ColumnDescriptor {
        ColumnDescriptor::new(0, "shortText", "name")
    }

    fn date_column() -> ColumnDescriptor {
        ColumnDescriptor::new(1, crate::types::DATE_TIME_TYPE, "visit")
    }

    #[test]
    fn test_enter_commits_and_moves_down() {
        let mut editor = EditController::default();
        editor.open(OpenRequest::new(CellPos::new(0, 0), "a".into()), &text_column());
        assert_eq!(
            editor.handle_key(KeyInput::new(Key::Char('b'))),
            EditKeyOutcome::Updated
        );
        match editor.handle_key(KeyInput::new(Key::Enter)) {
            EditKeyOutcome::Committed { commit, advance } => {
                assert_eq!(commit.value, CellValue::from("ab"));
                assert_eq!(advance, Direction::Down);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!editor.is_open());
    }

    #[test]
    fn test_shift_tab_moves_left_and_escape_cancels() {
        let mut editor = EditController::default();
        editor.open(OpenRequest::new(CellPos::new(0, 0), "a".into()), &text_column());
        match editor.handle_key(KeyInput::new(Key::Tab).shift()) {
            EditKeyOutcome::Committed { advance, .. } => assert_eq!(advance, Direction::Left),
            other => panic!("unexpected {other:?}"),
        }
        editor.open(OpenRequest::new(CellPos::new(1, 0), "keep".into()), &text_column());
        assert_eq!(
            editor.handle_key(KeyInput::new(Key::Escape)),
            EditKeyOutcome::Cancelled {
                pos: CellPos::new(1, 0),
                original: "keep".into()
            }
        );
    }

    #[test]
    fn test_date_time_column_uses_digit_editor() {
        let mut editor = EditController::default();
        editor.open(
            OpenRequest::new(CellPos::new(0, 1), CellValue::Null).with_initial("2"),
            &date_column(),
        );
        assert_eq!(editor.text().as_deref(), Some("2---/--/-- --:--"));
        editor.handle_key(KeyInput::new(Key::Char('x')));
        assert_eq!(editor.text().as_deref(), Some("2---/--/-- --:--"));
        assert!(editor.blur().is_none(), "incomplete value is not auto-saved");
    }

    #[test]
    fn test_keys_ignored_when_closed() {
        let mut editor = EditController::default();
        assert_eq!(
            editor.handle_key(KeyInput::new(Key::Enter)),
            EditKeyOutcome::Ignored
        );
    }
}
