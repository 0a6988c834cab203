//! Keyboard navigation.
//!
//! [`next_cell`] and [`jump_cell`] are pure functions of the current cell and
//! the column set. [`route_key`] turns a raw key event into a
//! [`NavAction`] the grid applies to its selection.
//!
//! Body cells are always navigable. A header cell is navigable only when it
//! sits in the designated editable header row and its column is editable.

use crate::selection::SelectionState;
use crate::types::{CellPos, ColumnDescriptor};

/// Arrow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// What the navigator needs to know about the grid.
#[derive(Debug, Clone, Copy)]
pub struct NavContext<'a> {
    pub columns: &'a [ColumnDescriptor],
    pub total_rows: usize,
    pub total_cols: u32,
    pub editable_header_row: Option<i32>,
}

impl<'a> NavContext<'a> {
    pub fn new(
        columns: &'a [ColumnDescriptor],
        total_rows: usize,
        editable_header_row: Option<i32>,
    ) -> Self {
        Self {
            columns,
            total_rows,
            total_cols: u32::try_from(columns.len()).unwrap_or(u32::MAX),
            editable_header_row,
        }
    }

    fn column(&self, col: u32) -> Option<&'a ColumnDescriptor> {
        self.columns.iter().find(|c| c.col_index == col)
    }

    fn last_row(&self) -> Option<i32> {
        i32::try_from(self.total_rows.checked_sub(1)?).ok()
    }

    /// Whether `pos` can hold the cursor.
    pub fn is_navigable(&self, pos: CellPos) -> bool {
        if pos.col >= self.total_cols {
            return false;
        }
        match pos.body_row() {
            Some(row) => row < self.total_rows,
            None => {
                self.editable_header_row == Some(pos.row)
                    && self.column(pos.col).is_some_and(|c| c.is_editable)
            }
        }
    }

    /// Whether `pos` accepts an edit: navigable, and in an editable column.
    pub fn is_editable(&self, pos: CellPos) -> bool {
        self.is_navigable(pos) && self.column(pos.col).is_some_and(|c| c.is_editable)
    }

    fn first_editable_col(&self) -> u32 {
        (0..self.total_cols)
            .find(|&c| self.column(c).is_some_and(|d| d.is_editable))
            .unwrap_or(0)
    }

    fn last_editable_col(&self) -> u32 {
        (0..self.total_cols)
            .rev()
            .find(|&c| self.column(c).is_some_and(|d| d.is_editable))
            .unwrap_or_else(|| self.total_cols.saturating_sub(1))
    }
}

/// Target of one arrow step (also Tab / Shift+Tab as Right / Left).
///
/// Header rows skip non-navigable cells in the direction of travel. Moving
/// right past the last navigable header cell drops to body row 0 in the
/// current column; moving left or up with nothing navigable holds position.
pub fn next_cell(current: CellPos, direction: Direction, ctx: &NavContext<'_>) -> CellPos {
    if current.is_header() {
        return next_from_header(current, direction, ctx);
    }
    let Some(last_row) = ctx.last_row() else {
        return current;
    };
    let last_col = ctx.total_cols.saturating_sub(1);
    match direction {
        Direction::Up if current.row == 0 => match ctx.editable_header_row {
            Some(header) if ctx.is_navigable(CellPos::new(header, current.col)) => {
                CellPos::new(header, current.col)
            }
            _ => current,
        },
        Direction::Up => CellPos::new(current.row - 1, current.col),
        Direction::Down => CellPos::new((current.row + 1).min(last_row), current.col),
        Direction::Left => CellPos::new(current.row, current.col.saturating_sub(1)),
        Direction::Right => CellPos::new(current.row, (current.col + 1).min(last_col)),
    }
}

fn next_from_header(current: CellPos, direction: Direction, ctx: &NavContext<'_>) -> CellPos {
    let body_top = CellPos::new(0, current.col);
    let to_body = || {
        if ctx.total_rows > 0 {
            body_top
        } else {
            current
        }
    };
    match direction {
        Direction::Down => to_body(),
        Direction::Up => current,
        Direction::Left => (0..current.col)
            .rev()
            .map(|col| CellPos::new(current.row, col))
            .find(|&pos| ctx.is_navigable(pos))
            .unwrap_or(current),
        Direction::Right => (current.col + 1..ctx.total_cols)
            .map(|col| CellPos::new(current.row, col))
            .find(|&pos| ctx.is_navigable(pos))
            .unwrap_or_else(to_body),
    }
}

/// Ctrl+Arrow: jump to the first/last body row or the first/last editable
/// column. In the header row, horizontal jumps stay on navigable header cells.
pub fn jump_cell(current: CellPos, direction: Direction, ctx: &NavContext<'_>) -> CellPos {
    let Some(last_row) = ctx.last_row() else {
        return current;
    };
    match direction {
        Direction::Up => CellPos::new(0, current.col),
        Direction::Down => CellPos::new(last_row, current.col),
        Direction::Left | Direction::Right if current.is_header() => {
            let navigable = |col: &u32| ctx.is_navigable(CellPos::new(current.row, *col));
            let found = if direction == Direction::Left {
                (0..ctx.total_cols).find(navigable)
            } else {
                (0..ctx.total_cols).rev().find(navigable)
            };
            found.map_or(current, |col| CellPos::new(current.row, col))
        }
        Direction::Left => CellPos::new(current.row, ctx.first_editable_col()),
        Direction::Right => CellPos::new(current.row, ctx.last_editable_col()),
    }
}

/// Enter: one row down, or from the header to body row 0. Never sideways.
pub fn enter_target(current: CellPos, ctx: &NavContext<'_>) -> CellPos {
    next_cell(current, Direction::Down, ctx)
}

/// Keys the grid reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Arrow(Direction),
    Tab,
    Enter,
    Escape,
    F2,
    Delete,
    Backspace,
    /// A printable character.
    Char(char),
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "ArrowUp" => Self::Arrow(Direction::Up),
            "ArrowDown" => Self::Arrow(Direction::Down),
            "ArrowLeft" => Self::Arrow(Direction::Left),
            "ArrowRight" => Self::Arrow(Direction::Right),
            "Tab" => Self::Tab,
            "Enter" => Self::Enter,
            "Escape" | "Esc" => Self::Escape,
            "F2" => Self::F2,
            "Delete" => Self::Delete,
            "Backspace" => Self::Backspace,
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) if !ch.is_control() => Self::Char(ch),
                    _ => Self::Other,
                }
            }
        }
    }
}

/// A key press with its modifiers. `ctrl` covers Cmd on macOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            ctrl: false,
            alt: false,
        }
    }

    #[must_use]
    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    #[must_use]
    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn from_dom(key: &str, shift: bool, ctrl: bool, meta: bool, alt: bool) -> Self {
        Self {
            key: Key::from_dom(key),
            shift,
            ctrl: ctrl || meta,
            alt,
        }
    }
}

/// What a key press asks the grid to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavAction {
    /// Not handled; let the host's default behavior run.
    None,
    /// Select a single cell.
    Move(CellPos),
    /// Extend the range from the anchor to the cell.
    Extend(CellPos),
    /// Collapse any range to the selected cell.
    Collapse,
    SelectAll,
    /// Open an editor. `initial` seeds it for type-to-edit.
    BeginEdit {
        pos: CellPos,
        initial: Option<String>,
    },
    Copy,
    Paste,
    /// Clear the selected editable cells.
    Clear,
}

/// Route a key press outside an edit session.
///
/// Returns [`NavAction::None`] while editing; the editor owns the keyboard
/// then.
pub fn route_key(input: KeyInput, state: &SelectionState, ctx: &NavContext<'_>) -> NavAction {
    if state.is_editing {
        return NavAction::None;
    }
    if input.ctrl && !input.alt {
        match input.key {
            Key::Char('a' | 'A') => return NavAction::SelectAll,
            Key::Char('c' | 'C') => return NavAction::Copy,
            Key::Char('v' | 'V') => return NavAction::Paste,
            _ => {}
        }
    }
    let Some(current) = state.selected_cell else {
        return match input.key {
            Key::Arrow(_) | Key::Tab | Key::Enter if ctx.total_rows > 0 && ctx.total_cols > 0 => {
                NavAction::Move(CellPos::new(0, 0))
            }
            _ => NavAction::None,
        };
    };

    match input.key {
        Key::Arrow(direction) => {
            let step = |from| {
                if input.ctrl {
                    jump_cell(from, direction, ctx)
                } else {
                    next_cell(from, direction, ctx)
                }
            };
            if input.shift {
                let end = state.range.map_or(current, |r| r.end);
                NavAction::Extend(step(end))
            } else {
                NavAction::Move(step(current))
            }
        }
        Key::Tab => {
            let direction = if input.shift {
                Direction::Left
            } else {
                Direction::Right
            };
            NavAction::Move(next_cell(current, direction, ctx))
        }
        Key::Enter if input.shift => NavAction::Move(next_cell(current, Direction::Up, ctx)),
        Key::Enter => NavAction::Move(enter_target(current, ctx)),
        Key::Escape => NavAction::Collapse,
        Key::F2 if ctx.is_editable(current) => NavAction::BeginEdit {
            pos: current,
            initial: None,
        },
        Key::Delete | Key::Backspace => NavAction::Clear,
        Key::Char(ch) if !input.ctrl && !input.alt && ctx.is_editable(current) => {
            NavAction::BeginEdit {
                pos: current,
                initial: Some(ch.to_string()),
            }
        }
        _ => NavAction::None,
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
    use crate::types::CellRange;
    use test_case::test_case;

    /// Six columns; only 2 and 5 are editable.
    fn columns() -> Vec<ColumnDescriptor> {
        (0..6)
            .map(|i| {
                let column = ColumnDescriptor::new(i, "shortText", &format!("f{i}"));
                if i == 2 || i == 5 {
                    column
                } else {
                    column.read_only()
                }
            })
            .collect()
    }

    fn pos(row: i32, col: u32) -> CellPos {
        CellPos::new(row, col)
    }

    #[test]
    fn test_header_skip_falls_through_to_body() {
        let cols = columns();
        let ctx = NavContext::new(&cols, 10, Some(-1));
        let first = next_cell(pos(-1, 0), Direction::Right, &ctx);
        assert_eq!(first, pos(-1, 2));
        let second = next_cell(first, Direction::Right, &ctx);
        assert_eq!(second, pos(-1, 5));
        assert_eq!(next_cell(second, Direction::Right, &ctx), pos(0, 5));
    }

    #[test_case(pos(-1, 5), Direction::Left, pos(-1, 2) ; "left skips to previous editable")]
    #[test_case(pos(-1, 2), Direction::Left, pos(-1, 2) ; "left holds with nothing navigable")]
    #[test_case(pos(-1, 2), Direction::Up, pos(-1, 2) ; "up from header holds")]
    #[test_case(pos(-1, 3), Direction::Down, pos(0, 3) ; "down from header lands on body top")]
    #[test_case(pos(0, 2), Direction::Up, pos(-1, 2) ; "up into editable header")]
    #[test_case(pos(0, 3), Direction::Up, pos(0, 3) ; "up into read only header holds")]
    #[test_case(pos(9, 1), Direction::Down, pos(9, 1) ; "down clamps at last row")]
    #[test_case(pos(4, 0), Direction::Left, pos(4, 0) ; "left clamps at first column")]
    #[test_case(pos(4, 5), Direction::Right, pos(4, 5) ; "right clamps at last column")]
    #[test_case(pos(4, 1), Direction::Right, pos(4, 2) ; "body cells are always navigable")]
    fn test_next_cell(from: CellPos, direction: Direction, expected: CellPos) {
        let cols = columns();
        let ctx = NavContext::new(&cols, 10, Some(-1));
        assert_eq!(next_cell(from, direction, &ctx), expected);
    }

    #[test]
    fn test_no_editable_header_row() {
        let cols = columns();
        let ctx = NavContext::new(&cols, 10, None);
        assert!(!ctx.is_navigable(pos(-1, 2)));
        assert_eq!(next_cell(pos(0, 2), Direction::Up, &ctx), pos(0, 2));
    }

    #[test_case(pos(4, 3), Direction::Up, pos(0, 3) ; "to first row")]
    #[test_case(pos(4, 3), Direction::Down, pos(9, 3) ; "to last row")]
    #[test_case(pos(4, 3), Direction::Left, pos(4, 2) ; "to first editable column")]
    #[test_case(pos(4, 0), Direction::Right, pos(4, 5) ; "to last editable column")]
    #[test_case(pos(-1, 5), Direction::Left, pos(-1, 2) ; "header jump stays in header")]
    fn test_jump_cell(from: CellPos, direction: Direction, expected: CellPos) {
        let cols = columns();
        let ctx = NavContext::new(&cols, 10, Some(-1));
        assert_eq!(jump_cell(from, direction, &ctx), expected);
    }

    #[test]
    fn test_enter_never_moves_sideways() {
        let cols = columns();
        let ctx = NavContext::new(&cols, 3, Some(-1));
        assert_eq!(enter_target(pos(-1, 5), &ctx), pos(0, 5));
        assert_eq!(enter_target(pos(0, 4), &ctx), pos(1, 4));
        assert_eq!(enter_target(pos(2, 4), &ctx), pos(2, 4));
    }

    #[test]
    fn test_key_from_dom() {
        assert_eq!(Key::from_dom("ArrowLeft"), Key::Arrow(Direction::Left));
        assert_eq!(Key::from_dom("x"), Key::Char('x'));
        assert_eq!(Key::from_dom("é"), Key::Char('é'));
        assert_eq!(Key::from_dom("Shift"), Key::Other);
        assert!(KeyInput::from_dom("c", false, false, true, false).ctrl);
    }

    fn state_at(cell: CellPos) -> SelectionState {
        SelectionState {
            selected_cell: Some(cell),
            anchor: Some(cell),
            range: Some(CellRange::single(cell)),
            ..SelectionState::default()
        }
    }

    #[test]
    fn test_route_keys() {
        let cols = columns();
        let ctx = NavContext::new(&cols, 10, Some(-1));
        let state = state_at(pos(3, 2));

        assert_eq!(
            route_key(KeyInput::new(Key::Tab), &state, &ctx),
            NavAction::Move(pos(3, 3))
        );
        assert_eq!(
            route_key(KeyInput::new(Key::Tab).shift(), &state, &ctx),
            NavAction::Move(pos(3, 1))
        );
        assert_eq!(
            route_key(KeyInput::new(Key::Arrow(Direction::Down)).shift(), &state, &ctx),
            NavAction::Extend(pos(4, 2))
        );
        assert_eq!(
            route_key(KeyInput::new(Key::Char('a')).ctrl(), &state, &ctx),
            NavAction::SelectAll
        );
        assert_eq!(
            route_key(KeyInput::new(Key::Char('7')), &state, &ctx),
            NavAction::BeginEdit {
                pos: pos(3, 2),
                initial: Some("7".into())
            }
        );
    }

    #[test]
    fn test_route_refuses_edit_on_read_only() {
        let cols = columns();
        let ctx = NavContext::new(&cols, 10, Some(-1));
        let state = state_at(pos(3, 1));
        assert_eq!(route_key(KeyInput::new(Key::F2), &state, &ctx), NavAction::None);
        assert_eq!(
            route_key(KeyInput::new(Key::Char('x')), &state, &ctx),
            NavAction::None
        );
    }

    #[test]
    fn test_route_ignored_while_editing() {
        let cols = columns();
        let ctx = NavContext::new(&cols, 10, Some(-1));
        let mut state = state_at(pos(3, 2));
        state.is_editing = true;
        assert_eq!(
            route_key(KeyInput::new(Key::Arrow(Direction::Up)), &state, &ctx),
            NavAction::None
        );
    }
}
