//! Selection state machine.
//!
//! [`SelectionSystem`] is the single source of truth for what is selected,
//! dragged or edited. It has no side effects beyond its own state; pointer
//! and keyboard handlers call into it and render from [`SelectionState`].
//!
//! While a cell is being edited every selection-mutating operation is
//! refused; only [`SelectionSystem::stop_editing`] leaves that state.

mod drag;

pub use drag::AutoScroller;

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::types::{CellPos, CellRange};

/// Derived mode of the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Nothing selected yet.
    Empty,
    /// One cell selected.
    Idle,
    /// A rectangular range of more than one cell.
    Range,
    /// Disjoint rows or cells picked with a modifier click.
    Individual,
    /// Pointer drag in progress.
    Dragging,
    /// A cell is being edited.
    Editing,
}

/// Everything the renderer needs to draw the selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub selected_cell: Option<CellPos>,
    pub anchor: Option<CellPos>,
    pub range: Option<CellRange>,
    pub individual_rows: BTreeSet<i32>,
    pub individual_cells: BTreeSet<CellPos>,
    pub is_dragging: bool,
    pub is_editing: bool,
    pub editing_cell: Option<CellPos>,
}

/// Selection state plus the grid bounds it is clamped to.
#[derive(Debug, Clone)]
pub struct SelectionSystem {
    state: SelectionState,
    rows: usize,
    cols: u32,
    header_rows: u32,
}

impl SelectionSystem {
    /// `header_rows` header rows sit above `rows` body rows.
    pub fn new(rows: usize, cols: u32, header_rows: u32) -> Self {
        Self {
            state: SelectionState::default(),
            rows,
            cols,
            header_rows,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn selected_cell(&self) -> Option<CellPos> {
        self.state.selected_cell
    }

    pub fn is_editing(&self) -> bool {
        self.state.is_editing
    }

    pub fn is_dragging(&self) -> bool {
        self.state.is_dragging
    }

    pub fn mode(&self) -> SelectionMode {
        let s = &self.state;
        if s.is_editing {
            SelectionMode::Editing
        } else if s.is_dragging {
            SelectionMode::Dragging
        } else if !s.individual_rows.is_empty() || !s.individual_cells.is_empty() {
            SelectionMode::Individual
        } else if s.range.is_some_and(|r| !r.is_single()) {
            SelectionMode::Range
        } else if s.selected_cell.is_some() {
            SelectionMode::Idle
        } else {
            SelectionMode::Empty
        }
    }

    pub fn in_bounds(&self, pos: CellPos) -> bool {
        let min_row = -i64::from(self.header_rows);
        let row = i64::from(pos.row);
        let rows = i64::try_from(self.rows).unwrap_or(i64::MAX);
        pos.col < self.cols && row >= min_row && row < rows
    }

    /// Select a single cell, clearing ranges and individual picks.
    pub fn select_cell(&mut self, pos: CellPos) -> bool {
        if self.state.is_editing || !self.in_bounds(pos) {
            return false;
        }
        self.collapse_to(pos);
        true
    }

    /// Extend from the anchor to `target`. The active cell stays at the anchor.
    pub fn extend_selection(&mut self, target: CellPos) -> bool {
        if self.state.is_editing || !self.in_bounds(target) {
            return false;
        }
        let anchor = self
            .state
            .anchor
            .or(self.state.selected_cell)
            .unwrap_or(target);
        let s = &mut self.state;
        s.anchor = Some(anchor);
        s.selected_cell = Some(anchor);
        s.range = Some(CellRange::new(anchor, target));
        s.individual_rows.clear();
        s.individual_cells.clear();
        true
    }

    /// Select every cell of one body row.
    pub fn select_row(&mut self, row: i32) -> bool {
        self.select_row_range(row, row)
    }

    /// Select every cell of the rows between `from` and `to` (inclusive).
    pub fn select_row_range(&mut self, from: i32, to: i32) -> bool {
        if self.state.is_editing || self.cols == 0 {
            return false;
        }
        let start = CellPos::new(from, 0);
        let end = CellPos::new(to, self.cols - 1);
        if !self.in_bounds(start) || !self.in_bounds(end) {
            return false;
        }
        let s = &mut self.state;
        s.anchor = Some(start);
        s.selected_cell = Some(start);
        s.range = Some(CellRange::new(start, end));
        s.individual_rows.clear();
        s.individual_cells.clear();
        true
    }

    /// Select every body cell.
    pub fn select_all(&mut self) -> bool {
        match i32::try_from(self.rows) {
            Ok(rows) if rows > 0 => self.select_row_range(0, rows - 1),
            _ => false,
        }
    }

    /// Add or remove a row from the individual multi-selection.
    ///
    /// Refused while a multi-cell range is selected. The first toggle seeds
    /// the set with the anchor's row so the anchor is kept.
    pub fn toggle_individual_row(&mut self, row: i32) -> bool {
        if self.state.is_editing
            || self.mode() == SelectionMode::Range
            || !self.in_bounds(CellPos::new(row, 0))
        {
            return false;
        }
        let anchor = self.state.anchor;
        let s = &mut self.state;
        if s.individual_rows.is_empty() {
            if let Some(anchor) = anchor.filter(|a| a.row != row) {
                s.individual_rows.insert(anchor.row);
            }
        }
        let col = s.selected_cell.map_or(0, |c| c.col);
        let active = if s.individual_rows.remove(&row) {
            // Removing a row keeps the active cell unless it sat on that row.
            match s.selected_cell {
                Some(cell) if cell.row != row => None,
                _ => s.individual_rows.first().map(|&r| CellPos::new(r, col)),
            }
        } else {
            s.individual_rows.insert(row);
            Some(CellPos::new(row, col))
        };
        if let Some(pos) = active {
            s.selected_cell = Some(pos);
            s.range = Some(CellRange::single(pos));
        }
        true
    }

    /// Add or remove a cell from the individual multi-selection.
    pub fn toggle_individual_cell(&mut self, pos: CellPos) -> bool {
        if self.state.is_editing || self.mode() == SelectionMode::Range || !self.in_bounds(pos) {
            return false;
        }
        let anchor = self.state.anchor;
        let s = &mut self.state;
        if s.individual_cells.is_empty() {
            if let Some(anchor) = anchor.filter(|&a| a != pos) {
                s.individual_cells.insert(anchor);
            }
        }
        let active = if s.individual_cells.remove(&pos) {
            match s.selected_cell {
                Some(cell) if cell != pos => None,
                _ => s.individual_cells.first().copied(),
            }
        } else {
            s.individual_cells.insert(pos);
            Some(pos)
        };
        if let Some(active) = active {
            s.selected_cell = Some(active);
            s.range = Some(CellRange::single(active));
        }
        true
    }

    /// Pointer down on a cell: select it and start a drag.
    pub fn start_drag(&mut self, pos: CellPos) -> bool {
        if !self.select_cell(pos) {
            return false;
        }
        self.state.is_dragging = true;
        true
    }

    /// Pointer moved over `pos` during a drag. Out-of-bounds targets are clamped.
    pub fn update_drag_selection(&mut self, pos: CellPos) -> bool {
        if !self.state.is_dragging || self.state.is_editing {
            return false;
        }
        let Some(anchor) = self.state.anchor else {
            return false;
        };
        let target = self.clamp(pos);
        let range = CellRange::new(anchor, target);
        if self.state.range == Some(range) {
            return false;
        }
        self.state.range = Some(range);
        true
    }

    pub fn end_drag_selection(&mut self) -> bool {
        std::mem::replace(&mut self.state.is_dragging, false)
    }

    /// Right click. A click inside the current selection keeps it, so context
    /// actions apply to all of it.
    pub fn context_click(&mut self, pos: CellPos) -> bool {
        if self.state.is_editing || self.contains(pos) {
            return false;
        }
        self.select_cell(pos)
    }

    /// Whether `pos` is part of the current selection.
    pub fn contains(&self, pos: CellPos) -> bool {
        let s = &self.state;
        s.selected_cell == Some(pos)
            || s.range.is_some_and(|r| r.contains(pos))
            || s.individual_rows.contains(&pos.row)
            || s.individual_cells.contains(&pos)
    }

    /// Enter edit mode on `pos`, which becomes the single selected cell.
    pub fn start_editing(&mut self, pos: CellPos) -> bool {
        if self.state.is_editing || !self.in_bounds(pos) {
            return false;
        }
        self.collapse_to(pos);
        self.state.is_dragging = false;
        self.state.is_editing = true;
        self.state.editing_cell = Some(pos);
        true
    }

    /// Leave edit mode. Returns the cell that was being edited.
    pub fn stop_editing(&mut self, commit: bool) -> Option<CellPos> {
        if !self.state.is_editing {
            return None;
        }
        self.state.is_editing = false;
        let cell = self.state.editing_cell.take();
        debug!(?cell, commit, "edit session closed");
        cell
    }

    /// Top-left and bottom-right of the rectangular selection.
    pub fn bounds(&self) -> Option<(CellPos, CellPos)> {
        self.state
            .range
            .map(|r| r.bounds())
            .or_else(|| self.state.selected_cell.map(|c| (c, c)))
    }

    /// Every selected position, row-major.
    pub fn selected_positions(&self) -> Vec<CellPos> {
        let s = &self.state;
        if !s.individual_cells.is_empty() {
            return s.individual_cells.iter().copied().collect();
        }
        if !s.individual_rows.is_empty() {
            return s
                .individual_rows
                .iter()
                .flat_map(|&row| (0..self.cols).map(move |col| CellPos::new(row, col)))
                .collect();
        }
        let Some((min, max)) = self.bounds() else {
            return Vec::new();
        };
        (min.row..=max.row)
            .flat_map(|row| (min.col..=max.col).map(move |col| CellPos::new(row, col)))
            .collect()
    }

    /// Apply new grid bounds after a structural change, clamping the selection.
    pub fn clamp_to(&mut self, rows: usize, cols: u32) {
        self.rows = rows;
        self.cols = cols;
        let s = &self.state;
        let selected = s.selected_cell.map(|p| self.clamp(p));
        let anchor = s.anchor.map(|p| self.clamp(p));
        let range = s
            .range
            .map(|r| CellRange::new(self.clamp(r.start), self.clamp(r.end)));
        let s = &mut self.state;
        s.selected_cell = selected;
        s.anchor = anchor;
        s.range = range;
        s.individual_rows.clear();
        s.individual_cells.clear();
        if rows == 0 && cols == 0 {
            *s = SelectionState::default();
        }
    }

    fn collapse_to(&mut self, pos: CellPos) {
        let s = &mut self.state;
        s.selected_cell = Some(pos);
        s.anchor = Some(pos);
        s.range = Some(CellRange::single(pos));
        s.individual_rows.clear();
        s.individual_cells.clear();
    }

    fn clamp(&self, pos: CellPos) -> CellPos {
        let max_row = i32::try_from(self.rows).unwrap_or(i32::MAX).saturating_sub(1);
        let min_row = -i32::try_from(self.header_rows).unwrap_or(0);
        CellPos::new(
            pos.row.clamp(min_row, max_row.max(min_row)),
            pos.col.min(self.cols.saturating_sub(1)),
        )
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

    fn pos(row: i32, col: u32) -> CellPos {
        CellPos::new(row, col)
    }

    fn system() -> SelectionSystem {
        SelectionSystem::new(10, 5, 1)
    }

    /// A range with both endpoints set always contains the selected cell.
    fn assert_range_contains_selected(sel: &SelectionSystem) {
        let s = sel.state();
        if let (Some(range), Some(cell)) = (s.range, s.selected_cell) {
            assert!(range.contains(cell), "{range:?} does not contain {cell:?}");
        }
    }

    #[test]
    fn test_select_and_extend() {
        let mut sel = system();
        assert_eq!(sel.mode(), SelectionMode::Empty);
        assert!(sel.select_cell(pos(2, 1)));
        assert_eq!(sel.mode(), SelectionMode::Idle);
        assert!(sel.extend_selection(pos(4, 3)));
        assert_eq!(sel.mode(), SelectionMode::Range);
        assert_eq!(sel.bounds(), Some((pos(2, 1), pos(4, 3))));
        assert_range_contains_selected(&sel);
        assert!(!sel.select_cell(pos(10, 0)));
        assert!(!sel.select_cell(pos(-2, 0)));
    }

    #[test]
    fn test_editing_blocks_selection_changes() {
        let mut sel = system();
        sel.select_cell(pos(1, 1));
        assert!(sel.start_editing(pos(1, 2)));
        assert!(!sel.select_cell(pos(3, 3)));
        assert!(!sel.extend_selection(pos(3, 3)));
        assert!(!sel.toggle_individual_row(4));
        assert!(!sel.context_click(pos(5, 0)));
        assert!(!sel.start_editing(pos(2, 2)));
        assert_eq!(sel.selected_cell(), Some(pos(1, 2)));
        assert_eq!(sel.stop_editing(true), Some(pos(1, 2)));
        assert!(sel.select_cell(pos(3, 3)));
    }

    #[test]
    fn test_first_toggle_keeps_anchor() {
        let mut sel = system();
        sel.select_cell(pos(2, 0));
        assert!(sel.toggle_individual_row(5));
        assert_eq!(
            sel.state().individual_rows.iter().copied().collect::<Vec<_>>(),
            vec![2, 5]
        );
        assert!(sel.toggle_individual_row(2));
        assert_eq!(
            sel.state().individual_rows.iter().copied().collect::<Vec<_>>(),
            vec![5]
        );
        assert_eq!(sel.mode(), SelectionMode::Individual);
        assert_eq!(sel.selected_cell(), Some(pos(5, 0)));
        assert_range_contains_selected(&sel);
    }

    #[test]
    fn test_toggling_off_keeps_active_cell_on_a_selected_row() {
        let mut sel = system();
        sel.select_cell(pos(1, 2));
        sel.toggle_individual_row(4);
        sel.toggle_individual_row(7);
        assert_eq!(sel.selected_cell(), Some(pos(7, 2)));

        assert!(sel.toggle_individual_row(4));
        assert_eq!(sel.selected_cell(), Some(pos(7, 2)), "row 4 went, row 7 stays active");

        assert!(sel.toggle_individual_row(7));
        assert_eq!(sel.selected_cell(), Some(pos(1, 2)), "falls back to a remaining row");
        assert!(sel.state().individual_rows.contains(&1));
        assert_range_contains_selected(&sel);
    }

    #[test]
    fn test_toggling_off_a_cell_keeps_active_cell() {
        let mut sel = system();
        sel.select_cell(pos(0, 0));
        sel.toggle_individual_cell(pos(3, 3));
        sel.toggle_individual_cell(pos(4, 1));
        assert!(sel.toggle_individual_cell(pos(3, 3)));
        assert_eq!(sel.selected_cell(), Some(pos(4, 1)));
        assert_eq!(sel.selected_positions(), vec![pos(0, 0), pos(4, 1)]);
    }

    #[test]
    fn test_toggle_refused_in_range_mode() {
        let mut sel = system();
        sel.select_cell(pos(0, 0));
        sel.extend_selection(pos(2, 2));
        assert!(!sel.toggle_individual_cell(pos(5, 4)));
        assert_eq!(sel.mode(), SelectionMode::Range);
    }

    #[test]
    fn test_toggle_cells() {
        let mut sel = system();
        sel.select_cell(pos(0, 0));
        sel.toggle_individual_cell(pos(3, 3));
        sel.toggle_individual_cell(pos(4, 1));
        assert_eq!(
            sel.selected_positions(),
            vec![pos(0, 0), pos(3, 3), pos(4, 1)]
        );
    }

    #[test]
    fn test_drag_clamps_and_ends() {
        let mut sel = system();
        assert!(sel.start_drag(pos(1, 1)));
        assert_eq!(sel.mode(), SelectionMode::Dragging);
        assert!(sel.update_drag_selection(pos(50, 9)));
        assert_eq!(sel.bounds(), Some((pos(1, 1), pos(9, 4))));
        assert!(!sel.update_drag_selection(pos(50, 9)));
        assert!(sel.end_drag_selection());
        assert!(!sel.update_drag_selection(pos(2, 2)));
        assert_eq!(sel.mode(), SelectionMode::Range);
        assert_range_contains_selected(&sel);
    }

    #[test]
    fn test_context_click_keeps_multi_selection() {
        let mut sel = system();
        sel.select_cell(pos(1, 1));
        sel.extend_selection(pos(3, 3));
        assert!(!sel.context_click(pos(2, 2)));
        assert_eq!(sel.bounds(), Some((pos(1, 1), pos(3, 3))));
        assert!(sel.context_click(pos(8, 0)));
        assert_eq!(sel.bounds(), Some((pos(8, 0), pos(8, 0))));
    }

    #[test]
    fn test_row_selection() {
        let mut sel = system();
        assert!(sel.select_row_range(2, 4));
        assert_eq!(sel.bounds(), Some((pos(2, 0), pos(4, 4))));
        assert_eq!(sel.selected_positions().len(), 15);
        assert!(sel.select_all());
        assert_eq!(sel.bounds(), Some((pos(0, 0), pos(9, 4))));
    }

    #[test]
    fn test_clamp_to_new_bounds() {
        let mut sel = system();
        sel.select_cell(pos(9, 4));
        sel.clamp_to(5, 3);
        assert_eq!(sel.selected_cell(), Some(pos(4, 2)));
        assert_range_contains_selected(&sel);
    }
}
