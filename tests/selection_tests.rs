//! Pointer-driven selection: click, drag, modifier clicks and edge auto-scroll.
//!
//! The default geometry is 5 columns of 96px and 24px rows under one 24px
//! header row, in an 800 x 600 viewport.

mod common;

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::common::Harness;
    use cellgrid::{CellPos, CellRange, Modifiers, PointerButton, SelectionMode};

    const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
    };
    const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
    };

    /// Center of a body cell in the default geometry.
    fn point(row: i32, col: u32) -> (f32, f32) {
        (col as f32 * 96.0 + 48.0, 24.0 + row as f32 * 24.0 + 12.0)
    }

    fn click(h: &mut Harness, row: i32, col: u32, mods: Modifiers) -> bool {
        let (x, y) = point(row, col);
        let changed = h
            .grid
            .pointer_down(x, y, PointerButton::Primary, mods)
            .unwrap();
        h.grid.pointer_up();
        changed
    }

    #[test]
    fn test_click_selects_single_cell() {
        let mut h = Harness::new(10);
        assert_eq!(h.grid.selection().mode(), SelectionMode::Empty);
        assert!(click(&mut h, 2, 1, Default::default()));
        let state = h.grid.selection_state();
        assert_eq!(state.selected_cell, Some(CellPos::new(2, 1)));
        assert_eq!(state.range, Some(CellRange::single(CellPos::new(2, 1))));
        assert_eq!(h.grid.selection().mode(), SelectionMode::Idle);
    }

    #[test]
    fn test_click_on_header_band() {
        let mut h = Harness::new(10);
        let changed = h
            .grid
            .pointer_down(150.0, 10.0, PointerButton::Primary, Default::default())
            .unwrap();
        assert!(changed);
        assert_eq!(
            h.grid.selection_state().selected_cell,
            Some(CellPos::new(-1, 1))
        );
    }

    #[test]
    fn test_drag_extends_range_and_ends_on_pointer_up() {
        let mut h = Harness::new(10);
        let (x, y) = point(0, 1);
        h.grid
            .pointer_down(x, y, PointerButton::Primary, Default::default())
            .unwrap();
        assert_eq!(h.grid.selection().mode(), SelectionMode::Dragging);

        let (x, y) = point(2, 3);
        assert!(h.grid.pointer_move(x, y));
        assert!(!h.grid.pointer_move(x + 5.0, y + 5.0), "same cell, no change");
        assert!(h.grid.pointer_up());

        let state = h.grid.selection_state();
        assert!(!state.is_dragging);
        assert_eq!(
            state.range.unwrap().bounds(),
            (CellPos::new(0, 1), CellPos::new(2, 3))
        );
        assert_eq!(h.grid.selection().mode(), SelectionMode::Range);
        assert!(!h.grid.pointer_move(x, y), "moves after pointer-up are ignored");
    }

    #[test]
    fn test_shift_click_extends_from_anchor() {
        let mut h = Harness::new(10);
        click(&mut h, 1, 1, Default::default());
        click(&mut h, 4, 3, SHIFT);
        let state = h.grid.selection_state();
        assert_eq!(state.selected_cell, Some(CellPos::new(1, 1)));
        assert_eq!(state.anchor, Some(CellPos::new(1, 1)));
        assert_eq!(state.range.unwrap().end, CellPos::new(4, 3));

        click(&mut h, 0, 0, SHIFT);
        let (min, max) = h.grid.selection().bounds().unwrap();
        assert_eq!((min, max), (CellPos::new(0, 0), CellPos::new(1, 1)));
    }

    #[test]
    fn test_ctrl_click_builds_individual_set() {
        let mut h = Harness::new(10);
        click(&mut h, 1, 1, Default::default());
        click(&mut h, 3, 2, CTRL);
        click(&mut h, 5, 4, CTRL);
        let cells = &h.grid.selection_state().individual_cells;
        assert_eq!(
            cells.iter().copied().collect::<Vec<_>>(),
            vec![CellPos::new(1, 1), CellPos::new(3, 2), CellPos::new(5, 4)]
        );
        assert_eq!(h.grid.selection().mode(), SelectionMode::Individual);

        click(&mut h, 3, 2, CTRL);
        assert!(!h
            .grid
            .selection_state()
            .individual_cells
            .contains(&CellPos::new(3, 2)));
    }

    #[test]
    fn test_ctrl_click_refused_over_range() {
        let mut h = Harness::new(10);
        click(&mut h, 1, 1, Default::default());
        click(&mut h, 2, 2, SHIFT);
        assert!(!click(&mut h, 5, 4, CTRL));
        assert_eq!(h.grid.selection().mode(), SelectionMode::Range);
    }

    #[test]
    fn test_context_click_inside_selection_keeps_it() {
        let mut h = Harness::new(10);
        click(&mut h, 1, 1, Default::default());
        click(&mut h, 3, 3, SHIFT);

        let (x, y) = point(2, 2);
        let changed = h
            .grid
            .pointer_down(x, y, PointerButton::Secondary, Default::default())
            .unwrap();
        assert!(!changed);
        assert_eq!(h.grid.selection().mode(), SelectionMode::Range);

        let (x, y) = point(8, 0);
        assert!(h
            .grid
            .pointer_down(x, y, PointerButton::Secondary, Default::default())
            .unwrap());
        assert_eq!(
            h.grid.selection_state().selected_cell,
            Some(CellPos::new(8, 0))
        );
    }

    #[test]
    fn test_row_header_clicks() {
        let mut h = Harness::new(10);
        assert!(h.grid.row_header_click(2, Default::default()));
        let (min, max) = h.grid.selection().bounds().unwrap();
        assert_eq!((min, max), (CellPos::new(2, 0), CellPos::new(2, 4)));

        assert!(h.grid.row_header_click(5, SHIFT));
        let (min, max) = h.grid.selection().bounds().unwrap();
        assert_eq!((min, max), (CellPos::new(2, 0), CellPos::new(5, 4)));

        // Individual rows cannot be mixed into a multi-cell range.
        assert!(!h.grid.row_header_click(7, CTRL));

        h.grid.select_cell(CellPos::new(0, 0));
        assert!(h.grid.row_header_click(7, CTRL));
        let rows: Vec<i32> = h
            .grid
            .selection_state()
            .individual_rows
            .iter()
            .copied()
            .collect();
        assert_eq!(rows, vec![0, 7]);
        assert_eq!(h.grid.selection().selected_positions().len(), 10);
    }

    #[test]
    fn test_auto_scroll_extends_drag_past_viewport() {
        let mut h = Harness::new(100);
        let (x, y) = point(0, 1);
        h.grid
            .pointer_down(x, y, PointerButton::Primary, Default::default())
            .unwrap();

        // Near the bottom edge: arms the ticker.
        assert!(h.grid.pointer_move(x, 590.0));
        let before = h.grid.selection_state().range.unwrap().end;
        assert!(h.grid.next_deadline().is_some());

        assert!(!h.advance(10.0).scrolled, "not due yet");
        let report = h.advance(50.0);
        assert!(report.scrolled);
        let after = h.grid.selection_state().range.unwrap().end;
        assert!(after.row > before.row, "{after:?} should be below {before:?}");

        for _ in 0..5 {
            h.advance(50.0);
        }
        assert!(h.grid.selection_state().range.unwrap().end.row > after.row);

        h.grid.pointer_up();
        assert!(h.grid.next_deadline().is_none(), "ticker cleared on pointer-up");
        assert!(!h.advance(50.0).scrolled);
    }

    #[test]
    fn test_moving_off_the_edge_band_stops_scrolling() {
        let mut h = Harness::new(100);
        let (x, y) = point(0, 1);
        h.grid
            .pointer_down(x, y, PointerButton::Primary, Default::default())
            .unwrap();
        h.grid.pointer_move(x, 590.0);
        assert!(h.grid.next_deadline().is_some());
        h.grid.pointer_move(x, 300.0);
        assert!(h.grid.next_deadline().is_none());
    }

    #[test]
    fn test_selection_frozen_while_editing() {
        let mut h = Harness::new(10);
        h.grid.select_cell(CellPos::new(1, 4));
        assert!(h.grid.begin_edit(CellPos::new(1, 4), None).unwrap());
        assert_eq!(h.grid.selection().mode(), SelectionMode::Editing);
        assert!(!h.grid.select_all());
        assert!(!h.grid.row_header_click(3, Default::default()));
        assert!(!h.grid.extend_selection(CellPos::new(4, 4)));
        assert_eq!(h.grid.selection_state().editing_cell, Some(CellPos::new(1, 4)));
    }
}
