//! Keyboard routing through the grid: movement, header skipping and the
//! keys that start edits or act on the selection.

mod common;

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::common::{self, Harness, RecordingSink};
    use cellgrid::{
        CellPos, CellValue, ColumnDescriptor, Direction, GridConfig, Key, KeyInput,
        SelectionMode, TableData,
    };
    use test_case::test_case;

    fn press(h: &mut Harness, input: KeyInput) -> bool {
        h.grid.handle_key(input).unwrap()
    }

    fn selected(h: &Harness) -> CellPos {
        h.grid.selection_state().selected_cell.unwrap()
    }

    #[test_case(Key::Arrow(Direction::Down), CellPos::new(3, 2) ; "down")]
    #[test_case(Key::Arrow(Direction::Up), CellPos::new(1, 2) ; "up")]
    #[test_case(Key::Arrow(Direction::Left), CellPos::new(2, 1) ; "left")]
    #[test_case(Key::Arrow(Direction::Right), CellPos::new(2, 3) ; "right")]
    #[test_case(Key::Tab, CellPos::new(2, 3) ; "tab")]
    #[test_case(Key::Enter, CellPos::new(3, 2) ; "enter")]
    fn test_single_step(key: Key, expected: CellPos) {
        let mut h = Harness::new(10);
        h.grid.select_cell(CellPos::new(2, 2));
        assert!(press(&mut h, KeyInput::new(key)));
        assert_eq!(selected(&h), expected);
    }

    #[test_case(KeyInput::new(Key::Tab).shift(), CellPos::new(2, 1) ; "shift tab")]
    #[test_case(KeyInput::new(Key::Enter).shift(), CellPos::new(1, 2) ; "shift enter")]
    #[test_case(KeyInput::new(Key::Arrow(Direction::Down)).ctrl(), CellPos::new(9, 2) ; "ctrl down")]
    #[test_case(KeyInput::new(Key::Arrow(Direction::Up)).ctrl(), CellPos::new(0, 2) ; "ctrl up")]
    #[test_case(KeyInput::new(Key::Arrow(Direction::Left)).ctrl(), CellPos::new(2, 1) ; "ctrl left stops at first editable")]
    #[test_case(KeyInput::new(Key::Arrow(Direction::Right)).ctrl(), CellPos::new(2, 4) ; "ctrl right")]
    fn test_modified_step(input: KeyInput, expected: CellPos) {
        let mut h = Harness::new(10);
        h.grid.select_cell(CellPos::new(2, 2));
        press(&mut h, input);
        assert_eq!(selected(&h), expected);
    }

    #[test]
    fn test_edges_hold_position() {
        let mut h = Harness::new(3);
        h.grid.select_cell(CellPos::new(2, 4));
        press(&mut h, KeyInput::new(Key::Arrow(Direction::Down)));
        press(&mut h, KeyInput::new(Key::Arrow(Direction::Right)));
        assert_eq!(selected(&h), CellPos::new(2, 4));
    }

    #[test]
    fn test_first_key_without_selection_lands_top_left() {
        let mut h = Harness::new(3);
        assert!(press(&mut h, KeyInput::new(Key::Arrow(Direction::Right))));
        assert_eq!(selected(&h), CellPos::new(0, 0));
    }

    #[test]
    fn test_up_from_body_enters_editable_header() {
        let mut h = Harness::new(3);
        h.grid.select_cell(CellPos::new(0, 1));
        press(&mut h, KeyInput::new(Key::Arrow(Direction::Up)));
        assert_eq!(selected(&h), CellPos::new(-1, 1));

        // The read-only id column's header is not navigable.
        h.grid.select_cell(CellPos::new(0, 0));
        press(&mut h, KeyInput::new(Key::Arrow(Direction::Up)));
        assert_eq!(selected(&h), CellPos::new(0, 0));
    }

    #[test]
    fn test_header_navigation_disabled_by_config() {
        let config = GridConfig {
            editable_header_row: None,
            ..GridConfig::default()
        };
        let mut h = Harness::with_config(3, config);
        h.grid.select_cell(CellPos::new(0, 1));
        press(&mut h, KeyInput::new(Key::Arrow(Direction::Up)));
        assert_eq!(selected(&h), CellPos::new(0, 1));
    }

    /// Six columns, of which only 2 and 5 are editable.
    fn sparse_header_table() -> TableData {
        let columns = (0..6)
            .map(|i| {
                let column = ColumnDescriptor::new(i, "shortText", &format!("f{i}"));
                if i == 2 || i == 5 {
                    column
                } else {
                    column.read_only()
                }
            })
            .collect();
        TableData::new(columns, common::rows(4))
    }

    #[test]
    fn test_header_skips_non_navigable_cells() {
        let mut h = Harness::build(
            sparse_header_table(),
            GridConfig::default(),
            RecordingSink::default(),
        );
        h.grid.select_cell(CellPos::new(-1, 0));

        let mut visited = Vec::new();
        for _ in 0..3 {
            press(&mut h, KeyInput::new(Key::Tab));
            visited.push(selected(&h));
        }
        assert_eq!(
            visited,
            vec![CellPos::new(-1, 2), CellPos::new(-1, 5), CellPos::new(0, 5)]
        );
    }

    #[test]
    fn test_shift_arrows_grow_range_from_moving_end() {
        let mut h = Harness::new(10);
        h.grid.select_cell(CellPos::new(2, 2));
        press(&mut h, KeyInput::new(Key::Arrow(Direction::Down)).shift());
        press(&mut h, KeyInput::new(Key::Arrow(Direction::Down)).shift());
        press(&mut h, KeyInput::new(Key::Arrow(Direction::Right)).shift());
        let state = h.grid.selection_state();
        assert_eq!(state.selected_cell, Some(CellPos::new(2, 2)));
        assert_eq!(state.range.unwrap().end, CellPos::new(4, 3));

        press(&mut h, KeyInput::new(Key::Escape));
        assert_eq!(h.grid.selection().mode(), SelectionMode::Idle);
        assert_eq!(selected(&h), CellPos::new(2, 2));
    }

    #[test]
    fn test_ctrl_a_selects_every_body_cell() {
        let mut h = Harness::new(4);
        h.grid.select_cell(CellPos::new(1, 1));
        press(&mut h, KeyInput::new(Key::Char('a')).ctrl());
        let (min, max) = h.grid.selection().bounds().unwrap();
        assert_eq!((min, max), (CellPos::new(0, 0), CellPos::new(3, 4)));
    }

    #[test]
    fn test_typing_starts_edit_with_seed() {
        let mut h = Harness::new(3);
        h.grid.select_cell(CellPos::new(1, 4));
        assert!(press(&mut h, KeyInput::new(Key::Char('x'))));
        assert!(h.grid.editor().is_open());
        assert_eq!(h.grid.editor().text().as_deref(), Some("x"));
        assert_eq!(h.grid.selection().mode(), SelectionMode::Editing);
    }

    #[test]
    fn test_typing_on_read_only_cell_does_nothing() {
        let mut h = Harness::new(3);
        h.grid.select_cell(CellPos::new(1, 0));
        assert!(!press(&mut h, KeyInput::new(Key::Char('x'))));
        assert!(!press(&mut h, KeyInput::new(Key::F2)));
        assert!(!h.grid.editor().is_open());
    }

    #[test]
    fn test_delete_clears_editable_cells_only() {
        let mut h = Harness::new(3);
        h.grid.select_cell(CellPos::new(0, 0));
        h.grid.extend_selection(CellPos::new(1, 1));
        assert!(press(&mut h, KeyInput::new(Key::Delete)));
        assert_eq!(h.value(0, 0), CellValue::from("0"), "id is read-only");
        assert_eq!(h.value(0, 1), CellValue::Null);
        assert_eq!(h.value(1, 1), CellValue::Null);
        assert_eq!(h.writes.borrow().len(), 2);
    }

    #[test]
    fn test_dom_key_names() {
        assert_eq!(
            KeyInput::from_dom("ArrowLeft", false, false, false, false).key,
            Key::Arrow(Direction::Left)
        );
        let input = KeyInput::from_dom("c", false, false, true, false);
        assert!(input.ctrl, "Cmd counts as Ctrl");
        assert_eq!(KeyInput::from_dom("Unidentified", false, false, false, false).key, Key::Other);
    }
}
