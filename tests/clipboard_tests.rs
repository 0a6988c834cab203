//! Copy and paste through the grid, plus block import.

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
        CellPos, CellStore, CellValue, GridConfig, Key, KeyInput, PasteSummary, TableData,
    };

    #[test]
    fn test_paste_two_by_two_block() {
        let mut h = Harness::new(5);
        h.grid.select_cell(CellPos::new(0, 1));
        let summary = h.grid.paste_text("1\t2\n3\t4").unwrap();

        assert_eq!(summary, PasteSummary::new(4, 0));
        assert_eq!(summary.rate, 0.0);
        assert_eq!(h.value(0, 1), CellValue::from("1"));
        assert_eq!(h.value(0, 2), CellValue::from("2"));
        assert_eq!(h.value(1, 1), CellValue::from("3"));
        assert_eq!(h.value(1, 2), CellValue::from("4"));
        assert_eq!(h.writes.borrow().len(), 4);
        assert_eq!(h.summaries.borrow().as_slice(), &[summary]);

        let (min, max) = h.grid.selection().bounds().unwrap();
        assert_eq!((min, max), (CellPos::new(0, 1), CellPos::new(1, 2)));
        assert_eq!(
            h.grid.selection_state().selected_cell,
            Some(CellPos::new(0, 1))
        );
    }

    #[test]
    fn test_paste_counts_invalid_cells() {
        let mut h = Harness::new(5);
        h.grid.select_cell(CellPos::new(2, 1));
        let summary = h.grid.paste_text("x\t\n5\tok").unwrap();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.errors, 2, "bad number and blank required name");
        assert_eq!(summary.rate, 0.5);
        assert_eq!(h.error(2, 1).as_deref(), Some("Must be a number"));
        assert_eq!(h.error(2, 2).as_deref(), Some("Required"));
        assert_eq!(h.error(3, 1), None);
    }

    #[test]
    fn test_paste_clears_stale_error() {
        let mut h = Harness::new(5);
        h.grid.select_cell(CellPos::new(1, 1));
        h.grid.paste_text("bad").unwrap();
        assert!(h.error(1, 1).is_some());
        h.grid.paste_text("12").unwrap();
        assert_eq!(h.error(1, 1), None);
        assert_eq!(h.grid.errors().len(), 0);
    }

    #[test]
    fn test_paste_is_clamped_to_grid() {
        let mut h = Harness::new(3);
        h.grid.select_cell(CellPos::new(2, 3));
        let summary = h.grid.paste_text("2024/01/01 10:00\tb\tc\nd\te").unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(h.value(2, 3), CellValue::from("2024/01/01 10:00"));
        assert_eq!(h.value(2, 4), CellValue::from("b"));
        assert_eq!(h.grid.store().row_count(), 3, "no rows appended");
    }

    #[test]
    fn test_paste_skips_read_only_columns() {
        let mut h = Harness::new(3);
        h.grid.select_cell(CellPos::new(0, 0));
        let summary = h.grid.paste_text("99\t7").unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(h.value(0, 0), CellValue::from("0"));
        assert_eq!(h.value(0, 1), CellValue::from("7"));
        assert_eq!(h.summaries.borrow().len(), 1);
    }

    #[test]
    fn test_single_cell_paste_has_no_summary() {
        let mut h = Harness::new(3);
        h.grid.select_cell(CellPos::new(1, 4));
        let summary = h.grid.paste_text("hello\n").unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(h.value(1, 4), CellValue::from("hello"));
        assert!(h.summaries.borrow().is_empty());
    }

    #[test]
    fn test_paste_needs_a_selection_and_a_closed_editor() {
        let mut h = Harness::new(3);
        assert_eq!(h.grid.paste_text("1").unwrap(), PasteSummary::default());

        h.grid.select_cell(CellPos::new(0, 4));
        h.grid.begin_edit(CellPos::new(0, 4), None).unwrap();
        assert_eq!(h.grid.paste_text("1\t2").unwrap(), PasteSummary::default());
        assert!(h.writes.borrow().is_empty());
    }

    #[test]
    fn test_copy_then_paste_elsewhere() {
        let mut h = Harness::new(6);
        h.grid.select_cell(CellPos::new(0, 1));
        h.grid.extend_selection(CellPos::new(1, 2));
        assert!(h
            .grid
            .handle_key(KeyInput::new(Key::Char('c')).ctrl())
            .unwrap());

        h.grid.select_cell(CellPos::new(4, 1));
        assert!(h
            .grid
            .handle_key(KeyInput::new(Key::Char('v')).ctrl())
            .unwrap());
        assert_eq!(h.value(4, 1), CellValue::from("0"));
        assert_eq!(h.value(4, 2), CellValue::from("patient 0"));
        assert_eq!(h.value(5, 1), CellValue::from("10"));
        assert_eq!(h.value(5, 2), CellValue::from("patient 1"));
    }

    #[test]
    fn test_copy_paste_same_anchor_round_trip() {
        let notes = ["tab\there", "two\nlines", "say \"hi\""];
        let rows = common::rows(3)
            .into_iter()
            .zip(notes)
            .map(|(row, note)| row.with("note", note))
            .collect();
        let mut h = Harness::build(
            TableData::new(common::columns(), rows),
            GridConfig::default(),
            RecordingSink::default(),
        );
        let display = |h: &Harness| -> Vec<String> {
            (0..3)
                .flat_map(|row| (1..5).map(move |col| (row, col)))
                .map(|(row, col)| h.value(row, col).display())
                .collect()
        };
        let before = display(&h);

        h.grid.select_cell(CellPos::new(0, 1));
        h.grid.extend_selection(CellPos::new(2, 4));
        let text = h.grid.copy().unwrap();

        h.grid.select_cell(CellPos::new(0, 1));
        let summary = h.grid.paste_text(&text).unwrap();
        assert_eq!(summary.total, 12);
        assert_eq!(summary.errors, 0);
        assert_eq!(display(&h), before);
        assert_eq!(h.value(1, 4).display(), "two\nlines");
    }

    #[test]
    fn test_copy_quotes_awkward_cells() {
        let mut h = Harness::new(2);
        h.grid.select_cell(CellPos::new(0, 4));
        h.grid.paste_text("\"line one\nline \"\"two\"\"\"").unwrap();
        assert_eq!(
            h.value(0, 4),
            CellValue::from("line one\nline \"two\"")
        );

        let text = h.grid.copy().unwrap();
        assert_eq!(text, "\"line one\nline \"\"two\"\"\"");
    }

    #[test]
    fn test_copy_header_strips_markup() {
        let mut h = Harness::new(2);
        h.grid.select_cell(CellPos::new(-1, 0));
        h.grid.extend_selection(CellPos::new(-1, 2));
        assert_eq!(h.grid.copy().unwrap(), "ID\tQty\tPatient name");
    }

    #[test]
    fn test_copy_without_selection_is_empty() {
        let mut h = Harness::new(2);
        assert_eq!(h.grid.copy().unwrap(), "");
    }

    #[test]
    fn test_import_block_reports_progress() {
        let mut h = Harness::new(6);
        let rows: Vec<Vec<CellValue>> = vec![
            vec![CellValue::Number(1.0), "a".into()],
            vec!["two".into(), "b".into()],
            vec![CellValue::Number(3.0), CellValue::Null],
            vec![CellValue::Number(4.0), "d".into()],
        ];
        let summary = h.grid.import_block(CellPos::new(1, 1), &rows).unwrap();

        assert_eq!(summary.total, 8);
        assert_eq!(summary.errors, 2);
        assert_eq!(h.progress.borrow().as_slice(), &[25.0, 50.0, 75.0, 100.0]);
        assert_eq!(h.summaries.borrow().as_slice(), &[summary]);
        assert_eq!(h.value(2, 1), CellValue::from("two"));
        assert_eq!(h.error(2, 1).as_deref(), Some("Must be a number"));
        assert_eq!(h.error(3, 2).as_deref(), Some("Required"));
    }
}
