//! Errors follow their cells through row and column restructuring.

mod common;

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use std::rc::Rc;

    use cellgrid::remap::ColumnRemap;
    use cellgrid::{
        CellPos, CellValue, ColumnDescriptor, ColumnKey, Grid, ManualClock, Row, TableData,
        ValidationOutcome,
    };

    const SYMPTOM: &str = "clinicalSymptom";

    fn symptom_rules(value: &CellValue, column_type: &str) -> ValidationOutcome {
        match column_type {
            SYMPTOM => match value.display().as_str() {
                "" | "yes" | "no" => ValidationOutcome::ok(),
                _ => ValidationOutcome::invalid("Answer yes or no"),
            },
            "required" if value.is_empty() => ValidationOutcome::invalid("Required"),
            _ => ValidationOutcome::ok(),
        }
    }

    fn symptom(col_index: u32, cell_index: u32, header: &str) -> ColumnDescriptor {
        ColumnDescriptor::new(col_index, SYMPTOM, "symptoms")
            .with_cell_index(cell_index)
            .with_header(header)
    }

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new(0, "required", "name").with_header("Name"),
            symptom(1, 0, "Fever"),
            symptom(2, 1, "Cough"),
            symptom(3, 2, "Rash"),
        ]
    }

    fn key(cell_index: u32) -> ColumnKey {
        ColumnKey::new(SYMPTOM, cell_index, None)
    }

    /// Ten patients. Row 5 has an invalid cough answer, row 6 an invalid
    /// rash answer and row 2 no name. Each symptom list carries one spare
    /// answer so widened column sets still land on filled cells.
    fn grid() -> Grid<TableData> {
        let rows = (0..10)
            .map(|i| {
                let cough = if i == 5 { "maybe" } else { "no" };
                let rash = if i == 6 { "itchy" } else { "yes" };
                let name = if i == 2 { String::new() } else { format!("p{i}") };
                Row::new().with("name", name).with_list(
                    "symptoms",
                    vec!["no".into(), cough.into(), rash.into(), "no".into()],
                )
            })
            .collect();
        let mut grid = Grid::builder(TableData::new(columns(), rows))
            .rules(symptom_rules)
            .clock(Rc::new(ManualClock::new()))
            .build()
            .unwrap();
        let report = grid.revalidate_all();
        assert_eq!(report.invalid_count(), 3);
        grid
    }

    fn message(grid: &Grid<TableData>, row: i32, col: u32) -> Option<String> {
        grid.error_at(CellPos::new(row, col))
            .map(|e| e.message.clone())
    }

    #[test]
    fn test_errors_follow_row_deletes_and_inserts() {
        let mut grid = grid();
        assert!(grid.errors().at(5, &key(1)).is_some());

        let removed = grid.delete_rows(&[3, 1]);
        assert_eq!(removed, vec![1, 3]);
        assert!(grid.errors().at(5, &key(1)).is_none());
        assert_eq!(grid.errors().at(3, &key(1)).unwrap().row_index, 3);
        assert_eq!(message(&grid, 3, 2).as_deref(), Some("Answer yes or no"));
        assert_eq!(message(&grid, 1, 0).as_deref(), Some("Required"), "row 2 moved up one");

        grid.insert_rows(0, 1);
        assert!(grid.errors().at(4, &key(1)).is_some());
        assert_eq!(message(&grid, 4, 2).as_deref(), Some("Answer yes or no"));
        assert_eq!(grid.cell_value(CellPos::new(4, 2)), Some(CellValue::from("maybe")));
        assert_eq!(grid.errors().len(), 3);
    }

    #[test]
    fn test_deleting_invalid_row_drops_its_error() {
        let mut grid = grid();
        grid.delete_rows(&[5]);
        assert_eq!(grid.errors().len(), 2);
        assert!(grid.errors().at(5, &key(2)).is_some(), "row 6 moved up");
    }

    #[test]
    fn test_delete_clamps_selection() {
        let mut grid = grid();
        grid.select_cell(CellPos::new(9, 1));
        grid.delete_rows(&[0, 1]);
        assert_eq!(
            grid.selection_state().selected_cell,
            Some(CellPos::new(7, 1))
        );
    }

    #[test]
    fn test_structural_change_cancels_open_edit() {
        let mut grid = grid();
        grid.select_cell(CellPos::new(4, 1));
        grid.begin_edit(CellPos::new(4, 1), None).unwrap();
        grid.input_edit("yes");
        grid.insert_rows(0, 2);
        assert!(!grid.editor().is_open());
        assert!(!grid.selection_state().is_editing);
        assert_eq!(grid.cell_value(CellPos::new(6, 1)), Some(CellValue::from("no")));
    }

    #[test]
    fn test_reorder_keeps_identities() {
        let mut grid = grid();
        let reordered = vec![
            ColumnDescriptor::new(0, "required", "name").with_header("Name"),
            symptom(1, 1, "Cough"),
            symptom(2, 0, "Fever"),
            symptom(3, 2, "Rash"),
        ];
        assert_eq!(grid.set_columns(reordered), 0);
        assert_eq!(grid.errors().len(), 3);
        assert_eq!(message(&grid, 5, 1).as_deref(), Some("Answer yes or no"));
        assert_eq!(message(&grid, 5, 2), None);
    }

    #[test]
    fn test_inferred_insert_shifts_sub_indices() {
        let mut grid = grid();
        let widened = vec![
            ColumnDescriptor::new(0, "required", "name").with_header("Name"),
            symptom(1, 0, "Fever"),
            symptom(2, 1, "Headache"),
            symptom(3, 2, "Cough"),
            symptom(4, 3, "Rash"),
        ];
        grid.set_columns(widened);
        assert!(grid.errors().at(5, &key(1)).is_none());
        assert!(grid.errors().at(5, &key(2)).is_some(), "cough moved to sub-index 2");
        assert!(grid.errors().at(6, &key(3)).is_some(), "rash moved to sub-index 3");
    }

    #[test]
    fn test_explicit_insert_remap() {
        let mut grid = grid();
        let widened = vec![
            ColumnDescriptor::new(0, "required", "name").with_header("Name"),
            symptom(1, 0, "Fever"),
            symptom(2, 1, "Cough"),
            symptom(3, 2, "Cough"),
            symptom(4, 3, "Rash"),
        ];
        let remap = ColumnRemap::insert_columns(key(0).class(), 1, 1);
        grid.restructure_columns(widened, &remap);
        assert!(grid.errors().at(5, &key(2)).is_some());
        assert!(grid.errors().at(6, &key(3)).is_some());
    }

    #[test]
    fn test_deleted_column_drops_its_errors() {
        let mut grid = grid();
        let narrowed = vec![
            ColumnDescriptor::new(0, "required", "name").with_header("Name"),
            symptom(1, 0, "Fever"),
            symptom(2, 1, "Rash"),
        ];
        let dropped = grid.set_columns(narrowed);
        assert_eq!(dropped, 1, "the cough error goes with its column");
        assert!(grid.errors().at(5, &key(1)).is_none());
        assert!(grid.errors().at(6, &key(1)).is_some(), "rash moved to sub-index 1");
        assert_eq!(grid.errors().len(), 2);
    }

    #[test]
    fn test_removed_field_prunes_errors() {
        let mut grid = grid();
        let without_name = vec![
            symptom(0, 0, "Fever"),
            symptom(1, 1, "Cough"),
            symptom(2, 2, "Rash"),
        ];
        assert_eq!(grid.set_columns(without_name), 1);
        assert_eq!(grid.errors().len(), 2);
        assert!(grid.errors().iter().all(|(k, _)| k.column.column_type == SYMPTOM));
        assert_eq!(message(&grid, 5, 1).as_deref(), Some("Answer yes or no"));
    }
}
