//! Debounced cell validation and whole-dataset revalidation.

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
    use std::sync::Arc;
    use std::time::Duration;

    use super::common::{self, Harness, RecordingEvents, RecordingSink};
    use cellgrid::validation::{RevalidationStatus, SharedRules};
    use cellgrid::{CellPos, CellValue, Grid, GridConfig, ManualClock, TableData};

    /// Ten rows with a bad quantity on rows 2 and 5 and a blank name on row 7.
    fn dirty_table() -> TableData {
        let mut rows = common::rows(10);
        rows[2] = rows[2].clone().with("qty", "two");
        rows[5] = rows[5].clone().with("qty", "?");
        rows[7] = rows[7].clone().with("name", "");
        TableData::new(common::columns(), rows)
    }

    /// 10 rows x 4 editable columns = 40 cells, above a limit of 10.
    fn chunked_config() -> GridConfig {
        GridConfig {
            sync_revalidation_limit: 10,
            revalidation_chunk_size: 15,
            ..GridConfig::default()
        }
    }

    /// `count` rows whose quantities are all `qty`.
    fn qty_table(count: usize, qty: impl Fn(usize) -> &'static str) -> TableData {
        let rows = common::rows(count)
            .into_iter()
            .enumerate()
            .map(|(i, row)| row.with("qty", qty(i)))
            .collect();
        TableData::new(common::columns(), rows)
    }

    fn finish_pass(h: &mut Harness) -> cellgrid::validation::RevalidationReport {
        for _ in 0..1_000 {
            if let Some(report) = h.advance(0.0).revalidated {
                return report;
            }
        }
        panic!("revalidation never finished");
    }

    fn open(h: &mut Harness, row: i32, col: u32) {
        h.grid.select_cell(CellPos::new(row, col));
        assert!(h.grid.begin_edit(CellPos::new(row, col), None).unwrap());
    }

    #[test]
    fn test_rapid_typing_validates_once_with_last_value() {
        let mut h = Harness::new(3);
        open(&mut h, 0, 1);
        let before = h.grid.validation().evaluations();

        h.grid.input_edit("1");
        h.clock.advance(100.0);
        h.grid.input_edit("1x");
        h.clock.advance(100.0);
        h.grid.input_edit("1xy");

        assert_eq!(h.grid.next_deadline(), Some(500.0));
        assert_eq!(h.advance(299.0).validations, 0);
        assert_eq!(h.advance(1.0).validations, 1);
        assert_eq!(h.grid.validation().evaluations(), before + 1);
        assert_eq!(h.error(0, 1).as_deref(), Some("Must be a number"));
    }

    #[test]
    fn test_empty_value_skips_debounce() {
        let mut h = Harness::new(3);
        open(&mut h, 2, 2);
        h.grid.input_edit("");
        assert_eq!(h.error(2, 2).as_deref(), Some("Required"));
        assert_eq!(h.grid.next_deadline(), None);
    }

    #[test]
    fn test_flush_runs_pending_timers_now() {
        let mut h = Harness::new(3);
        open(&mut h, 1, 1);
        h.grid.input_edit("nope");
        assert_eq!(h.grid.flush_validation(), 1);
        assert!(h.error(1, 1).is_some());
        assert_eq!(h.grid.flush_validation(), 0);
    }

    #[test]
    fn test_one_error_per_cell() {
        let mut h = Harness::new(3);
        h.grid.select_cell(CellPos::new(0, 1));
        h.grid.paste_text("x").unwrap();
        h.grid.paste_text("y").unwrap();
        assert_eq!(h.grid.errors().len(), 1);
        assert_eq!(h.grid.errors().row(0).count(), 1);
    }

    #[test]
    fn test_validate_cell_reads_current_value() {
        let mut h = Harness::build(dirty_table(), GridConfig::default(), RecordingSink::default());
        assert_eq!(h.grid.validate_cell(CellPos::new(2, 1)), Some(false));
        assert_eq!(h.grid.validate_cell(CellPos::new(3, 1)), Some(true));
        assert_eq!(h.grid.validate_cell(CellPos::new(-1, 1)), None, "headers are not validated");
        assert_eq!(h.grid.errors().len(), 1);
    }

    #[test]
    fn test_revalidate_all_small_dataset_is_synchronous() {
        let mut h = Harness::build(dirty_table(), GridConfig::default(), RecordingSink::default());
        let report = h.grid.revalidate_all();
        assert_eq!(report.checked, 40, "read-only id column is skipped");
        assert_eq!(report.invalid_count(), 3);
        assert_eq!(h.progress.borrow().as_slice(), &[100.0]);
        assert_eq!(h.error(2, 1).as_deref(), Some("Must be a number"));
        assert_eq!(h.error(5, 1).as_deref(), Some("Must be a number"));
        assert_eq!(h.error(7, 2).as_deref(), Some("Required"));
        assert!(!h.grid.validation().is_revalidating());
    }

    #[test]
    fn test_chunked_revalidation_advances_on_tick() {
        let mut h = Harness::build(dirty_table(), chunked_config(), RecordingSink::default());
        assert_eq!(h.grid.start_revalidation(), RevalidationStatus::Pending);
        assert!(h.grid.errors().is_empty(), "nothing applied before the pass ends");

        assert!(h.advance(0.0).revalidated.is_none());
        assert!(h.advance(0.0).revalidated.is_none());
        assert!(h.grid.errors().is_empty());
        let report = h.advance(0.0).revalidated.expect("third chunk finishes");

        assert_eq!(report.checked, 40);
        assert_eq!(h.progress.borrow().as_slice(), &[37.5, 75.0, 100.0]);
        assert_eq!(h.grid.errors().len(), 3);
        assert!(h.advance(0.0).revalidated.is_none());
    }

    #[test]
    fn test_revalidate_all_runs_chunks_to_completion() {
        let mut h = Harness::build(dirty_table(), chunked_config(), RecordingSink::default());
        let report = h.grid.revalidate_all();
        assert_eq!(report.invalid_count(), 3);
        assert_eq!(h.progress.borrow().last(), Some(&100.0));
        assert_eq!(h.progress.borrow().len(), 3);
    }

    #[test]
    fn test_worker_falls_back_to_chunks_with_local_rules() {
        let config = GridConfig {
            use_worker: true,
            ..chunked_config()
        };
        let mut h = Harness::build(dirty_table(), config, RecordingSink::default());
        assert_eq!(h.grid.start_revalidation(), RevalidationStatus::Pending);
        h.advance(0.0);
        assert_eq!(h.progress.borrow().as_slice(), &[37.5]);
    }

    #[test]
    fn test_worker_revalidation_with_shared_rules() {
        let events = RecordingEvents::default();
        let progress = Rc::clone(&events.progress);
        let rules: SharedRules = Arc::new(common::rules);
        let mut grid = Grid::builder(dirty_table())
            .config(GridConfig {
                use_worker: true,
                ..chunked_config()
            })
            .shared_rules(rules)
            .events(events)
            .clock(Rc::new(ManualClock::new()))
            .build()
            .unwrap();

        assert_eq!(grid.start_revalidation(), RevalidationStatus::Pending);
        let mut report = None;
        for _ in 0..500 {
            report = grid.tick().revalidated;
            if report.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        let report = report.expect("worker finished");
        assert_eq!(report.invalid_count(), 3);
        assert_eq!(progress.borrow().as_slice(), &[100.0], "one report, no chunks");
        assert_eq!(grid.errors().len(), 3);
    }

    #[test]
    fn test_worker_revalidate_all_waits_for_result() {
        let rules: SharedRules = Arc::new(common::rules);
        let mut grid = Grid::builder(dirty_table())
            .config(GridConfig {
                use_worker: true,
                ..chunked_config()
            })
            .shared_rules(rules)
            .build()
            .unwrap();
        let report = grid.revalidate_all();
        assert_eq!(report.checked, 40);
        assert_eq!(grid.errors().len(), 3);
    }

    #[test]
    fn test_revalidation_replaces_error_set() {
        let mut h = Harness::build(dirty_table(), chunked_config(), RecordingSink::default());
        h.grid.revalidate_all();
        assert_eq!(h.grid.errors().len(), 3);

        // Fix one bad cell through the commit path; the next pass agrees.
        h.grid.select_cell(CellPos::new(2, 1));
        h.grid.paste_text("2").unwrap();
        assert_eq!(h.grid.errors().len(), 2);
        let report = h.grid.revalidate_all();
        assert_eq!(report.invalid_count(), 2);
        assert_eq!(h.grid.errors().len(), 2);
    }

    #[test]
    fn test_structural_change_cancels_revalidation() {
        let mut h = Harness::build(dirty_table(), chunked_config(), RecordingSink::default());
        h.grid.start_revalidation();
        h.advance(0.0);
        assert!(h.grid.validation().is_revalidating());
        h.grid.insert_rows(0, 1);
        assert!(!h.grid.validation().is_revalidating());
        assert!(h.advance(0.0).revalidated.is_none());
        assert!(h.grid.errors().is_empty());
    }

    #[test]
    fn test_fix_during_pass_is_not_overwritten() {
        let config = GridConfig {
            sync_revalidation_limit: 10,
            revalidation_chunk_size: 10,
            ..GridConfig::default()
        };
        let mut h = Harness::build(qty_table(100, |_| "x"), config, RecordingSink::default());
        assert_eq!(h.grid.start_revalidation(), RevalidationStatus::Pending);
        h.advance(0.0);

        h.grid.select_cell(CellPos::new(50, 1));
        h.grid.paste_text("5").unwrap();
        assert_eq!(h.error(50, 1), None);

        // An interactive commit that breaks a cell the snapshot saw as fine.
        h.grid.select_cell(CellPos::new(60, 2));
        h.grid.begin_edit(CellPos::new(60, 2), None).unwrap();
        h.grid.input_edit("");
        h.grid.confirm_edit().unwrap();
        assert_eq!(h.error(60, 2).as_deref(), Some("Required"));

        let report = finish_pass(&mut h);
        assert_eq!(report.invalid_count(), 100, "the snapshot still had row 50 broken");
        assert_eq!(h.value(50, 1), CellValue::from("5"));
        assert_eq!(h.error(50, 1), None);
        assert_eq!(h.error(60, 2).as_deref(), Some("Required"));
        assert_eq!(h.error(49, 1).as_deref(), Some("Must be a number"));
        assert_eq!(h.grid.errors().len(), 100);
    }

    #[test]
    fn test_host_row_delete_during_pass_cancels_it() {
        let mut h = Harness::build(
            qty_table(100, |i| if i == 99 { "x" } else { "1" }),
            chunked_config(),
            RecordingSink::default(),
        );
        h.grid.revalidate_all();
        assert!(h.error(99, 1).is_some());

        assert_eq!(h.grid.start_revalidation(), RevalidationStatus::Pending);
        h.advance(0.0);
        assert_eq!(h.grid.store_mut().delete_rows(&[0]), vec![0]);
        h.grid.rows_deleted(&[0]);
        assert!(!h.grid.validation().is_revalidating());

        for _ in 0..50 {
            assert!(h.advance(0.0).revalidated.is_none());
        }
        let keys: Vec<String> = h.grid.errors().iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["98_number__0".to_string()]);
        assert_eq!(h.error(98, 1).as_deref(), Some("Must be a number"));
    }

    #[test]
    fn test_host_row_insert_closes_edit_under_old_position() {
        let mut h = Harness::build(
            qty_table(20, |_| "1"),
            chunked_config(),
            RecordingSink::default(),
        );
        open(&mut h, 3, 1);
        h.grid.input_edit("");
        h.grid.input_edit("abc");
        h.grid.start_revalidation();

        h.grid.store_mut().insert_rows(0, 2);
        h.grid.rows_inserted(0, 2);
        assert!(!h.grid.editor().is_open());
        assert!(!h.grid.validation().is_revalidating());
        assert_eq!(h.grid.next_deadline(), None, "draft timer dropped with the edit");
        assert_eq!(h.value(5, 1), CellValue::from("1"));
        assert!(h.grid.errors().is_empty());
    }
}
