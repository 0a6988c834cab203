//! Shared fixtures for the integration tests.
//!
//! A small patient-visit table, rules keyed by column type, and recording
//! collaborators whose logs stay readable after the grid takes ownership.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use cellgrid::{
    CellIdentity, CellPos, CellValue, ColumnDescriptor, CommitSink, Grid, GridConfig, GridError,
    GridEvents, ManualClock, PasteSummary, Row, TableData, ValidationOutcome,
};

static TRACING: Once = Once::new();

/// Route `tracing` output to the test harness; filter with `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Columns: `id` (read-only serial), `qty` (number), `name` (required text),
/// `visit` (date-time), `note` (free text).
pub fn columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new(0, "serial", "id")
            .with_header("<b>ID</b>")
            .read_only(),
        ColumnDescriptor::new(1, "number", "qty").with_header("Qty"),
        ColumnDescriptor::new(2, "required", "name").with_header("Patient<br>name"),
        ColumnDescriptor::new(3, cellgrid::DATE_TIME_TYPE, "visit").with_header("Visit"),
        ColumnDescriptor::new(4, "shortText", "note").with_header("Note"),
    ]
}

pub fn rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            Row::new()
                .with("id", i.to_string().as_str())
                .with("qty", (i * 10).to_string().as_str())
                .with("name", format!("patient {i}"))
        })
        .collect()
}

pub fn table(count: usize) -> TableData {
    TableData::new(columns(), rows(count))
}

/// `number` rejects non-numeric text, `required` rejects blanks, `dateTime`
/// rejects anything that is not a full `YYYY/MM/DD HH:mm` value. Everything
/// else passes.
pub fn rules(value: &CellValue, column_type: &str) -> ValidationOutcome {
    match column_type {
        "number" => match value {
            CellValue::Null | CellValue::Number(_) => ValidationOutcome::ok(),
            CellValue::Text(s) if s.trim().parse::<f64>().is_ok() => ValidationOutcome::ok(),
            _ => ValidationOutcome::invalid("Must be a number"),
        },
        "required" if value.is_empty() => ValidationOutcome::invalid("Required"),
        cellgrid::DATE_TIME_TYPE => {
            let text = value.display();
            let complete = text.is_empty()
                || chrono::NaiveDateTime::parse_from_str(&text, "%Y/%m/%d %H:%M").is_ok();
            if complete {
                ValidationOutcome::ok()
            } else {
                ValidationOutcome::invalid("Incomplete date")
            }
        }
        _ => ValidationOutcome::ok(),
    }
}

/// One `commit_write` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub cell: CellIdentity,
    pub old: CellValue,
    pub new: CellValue,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub writes: Rc<RefCell<Vec<Write>>>,
    pub fail: bool,
}

impl CommitSink for RecordingSink {
    fn commit_write(
        &mut self,
        cell: &CellIdentity,
        old: &CellValue,
        new: &CellValue,
        _column: &ColumnDescriptor,
    ) -> cellgrid::Result<()> {
        self.writes.borrow_mut().push(Write {
            cell: cell.clone(),
            old: old.clone(),
            new: new.clone(),
        });
        if self.fail {
            return Err(GridError::Commit("backend offline".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingEvents {
    pub progress: Rc<RefCell<Vec<f32>>>,
    pub summaries: Rc<RefCell<Vec<PasteSummary>>>,
}

impl GridEvents for RecordingEvents {
    fn on_progress(&mut self, percent: f32) {
        self.progress.borrow_mut().push(percent);
    }

    fn on_summary(&mut self, summary: &PasteSummary) {
        self.summaries.borrow_mut().push(*summary);
    }
}

/// A grid plus handles on everything it reports to.
pub struct Harness {
    pub grid: Grid<TableData>,
    pub clock: Rc<ManualClock>,
    pub writes: Rc<RefCell<Vec<Write>>>,
    pub progress: Rc<RefCell<Vec<f32>>>,
    pub summaries: Rc<RefCell<Vec<PasteSummary>>>,
}

impl Harness {
    pub fn new(row_count: usize) -> Self {
        Self::with_config(row_count, GridConfig::default())
    }

    pub fn with_config(row_count: usize, config: GridConfig) -> Self {
        Self::build(table(row_count), config, RecordingSink::default())
    }

    pub fn build(table: TableData, config: GridConfig, sink: RecordingSink) -> Self {
        init_tracing();
        let clock = Rc::new(ManualClock::new());
        let events = RecordingEvents::default();
        let writes = Rc::clone(&sink.writes);
        let progress = Rc::clone(&events.progress);
        let summaries = Rc::clone(&events.summaries);
        let grid = Grid::builder(table)
            .config(config)
            .rules(rules)
            .commit_sink(sink)
            .events(events)
            .clock(clock.clone())
            .build()
            .expect("valid config");
        Self {
            grid,
            clock,
            writes,
            progress,
            summaries,
        }
    }

    /// Advance time and fire whatever is due.
    pub fn advance(&mut self, ms: f64) -> cellgrid::TickReport {
        self.clock.advance(ms);
        self.grid.tick()
    }

    pub fn value(&self, row: i32, col: u32) -> CellValue {
        self.grid.cell_value(CellPos::new(row, col)).unwrap()
    }

    pub fn error(&self, row: i32, col: u32) -> Option<String> {
        self.grid
            .error_at(CellPos::new(row, col))
            .map(|e| e.message.clone())
    }
}
