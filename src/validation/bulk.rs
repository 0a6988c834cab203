//! Whole-dataset revalidation.
//!
//! Small datasets are checked in one pass. Larger ones become a
//! [`RevalidationJob`] that the host advances one chunk at a time, yielding
//! to the event loop in between.

use std::collections::BTreeMap;

use crate::adapter::{CellStore, ValidationRules};
use crate::cell_key::{error_key, ErrorKey};
use crate::types::{CellValue, ValidationError};

/// One cell to check: its key, a snapshot of its value, and its rule type.
#[derive(Debug, Clone, PartialEq)]
pub struct CellCheck {
    pub key: ErrorKey,
    pub value: CellValue,
    pub column_type: String,
}

/// Snapshot every body cell in an editable column.
pub fn collect_checks<S: CellStore + ?Sized>(store: &S) -> Vec<CellCheck> {
    let editable: Vec<_> = store.columns().iter().filter(|c| c.is_editable).collect();
    let mut checks = Vec::with_capacity(store.row_count() * editable.len());
    for row in 0..store.row_count() {
        let Ok(row_index) = i32::try_from(row) else {
            break;
        };
        for column in &editable {
            checks.push(CellCheck {
                key: error_key(row, &column.key()),
                value: store.cell_value(row_index, column),
                column_type: column.column_type.clone(),
            });
        }
    }
    checks
}

/// Run the rules over `checks`, adding every failure to `invalid`.
pub fn run_checks(
    checks: &[CellCheck],
    rules: &dyn ValidationRules,
    invalid: &mut BTreeMap<ErrorKey, ValidationError>,
) {
    for check in checks {
        let outcome = rules.validate(&check.value, &check.column_type);
        if !outcome.valid {
            invalid.insert(
                check.key.clone(),
                ValidationError {
                    message: outcome.message.unwrap_or_default(),
                    column: check.key.column.clone(),
                    row_index: check.key.row,
                },
            );
        }
    }
}

/// Outcome of a full pass: the complete set of invalid cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevalidationReport {
    pub checked: usize,
    pub errors: BTreeMap<ErrorKey, ValidationError>,
}

impl RevalidationReport {
    /// Check everything in one pass.
    pub fn run(checks: &[CellCheck], rules: &dyn ValidationRules) -> Self {
        let mut errors = BTreeMap::new();
        run_checks(checks, rules, &mut errors);
        Self {
            checked: checks.len(),
            errors,
        }
    }

    pub fn invalid_count(&self) -> usize {
        self.errors.len()
    }
}

/// Chunked revalidation in progress.
#[derive(Debug, Clone)]
pub struct RevalidationJob {
    checks: Vec<CellCheck>,
    cursor: usize,
    chunk_size: usize,
    errors: BTreeMap<ErrorKey, ValidationError>,
}

impl RevalidationJob {
    pub fn new(checks: Vec<CellCheck>, chunk_size: usize) -> Self {
        Self {
            checks,
            cursor: 0,
            chunk_size: chunk_size.max(1),
            errors: BTreeMap::new(),
        }
    }

    /// Check the next chunk. Returns progress in percent.
    pub fn step(&mut self, rules: &dyn ValidationRules) -> f32 {
        let end = (self.cursor + self.chunk_size).min(self.checks.len());
        if let Some(chunk) = self.checks.get(self.cursor..end) {
            run_checks(chunk, rules, &mut self.errors);
        }
        self.cursor = end;
        self.progress()
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.checks.len()
    }

    pub fn progress(&self) -> f32 {
        if self.checks.is_empty() {
            return 100.0;
        }
        self.cursor as f32 * 100.0 / self.checks.len() as f32
    }

    pub fn total(&self) -> usize {
        self.checks.len()
    }

    /// Consume a finished (or abandoned) job.
    pub fn into_report(self) -> RevalidationReport {
        RevalidationReport {
            checked: self.cursor,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::table::TableData;
    use crate::types::{ColumnDescriptor, Row, ValidationOutcome};

    fn numeric(value: &CellValue, column_type: &str) -> ValidationOutcome {
        match (column_type, value) {
            ("number", CellValue::Text(s)) if s.parse::<f64>().is_err() => {
                ValidationOutcome::invalid("Not a number")
            }
            _ => ValidationOutcome::ok(),
        }
    }

    fn table(rows: usize) -> TableData {
        TableData::new(
            vec![
                ColumnDescriptor::new(0, "serial", "id").read_only(),
                ColumnDescriptor::new(1, "number", "age"),
            ],
            (0..rows)
                .map(|i| Row::new().with("age", if i % 2 == 0 { "x" } else { "4" }))
                .collect(),
        )
    }

    #[test]
    fn test_collect_skips_read_only() {
        let checks = collect_checks(&table(3));
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().all(|c| c.column_type == "number"));
    }

    #[test]
    fn test_chunked_matches_single_pass() {
        let checks = collect_checks(&table(7));
        let single = RevalidationReport::run(&checks, &numeric);

        let mut job = RevalidationJob::new(checks, 3);
        let mut progress = Vec::new();
        while !job.is_done() {
            progress.push(job.step(&numeric));
        }
        assert_eq!(progress.len(), 3);
        assert_eq!(progress.last().copied(), Some(100.0));
        let chunked = job.into_report();
        assert_eq!(chunked, single);
        assert_eq!(chunked.invalid_count(), 4);
    }
}
