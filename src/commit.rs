//! The single write path: store write, persistence hook, validation.
//!
//! Interactive edits, pasted cells and imported cells all go through
//! [`commit_cell`]. A failing persistence hook is logged and the in-memory
//! state is still updated.

use tracing::warn;

use crate::adapter::{CellIdentity, CellStore, CommitSink};
use crate::cell_key::error_key;
use crate::error::{GridError, Result};
use crate::types::{CellPos, CellValue};
use crate::validation::ValidationManager;

/// Which caller is writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// A confirmed edit. Unchanged values are not written.
    Interactive,
    /// A pasted or imported cell. Always written; any stale error is cleared
    /// before the cell is validated again.
    Paste,
}

/// What a commit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitOutcome {
    pub written: bool,
    /// Validation verdict for body cells; `None` for headers and skipped writes.
    pub valid: Option<bool>,
}

/// Everything a commit touches.
pub struct CommitTarget<'a, S: CellStore + ?Sized> {
    pub store: &'a mut S,
    pub sink: &'a mut dyn CommitSink,
    pub validation: &'a mut ValidationManager,
}

/// Write `value` at `pos`.
///
/// `original` is the value the edit started from; an interactive commit
/// whose value equals it is a no-op.
pub fn commit_cell<S: CellStore + ?Sized>(
    target: &mut CommitTarget<'_, S>,
    pos: CellPos,
    value: CellValue,
    original: Option<&CellValue>,
    mode: CommitMode,
    now_ms: f64,
) -> Result<CommitOutcome> {
    let column = target
        .store
        .column_at(pos.col)
        .cloned()
        .ok_or(GridError::UnknownColumn(pos.col))?;
    if !column.is_editable {
        return Err(GridError::ReadOnly(pos.col));
    }
    if mode == CommitMode::Interactive && original == Some(&value) {
        return Ok(CommitOutcome::default());
    }

    let old = target.store.cell_value(pos.row, &column);
    target.store.set_cell_value(pos.row, &column, value.clone())?;

    let body_row = pos.body_row();
    let identity = CellIdentity {
        row: pos.row,
        column: column.key(),
        original_index: body_row.and_then(|row| target.store.original_index(row)),
    };
    if let Err(e) = target.sink.commit_write(&identity, &old, &value, &column) {
        warn!(row = pos.row, column = %identity.column, error = %e, "commit_write failed");
    }

    let valid = match body_row {
        Some(row) => {
            if mode == CommitMode::Paste {
                target.validation.clear_error(&error_key(row, &identity.column));
            }
            target
                .validation
                .validate_cell(row, &column, value, true, now_ms)
        }
        None => None,
    };
    Ok(CommitOutcome {
        written: true,
        valid,
    })
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
    use crate::config::GridConfig;
    use crate::table::TableData;
    use crate::types::{ColumnDescriptor, Row, ValidationOutcome};
    use crate::validation::RuleSet;

    #[derive(Default)]
    struct Recorder {
        writes: Vec<(CellIdentity, CellValue, CellValue)>,
        fail: bool,
    }

    impl CommitSink for Recorder {
        fn commit_write(
            &mut self,
            cell: &CellIdentity,
            old: &CellValue,
            new: &CellValue,
            _column: &ColumnDescriptor,
        ) -> Result<()> {
            self.writes.push((cell.clone(), old.clone(), new.clone()));
            if self.fail {
                return Err(GridError::Commit("offline".into()));
            }
            Ok(())
        }
    }

    fn required(value: &CellValue, _: &str) -> ValidationOutcome {
        if value.is_empty() {
            ValidationOutcome::invalid("Required")
        } else {
            ValidationOutcome::ok()
        }
    }

    fn setup() -> (TableData, ValidationManager) {
        let table = TableData::new(
            vec![
                ColumnDescriptor::new(0, "shortText", "name").with_header("Name"),
                ColumnDescriptor::new(1, "serial", "id").read_only(),
            ],
            vec![Row {
                original_index: Some(12),
                ..Row::new().with("name", "Ada")
            }],
        );
        let validation =
            ValidationManager::new(RuleSet::Local(Box::new(required)), &GridConfig::default());
        (table, validation)
    }

    #[test]
    fn test_unchanged_interactive_commit_is_skipped() {
        let (mut table, mut validation) = setup();
        let mut sink = Recorder::default();
        let mut target = CommitTarget {
            store: &mut table,
            sink: &mut sink,
            validation: &mut validation,
        };
        let original = CellValue::from("Ada");
        let outcome = commit_cell(
            &mut target,
            CellPos::new(0, 0),
            "Ada".into(),
            Some(&original),
            CommitMode::Interactive,
            0.0,
        )
        .unwrap();
        assert!(!outcome.written);
        assert!(sink.writes.is_empty());
    }

    #[test]
    fn test_write_reaches_sink_with_original_index() {
        let (mut table, mut validation) = setup();
        let mut sink = Recorder::default();
        let mut target = CommitTarget {
            store: &mut table,
            sink: &mut sink,
            validation: &mut validation,
        };
        let outcome = commit_cell(
            &mut target,
            CellPos::new(0, 0),
            CellValue::Null,
            None,
            CommitMode::Interactive,
            0.0,
        )
        .unwrap();
        assert_eq!(outcome.valid, Some(false));
        let (identity, old, new) = &sink.writes[0];
        assert_eq!(identity.original_index, Some(12));
        assert_eq!(old, &CellValue::from("Ada"));
        assert_eq!(new, &CellValue::Null);
        assert_eq!(validation.errors().len(), 1);
    }

    #[test]
    fn test_sink_failure_still_updates_state() {
        let (mut table, mut validation) = setup();
        let mut sink = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let mut target = CommitTarget {
            store: &mut table,
            sink: &mut sink,
            validation: &mut validation,
        };
        let outcome = commit_cell(
            &mut target,
            CellPos::new(0, 0),
            CellValue::Null,
            None,
            CommitMode::Paste,
            0.0,
        )
        .unwrap();
        assert!(outcome.written);
        assert_eq!(table.cell_value(0, &table.columns()[0].clone()), CellValue::Null);
        assert_eq!(validation.errors().len(), 1);
    }

    #[test]
    fn test_read_only_and_header_writes() {
        let (mut table, mut validation) = setup();
        let mut sink = Recorder::default();
        let mut target = CommitTarget {
            store: &mut table,
            sink: &mut sink,
            validation: &mut validation,
        };
        let err = commit_cell(
            &mut target,
            CellPos::new(0, 1),
            "7".into(),
            None,
            CommitMode::Paste,
            0.0,
        )
        .unwrap_err();
        assert!(matches!(err, GridError::ReadOnly(1)));

        let header = commit_cell(
            &mut target,
            CellPos::new(-1, 0),
            "Full name".into(),
            None,
            CommitMode::Interactive,
            0.0,
        )
        .unwrap();
        assert_eq!(header.valid, None);
        assert_eq!(table.columns()[0].header, "Full name");
    }
}
