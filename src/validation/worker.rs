//! Background revalidation on a dedicated thread.
//!
//! The worker owns its snapshot of the cells and a shared rule set. It talks
//! to the grid only through one message: the complete report, or a failure.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use tracing::debug;

use super::bulk::{CellCheck, RevalidationReport};
use crate::adapter::ValidationRules;
use crate::error::{GridError, Result};

/// Rule set that can cross into the worker thread.
pub type SharedRules = Arc<dyn ValidationRules + Send + Sync>;

/// The worker's single reply.
#[derive(Debug)]
pub enum WorkerMessage {
    Completed(RevalidationReport),
    Failed(String),
}

/// Handle to a running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    rx: Receiver<WorkerMessage>,
    checks: Vec<CellCheck>,
}

impl WorkerHandle {
    /// Start a worker over `checks`. Fails when the platform cannot spawn
    /// threads.
    pub fn spawn(checks: Vec<CellCheck>, rules: SharedRules) -> Result<Self> {
        let (tx, rx) = bounded(1);
        let snapshot = checks.clone();
        thread::Builder::new()
            .name("cellgrid-revalidate".into())
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    RevalidationReport::run(&snapshot, rules.as_ref())
                }));
                let message = match result {
                    Ok(report) => WorkerMessage::Completed(report),
                    Err(_) => WorkerMessage::Failed("rule evaluation panicked".into()),
                };
                // The receiver may already be gone if the job was cancelled.
                let _ = tx.send(message);
            })
            .map_err(|e| GridError::Worker(e.to_string()))?;
        debug!(cells = checks.len(), "revalidation worker started");
        Ok(Self { rx, checks })
    }

    /// Non-blocking check for the worker's reply.
    pub fn poll(&self) -> Option<WorkerMessage> {
        match self.rx.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(WorkerMessage::Failed(
                "worker exited without a result".into(),
            )),
        }
    }

    /// Block until the worker replies.
    pub fn wait(&self) -> WorkerMessage {
        self.rx
            .recv()
            .unwrap_or_else(|_| WorkerMessage::Failed("worker exited without a result".into()))
    }

    /// Give back the snapshot for a synchronous retry.
    pub fn into_checks(self) -> Vec<CellCheck> {
        self.checks
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
    use crate::cell_key::{error_key, ColumnKey};
    use crate::types::{CellValue, ValidationOutcome};

    fn checks() -> Vec<CellCheck> {
        (0..4)
            .map(|row| CellCheck {
                key: error_key(row, &ColumnKey::new("shortText", 0, None)),
                value: if row == 2 {
                    CellValue::Null
                } else {
                    "ok".into()
                },
                column_type: "shortText".into(),
            })
            .collect()
    }

    fn required(value: &CellValue, _: &str) -> ValidationOutcome {
        if value.is_empty() {
            ValidationOutcome::invalid("Required")
        } else {
            ValidationOutcome::ok()
        }
    }

    #[test]
    fn test_worker_reports_all_invalid_cells() {
        let handle = WorkerHandle::spawn(checks(), Arc::new(required)).unwrap();
        match handle.wait() {
            WorkerMessage::Completed(report) => {
                assert_eq!(report.checked, 4);
                assert_eq!(report.invalid_count(), 1);
                assert!(report.errors.keys().all(|k| k.row == 2));
            }
            WorkerMessage::Failed(e) => panic!("worker failed: {e}"),
        }
    }

    #[test]
    fn test_panicking_rules_become_failure() {
        let rules: SharedRules = Arc::new(|_: &CellValue, _: &str| -> ValidationOutcome {
            panic!("bad rule");
        });
        let handle = WorkerHandle::spawn(checks(), rules).unwrap();
        assert!(matches!(handle.wait(), WorkerMessage::Failed(_)));
        assert_eq!(handle.into_checks().len(), 4);
    }
}
