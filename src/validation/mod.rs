//! Validation manager.
//!
//! Owns the error map, the per-cell debounce timers and any running bulk
//! revalidation. Rules are supplied by the host; the manager decides when
//! they run and records the outcome under the cell's structural key.

mod bulk;
mod debounce;
mod errors;
mod worker;

pub use bulk::{collect_checks, run_checks, CellCheck, RevalidationJob, RevalidationReport};
pub use debounce::{DebounceQueue, PendingValidation};
pub use errors::ErrorStore;
pub use worker::{SharedRules, WorkerHandle, WorkerMessage};

use std::collections::BTreeSet;

use tracing::debug;

use crate::adapter::{CellStore, GridEvents, ValidationRules};
use crate::cell_key::{error_key, ErrorKey};
use crate::config::GridConfig;
use crate::types::{CellValue, ColumnDescriptor, ValidationOutcome};

/// The rules a manager runs, local to this thread or shareable with a worker.
pub enum RuleSet {
    Local(Box<dyn ValidationRules>),
    Shared(SharedRules),
}

impl RuleSet {
    pub fn get(&self) -> &dyn ValidationRules {
        match self {
            Self::Local(rules) => rules.as_ref(),
            Self::Shared(rules) => rules.as_ref(),
        }
    }

    fn shared(&self) -> Option<SharedRules> {
        match self {
            Self::Local(_) => None,
            Self::Shared(rules) => Some(std::sync::Arc::clone(rules)),
        }
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(_) => f.write_str("RuleSet::Local"),
            Self::Shared(_) => f.write_str("RuleSet::Shared"),
        }
    }
}

/// A bulk revalidation that has not finished yet.
#[derive(Debug)]
pub enum Revalidation {
    Chunked(RevalidationJob),
    Worker(WorkerHandle),
}

/// Result of starting a bulk revalidation.
#[derive(Debug, Clone, PartialEq)]
pub enum RevalidationStatus {
    /// Finished synchronously; the error map is already updated.
    Completed(RevalidationReport),
    /// Continues through [`ValidationManager::poll_revalidation`].
    Pending,
}

#[derive(Debug)]
pub struct ValidationManager {
    rules: RuleSet,
    errors: ErrorStore,
    debounce: DebounceQueue,
    sync_limit: usize,
    chunk_size: usize,
    use_worker: bool,
    running: Option<Revalidation>,
    /// Cells validated or cleared since the running pass took its snapshot.
    settled: BTreeSet<ErrorKey>,
    evaluations: u64,
}

impl ValidationManager {
    pub fn new(rules: RuleSet, config: &GridConfig) -> Self {
        Self {
            rules,
            errors: ErrorStore::new(),
            debounce: DebounceQueue::new(config.debounce_ms),
            sync_limit: config.sync_revalidation_limit,
            chunk_size: config.revalidation_chunk_size,
            use_worker: config.use_worker,
            running: None,
            settled: BTreeSet::new(),
            evaluations: 0,
        }
    }

    pub fn errors(&self) -> &ErrorStore {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorStore {
        &mut self.errors
    }

    pub fn pending(&self) -> &DebounceQueue {
        &self.debounce
    }

    /// Number of single-cell rule evaluations run so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Validate one body cell.
    ///
    /// Any pending timer for the cell is cancelled first. Immediate requests
    /// and empty values are checked now and return the verdict; anything
    /// else arms a debounce timer and returns `None`.
    pub fn validate_cell(
        &mut self,
        row: usize,
        column: &ColumnDescriptor,
        value: CellValue,
        immediate: bool,
        now_ms: f64,
    ) -> Option<bool> {
        let key = error_key(row, &column.key());
        self.debounce.cancel(&key);
        if immediate || value.is_empty() {
            return Some(self.evaluate(key, &value, &column.column_type));
        }
        self.debounce.arm(key, value, &column.column_type, now_ms);
        None
    }

    /// Drop a cell's timer without running it.
    pub fn cancel_pending(&mut self, key: &ErrorKey) -> bool {
        self.debounce.cancel(key)
    }

    /// Remove the error for `key`, if any.
    pub fn clear_error(&mut self, key: &ErrorKey) -> bool {
        self.mark_settled(key);
        self.errors.remove(key).is_some()
    }

    /// Run every timer that is due. Returns how many fired.
    pub fn flush_due(&mut self, now_ms: f64) -> usize {
        let due = self.debounce.take_due(now_ms);
        let fired = due.len();
        for (key, pending) in due {
            self.evaluate(key, &pending.value, &pending.column_type);
        }
        fired
    }

    /// Run every pending timer now.
    pub fn flush_all(&mut self) -> usize {
        let all = self.debounce.take_all();
        let fired = all.len();
        for (key, pending) in all {
            self.evaluate(key, &pending.value, &pending.column_type);
        }
        fired
    }

    /// Rewrite error and timer keys after a structural change.
    pub fn rekey(&mut self, map: impl Fn(&ErrorKey) -> Option<ErrorKey>) -> usize {
        self.debounce.rekey(&map);
        self.settled = self.settled.iter().filter_map(&map).collect();
        self.errors.rekey(&map)
    }

    fn evaluate(&mut self, key: ErrorKey, value: &CellValue, column_type: &str) -> bool {
        self.evaluations += 1;
        self.mark_settled(&key);
        let ValidationOutcome { valid, message } = self.rules.get().validate(value, column_type);
        if valid {
            self.errors.remove(&key);
        } else {
            self.errors.insert(key, message.unwrap_or_default());
        }
        valid
    }

    fn mark_settled(&mut self, key: &ErrorKey) {
        if self.running.is_some() {
            self.settled.insert(key.clone());
        }
    }

    pub fn is_revalidating(&self) -> bool {
        self.running.is_some()
    }

    /// Start revalidating every editable body cell.
    ///
    /// Up to the configured cell limit the pass runs synchronously. Above it,
    /// the pass goes to a worker thread when enabled and possible, otherwise
    /// it becomes a chunked job advanced by [`Self::poll_revalidation`].
    /// Starting a new pass abandons a running one.
    ///
    /// Cells validated while a pass runs keep their newer verdict when the
    /// pass lands; the pass only decides cells nobody touched since its
    /// snapshot.
    pub fn start_revalidation<S: CellStore + ?Sized>(&mut self, store: &S) -> RevalidationStatus {
        self.running = None;
        self.settled.clear();
        let checks = collect_checks(store);
        if checks.len() <= self.sync_limit {
            let report = RevalidationReport::run(&checks, self.rules.get());
            self.apply(&report);
            return RevalidationStatus::Completed(report);
        }

        if self.use_worker {
            match self.rules.shared() {
                Some(rules) => match WorkerHandle::spawn(checks.clone(), rules) {
                    Ok(handle) => {
                        self.running = Some(Revalidation::Worker(handle));
                        return RevalidationStatus::Pending;
                    }
                    Err(e) => debug!(error = %e, "worker unavailable, revalidating in chunks"),
                },
                None => debug!("rules are not shareable, revalidating in chunks"),
            }
        }
        self.running = Some(Revalidation::Chunked(RevalidationJob::new(
            checks,
            self.chunk_size,
        )));
        RevalidationStatus::Pending
    }

    /// Advance a running revalidation by one chunk (or check on the worker).
    /// Returns the report once the pass is complete.
    pub fn poll_revalidation(&mut self, events: &mut dyn GridEvents) -> Option<RevalidationReport> {
        match self.running.take()? {
            Revalidation::Chunked(mut job) => {
                let progress = job.step(self.rules.get());
                events.on_progress(progress);
                if job.is_done() {
                    let report = job.into_report();
                    self.apply(&report);
                    return Some(report);
                }
                self.running = Some(Revalidation::Chunked(job));
                None
            }
            Revalidation::Worker(handle) => match handle.poll() {
                None => {
                    self.running = Some(Revalidation::Worker(handle));
                    None
                }
                Some(WorkerMessage::Completed(report)) => {
                    events.on_progress(100.0);
                    self.apply(&report);
                    Some(report)
                }
                Some(WorkerMessage::Failed(reason)) => {
                    debug!(%reason, "worker failed, revalidating in chunks");
                    let job = RevalidationJob::new(handle.into_checks(), self.chunk_size);
                    self.running = Some(Revalidation::Chunked(job));
                    None
                }
            },
        }
    }

    /// Run a full revalidation to completion, reporting progress per chunk.
    pub fn revalidate_all<S: CellStore + ?Sized>(
        &mut self,
        store: &S,
        events: &mut dyn GridEvents,
    ) -> RevalidationReport {
        if let RevalidationStatus::Completed(report) = self.start_revalidation(store) {
            events.on_progress(100.0);
            return report;
        }
        match self.running.take() {
            Some(Revalidation::Worker(handle)) => match handle.wait() {
                WorkerMessage::Completed(report) => {
                    events.on_progress(100.0);
                    self.apply(&report);
                    return report;
                }
                WorkerMessage::Failed(reason) => {
                    debug!(%reason, "worker failed, revalidating in chunks");
                    let job = RevalidationJob::new(handle.into_checks(), self.chunk_size);
                    self.running = Some(Revalidation::Chunked(job));
                }
            },
            other => self.running = other,
        }
        loop {
            if let Some(report) = self.poll_revalidation(events) {
                return report;
            }
            if self.running.is_none() {
                return RevalidationReport::default();
            }
        }
    }

    /// Abandon a running revalidation, e.g. before a structural change
    /// invalidates its snapshot.
    pub fn cancel_revalidation(&mut self) -> bool {
        let cancelled = self.running.take().is_some();
        self.settled.clear();
        if cancelled {
            debug!("bulk revalidation cancelled");
        }
        cancelled
    }

    fn apply(&mut self, report: &RevalidationReport) {
        let mut errors = report.errors.clone();
        let settled = std::mem::take(&mut self.settled);
        for key in &settled {
            match self.errors.get(key) {
                Some(live) => errors.insert(key.clone(), live.clone()),
                None => errors.remove(key),
            };
        }
        self.errors.replace_all(errors);
        debug!(
            checked = report.checked,
            invalid = report.invalid_count(),
            kept = settled.len(),
            "bulk revalidation finished"
        );
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
    use crate::adapter::NoopEvents;
    use crate::table::TableData;
    use crate::types::Row;
    use std::sync::Arc;

    fn numeric(value: &CellValue, column_type: &str) -> ValidationOutcome {
        match (column_type, value) {
            ("number", CellValue::Text(s)) if s.parse::<f64>().is_err() => {
                ValidationOutcome::invalid("Not a number")
            }
            ("number", CellValue::Null) => ValidationOutcome::invalid("Required"),
            _ => ValidationOutcome::ok(),
        }
    }

    fn column() -> ColumnDescriptor {
        ColumnDescriptor::new(0, "number", "age")
    }

    fn manager(config: &GridConfig) -> ValidationManager {
        ValidationManager::new(RuleSet::Local(Box::new(numeric)), config)
    }

    #[derive(Default)]
    struct Progress(Vec<f32>);

    impl GridEvents for Progress {
        fn on_progress(&mut self, percent: f32) {
            self.0.push(percent);
        }
    }

    #[test]
    fn test_immediate_sets_and_clears() {
        let mut m = manager(&GridConfig::default());
        assert_eq!(m.validate_cell(0, &column(), "abc".into(), true, 0.0), Some(false));
        assert_eq!(m.errors().len(), 1);
        assert_eq!(m.validate_cell(0, &column(), "12".into(), true, 0.0), Some(true));
        assert!(m.errors().is_empty());
    }

    #[test]
    fn test_empty_value_validates_now() {
        let mut m = manager(&GridConfig::default());
        assert_eq!(
            m.validate_cell(0, &column(), CellValue::Null, false, 0.0),
            Some(false)
        );
        assert!(m.pending().is_empty());
    }

    #[test]
    fn test_debounce_collapses_to_last_value() {
        let mut m = manager(&GridConfig::default());
        for (i, text) in ["1", "1x", "1xy", "12"].into_iter().enumerate() {
            let now = i as f64 * 50.0;
            assert_eq!(m.validate_cell(3, &column(), text.into(), false, now), None);
        }
        assert_eq!(m.pending().len(), 1);
        assert_eq!(m.flush_due(300.0), 0);
        assert_eq!(m.flush_due(450.0), 1);
        assert_eq!(m.evaluations(), 1);
        assert!(m.errors().is_empty(), "last value was valid");
    }

    #[test]
    fn test_immediate_cancels_pending_timer() {
        let mut m = manager(&GridConfig::default());
        m.validate_cell(0, &column(), "oops".into(), false, 0.0);
        m.validate_cell(0, &column(), "5".into(), true, 10.0);
        assert!(m.pending().is_empty());
        assert_eq!(m.flush_all(), 0);
        assert!(m.errors().is_empty());
    }

    fn table(rows: usize) -> TableData {
        TableData::new(
            vec![column()],
            (0..rows)
                .map(|i| Row::new().with("age", if i % 10 == 0 { "x" } else { "1" }))
                .collect(),
        )
    }

    #[test]
    fn test_small_dataset_is_synchronous() {
        let mut m = manager(&GridConfig::default());
        match m.start_revalidation(&table(50)) {
            RevalidationStatus::Completed(report) => assert_eq!(report.invalid_count(), 5),
            RevalidationStatus::Pending => panic!("expected a synchronous pass"),
        }
        assert_eq!(m.errors().len(), 5);
    }

    #[test]
    fn test_large_dataset_is_chunked() {
        let config = GridConfig {
            sync_revalidation_limit: 10,
            revalidation_chunk_size: 40,
            ..GridConfig::default()
        };
        let mut m = manager(&config);
        assert_eq!(m.start_revalidation(&table(100)), RevalidationStatus::Pending);
        let mut progress = Progress::default();
        let mut report = None;
        while report.is_none() {
            report = m.poll_revalidation(&mut progress);
        }
        assert_eq!(progress.0, vec![40.0, 80.0, 100.0]);
        assert_eq!(m.errors().len(), 10);
        assert!(!m.is_revalidating());
    }

    #[test]
    fn test_cells_settled_during_a_pass_keep_their_verdict() {
        let config = GridConfig {
            sync_revalidation_limit: 10,
            revalidation_chunk_size: 40,
            ..GridConfig::default()
        };
        let mut m = manager(&config);
        assert_eq!(m.start_revalidation(&table(100)), RevalidationStatus::Pending);
        assert!(m.poll_revalidation(&mut NoopEvents).is_none());

        // Row 50 was fixed and row 51 broken after the snapshot was taken.
        m.validate_cell(50, &column(), "7".into(), true, 0.0);
        m.validate_cell(51, &column(), "bad".into(), true, 0.0);
        while m.poll_revalidation(&mut NoopEvents).is_none() {}

        let key = |row| error_key(row, &column().key());
        assert!(m.errors().get(&key(50)).is_none());
        assert!(m.errors().get(&key(51)).is_some());
        assert!(m.errors().get(&key(60)).is_some(), "untouched cells follow the pass");
        assert_eq!(m.errors().len(), 10);
    }

    #[test]
    fn test_worker_requested_with_local_rules_falls_back() {
        let config = GridConfig {
            sync_revalidation_limit: 10,
            use_worker: true,
            ..GridConfig::default()
        };
        let mut m = manager(&config);
        let report = m.revalidate_all(&table(100), &mut NoopEvents);
        assert_eq!(report.invalid_count(), 10);
        assert_eq!(m.errors().len(), 10);
    }

    #[test]
    fn test_worker_path_gives_same_result() {
        let config = GridConfig {
            sync_revalidation_limit: 10,
            use_worker: true,
            ..GridConfig::default()
        };
        let mut m = ValidationManager::new(RuleSet::Shared(Arc::new(numeric)), &config);
        let report = m.revalidate_all(&table(100), &mut NoopEvents);
        assert_eq!(report.checked, 100);
        assert_eq!(m.errors().len(), 10);
    }
}
