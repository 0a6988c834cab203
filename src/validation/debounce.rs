use std::collections::BTreeMap;

use crate::cell_key::ErrorKey;
use crate::types::CellValue;

/// A deferred validation waiting for its quiet period to elapse.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingValidation {
    pub value: CellValue,
    pub column_type: String,
    pub due_at: f64,
}

/// Per-cell debounce timers as deadline records.
///
/// Arming a cell replaces its previous timer, so at most one validation is
/// pending per cell.
#[derive(Debug, Clone, Default)]
pub struct DebounceQueue {
    delay_ms: f64,
    pending: BTreeMap<ErrorKey, PendingValidation>,
}

impl DebounceQueue {
    pub fn new(delay_ms: u32) -> Self {
        Self {
            delay_ms: f64::from(delay_ms),
            pending: BTreeMap::new(),
        }
    }

    /// Cancel any timer for `key` and arm a fresh one.
    pub fn arm(&mut self, key: ErrorKey, value: CellValue, column_type: &str, now_ms: f64) {
        self.pending.insert(
            key,
            PendingValidation {
                value,
                column_type: column_type.to_string(),
                due_at: now_ms + self.delay_ms,
            },
        );
    }

    pub fn cancel(&mut self, key: &ErrorKey) -> bool {
        self.pending.remove(key).is_some()
    }

    pub fn is_pending(&self, key: &ErrorKey) -> bool {
        self.pending.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest deadline, for hosts that schedule a single wake-up.
    pub fn next_deadline(&self) -> Option<f64> {
        self.pending
            .values()
            .map(|p| p.due_at)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Remove and return every timer due at `now_ms`.
    pub fn take_due(&mut self, now_ms: f64) -> Vec<(ErrorKey, PendingValidation)> {
        let due: Vec<ErrorKey> = self
            .pending
            .iter()
            .filter(|(_, p)| p.due_at <= now_ms)
            .map(|(key, _)| key.clone())
            .collect();
        due.into_iter()
            .filter_map(|key| self.pending.remove(&key).map(|p| (key, p)))
            .collect()
    }

    /// Remove and return every timer regardless of deadline.
    pub fn take_all(&mut self) -> Vec<(ErrorKey, PendingValidation)> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    /// Rewrite pending keys after a structural change; `None` cancels.
    pub fn rekey(&mut self, mut map: impl FnMut(&ErrorKey) -> Option<ErrorKey>) {
        let old = std::mem::take(&mut self.pending);
        for (key, pending) in old {
            if let Some(new_key) = map(&key) {
                self.pending.insert(new_key, pending);
            }
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
    use crate::cell_key::ColumnKey;

    fn key(row: usize) -> ErrorKey {
        ErrorKey {
            row,
            column: ColumnKey::new("shortText", 0, None),
        }
    }

    #[test]
    fn test_rearm_replaces_value_and_deadline() {
        let mut queue = DebounceQueue::new(300);
        queue.arm(key(0), "a".into(), "shortText", 0.0);
        queue.arm(key(0), "ab".into(), "shortText", 100.0);
        assert_eq!(queue.len(), 1);
        assert!(queue.take_due(350.0).is_empty());
        let fired = queue.take_due(400.0);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].1.value, CellValue::Text("ab".into()));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_next_deadline() {
        let mut queue = DebounceQueue::new(300);
        assert_eq!(queue.next_deadline(), None);
        queue.arm(key(1), "x".into(), "shortText", 50.0);
        queue.arm(key(2), "y".into(), "shortText", 10.0);
        assert_eq!(queue.next_deadline(), Some(310.0));
    }
}
