use std::collections::BTreeMap;

use crate::cell_key::{ColumnKey, ErrorKey};
use crate::types::ValidationError;

/// Validation errors keyed by `(row, column identity)`.
///
/// A key holds at most one error; inserting replaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorStore {
    errors: BTreeMap<ErrorKey, ValidationError>,
}

impl ErrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or overwrite) the error for `key`.
    pub fn insert(&mut self, key: ErrorKey, message: impl Into<String>) {
        let error = ValidationError {
            message: message.into(),
            column: key.column.clone(),
            row_index: key.row,
        };
        self.errors.insert(key, error);
    }

    pub fn remove(&mut self, key: &ErrorKey) -> Option<ValidationError> {
        self.errors.remove(key)
    }

    pub fn get(&self, key: &ErrorKey) -> Option<&ValidationError> {
        self.errors.get(key)
    }

    /// Error at a body row for a column identity.
    pub fn at(&self, row: usize, column: &ColumnKey) -> Option<&ValidationError> {
        self.errors.get(&ErrorKey {
            row,
            column: column.clone(),
        })
    }

    pub fn contains(&self, key: &ErrorKey) -> bool {
        self.errors.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ErrorKey, &ValidationError)> {
        self.errors.iter()
    }

    /// Errors of one body row, in column-key order.
    pub fn row(&self, row: usize) -> impl Iterator<Item = &ValidationError> {
        self.errors
            .iter()
            .filter(move |(key, _)| key.row == row)
            .map(|(_, error)| error)
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&ErrorKey, &ValidationError) -> bool) {
        self.errors.retain(|key, error| keep(key, error));
    }

    /// Replace the whole set, as after a full revalidation.
    pub fn replace_all(&mut self, errors: BTreeMap<ErrorKey, ValidationError>) {
        self.errors = errors;
    }

    /// Rewrite every key through `map`; keys mapped to `None` are dropped.
    ///
    /// When two old keys land on the same new key the later one wins, which
    /// keeps the one-error-per-cell rule.
    pub fn rekey(&mut self, mut map: impl FnMut(&ErrorKey) -> Option<ErrorKey>) -> usize {
        let before = self.errors.len();
        let old = std::mem::take(&mut self.errors);
        for (key, mut error) in old {
            if let Some(new_key) = map(&key) {
                error.column = new_key.column.clone();
                error.row_index = new_key.row;
                self.errors.insert(new_key, error);
            }
        }
        before - self.errors.len()
    }

    /// Flat `"{row}_{type}__{cellIndex}[__{group}]" -> message` view for
    /// hosts that index errors by string.
    pub fn to_flat_map(&self) -> BTreeMap<String, String> {
        self.errors
            .iter()
            .map(|(key, error)| (key.to_string(), error.message.clone()))
            .collect()
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
    use crate::cell_key::error_key;

    fn key(row: usize, cell_index: u32) -> ErrorKey {
        error_key(row, &ColumnKey::new("clinicalSymptom", cell_index, None))
    }

    #[test]
    fn test_insert_replaces() {
        let mut store = ErrorStore::new();
        store.insert(key(5, 1), "first");
        store.insert(key(5, 1), "second");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&key(5, 1)).unwrap().message, "second");
    }

    #[test]
    fn test_rekey_drops_and_moves() {
        let mut store = ErrorStore::new();
        store.insert(key(1, 0), "a");
        store.insert(key(5, 1), "b");
        let dropped = store.rekey(|k| (k.row != 1).then(|| k.with_row(k.row - 2)));
        assert_eq!(dropped, 1);
        let moved = store.get(&key(3, 1)).unwrap();
        assert_eq!(moved.row_index, 3);
        assert_eq!(moved.message, "b");
    }

    #[test]
    fn test_flat_map() {
        let mut store = ErrorStore::new();
        store.insert(key(5, 1), "Required");
        let flat = store.to_flat_map();
        assert_eq!(flat.get("5_clinicalSymptom__1").unwrap(), "Required");
    }
}
