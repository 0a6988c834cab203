//! Keeps validation errors attached to the right cells across structural
//! mutations.
//!
//! Row changes shift the row part of each key. Column changes only matter
//! when a column's identity `(type, cell_index, group)` changes, which
//! happens when a repeated field gains or loses sub-columns and the
//! sub-indices are renumbered. Reorders leave identities alone and leave the
//! error set untouched.
//!
//! After a column remap, [`prune_orphans`] drops errors that no longer name
//! an existing column, and relocated errors that would land on an empty cell.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::adapter::CellStore;
use crate::cell_key::{find_column, ColumnClass, ColumnKey, ErrorKey};
use crate::table::strip_markup;
use crate::types::ColumnDescriptor;
use crate::validation::{ErrorStore, ValidationManager};

/// Key map for `count` rows inserted before row `at`.
pub fn rows_inserted(at: usize, count: usize) -> impl Fn(&ErrorKey) -> Option<ErrorKey> {
    move |key| {
        if key.row >= at {
            Some(key.with_row(key.row + count))
        } else {
            Some(key.clone())
        }
    }
}

/// Key map for the rows at `deleted` removed.
///
/// Errors on deleted rows are dropped; survivors move up by the number of
/// deleted rows above them.
pub fn rows_deleted(deleted: &[usize]) -> impl Fn(&ErrorKey) -> Option<ErrorKey> {
    let mut deleted = deleted.to_vec();
    deleted.sort_unstable();
    deleted.dedup();
    move |key| match deleted.binary_search(&key.row) {
        Ok(_) => None,
        Err(below) => Some(key.with_row(key.row - below)),
    }
}

/// How the sub-indices of one column class move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassShift {
    /// `count` sub-columns inserted at sub-index `at`.
    Inserted { at: u32, count: u32 },
    /// `count` sub-columns removed starting at sub-index `at`.
    Deleted { at: u32, count: u32 },
    /// Explicit old → new sub-index map; old sub-indices absent from the map
    /// were removed.
    Aligned(BTreeMap<u32, u32>),
}

impl ClassShift {
    fn map(&self, cell_index: u32) -> Option<u32> {
        match *self {
            Self::Inserted { at, count } if cell_index >= at => cell_index.checked_add(count),
            Self::Inserted { .. } => Some(cell_index),
            Self::Deleted { at, .. } if cell_index < at => Some(cell_index),
            Self::Deleted { at, count } if cell_index < at.saturating_add(count) => None,
            Self::Deleted { count, .. } => Some(cell_index - count),
            Self::Aligned(ref map) => map.get(&cell_index).copied(),
        }
    }
}

/// Per-class sub-index moves for one column mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRemap {
    shifts: BTreeMap<ColumnClass, ClassShift>,
}

impl ColumnRemap {
    /// No moves.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Explicit insertion of `count` sub-columns at `at` in `class`.
    pub fn insert_columns(class: ColumnClass, at: u32, count: u32) -> Self {
        let mut remap = Self::default();
        remap.shifts.insert(class, ClassShift::Inserted { at, count });
        remap
    }

    /// Explicit deletion of `count` sub-columns at `at` in `class`.
    pub fn delete_columns(class: ColumnClass, at: u32, count: u32) -> Self {
        let mut remap = Self::default();
        remap.shifts.insert(class, ClassShift::Deleted { at, count });
        remap
    }

    /// Infer the moves between two column sets.
    ///
    /// Columns are grouped by `(type, group)`. A class whose size did not
    /// change keeps its identities. A class that grew or shrank is aligned
    /// old-to-new by longest common subsequence on `(data_key, header)`;
    /// unmatched new columns are insertions, unmatched old columns are
    /// deletions. When every column of a class looks alike the alignment
    /// favors the front, so growth is read as an append; use
    /// [`Self::insert_columns`] / [`Self::delete_columns`] when the exact
    /// point is known.
    pub fn between(old: &[ColumnDescriptor], new: &[ColumnDescriptor]) -> Self {
        let old_classes = by_class(old);
        let new_classes = by_class(new);
        let mut remap = Self::default();
        for (class, old_cols) in &old_classes {
            let new_cols = new_classes.get(class).map_or(&[][..], Vec::as_slice);
            if old_cols.len() == new_cols.len() {
                continue;
            }
            let map = align(old_cols, new_cols);
            debug!(
                column_type = %class.column_type,
                old = old_cols.len(),
                new = new_cols.len(),
                "column class resized"
            );
            remap.shifts.insert(class.clone(), ClassShift::Aligned(map));
        }
        remap
    }

    pub fn is_identity(&self) -> bool {
        self.shifts.is_empty()
    }

    pub fn shift(&self, class: &ColumnClass) -> Option<&ClassShift> {
        self.shifts.get(class)
    }

    /// New identity for `key`, or `None` when its column was removed.
    pub fn map_column(&self, key: &ColumnKey) -> Option<ColumnKey> {
        match self.shifts.get(&key.class()) {
            None => Some(key.clone()),
            Some(shift) => shift.map(key.cell_index).map(|i| key.with_cell_index(i)),
        }
    }

    /// Same as [`Self::map_column`] for a full error key.
    pub fn map_key(&self, key: &ErrorKey) -> Option<ErrorKey> {
        self.map_column(&key.column).map(|column| ErrorKey {
            row: key.row,
            column,
        })
    }
}

fn by_class(columns: &[ColumnDescriptor]) -> BTreeMap<ColumnClass, Vec<&ColumnDescriptor>> {
    let mut sorted: Vec<&ColumnDescriptor> = columns.iter().collect();
    sorted.sort_by_key(|c| c.col_index);
    let mut classes: BTreeMap<ColumnClass, Vec<&ColumnDescriptor>> = BTreeMap::new();
    for column in sorted {
        classes.entry(ColumnClass::of(column)).or_default().push(column);
    }
    classes
}

fn same_field(a: &ColumnDescriptor, b: &ColumnDescriptor) -> bool {
    a.data_key == b.data_key && strip_markup(&a.header) == strip_markup(&b.header)
}

/// Old → new sub-index map from an LCS alignment of two column runs.
fn align(old: &[&ColumnDescriptor], new: &[&ColumnDescriptor]) -> BTreeMap<u32, u32> {
    let (n, m) = (old.len(), new.len());
    // lengths[i][j] = LCS length of old[i..] and new[j..]
    let mut lengths = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            let value = match (old.get(i), new.get(j)) {
                (Some(a), Some(b)) if same_field(a, b) => lcs_at(&lengths, i + 1, j + 1) + 1,
                _ => lcs_at(&lengths, i + 1, j).max(lcs_at(&lengths, i, j + 1)),
            };
            if let Some(cell) = lengths.get_mut(i).and_then(|row| row.get_mut(j)) {
                *cell = value;
            }
        }
    }

    let mut map = BTreeMap::new();
    let (mut i, mut j) = (0, 0);
    while let (Some(a), Some(b)) = (old.get(i), new.get(j)) {
        if same_field(a, b) {
            map.insert(a.cell_index, b.cell_index);
            i += 1;
            j += 1;
        } else if lcs_at(&lengths, i + 1, j) >= lcs_at(&lengths, i, j + 1) {
            i += 1;
        } else {
            j += 1;
        }
    }
    map
}

fn lcs_at(lengths: &[Vec<usize>], i: usize, j: usize) -> usize {
    lengths
        .get(i)
        .and_then(|row| row.get(j))
        .copied()
        .unwrap_or(0)
}

/// Drop errors whose row or column no longer exists, and relocated errors
/// that would now sit on an empty cell.
pub fn prune_orphans<S: CellStore + ?Sized>(
    errors: &mut ErrorStore,
    store: &S,
    relocated: &BTreeSet<ErrorKey>,
) -> usize {
    let before = errors.len();
    errors.retain(|key, _| {
        let Some(column) = find_column(store.columns(), &key.column) else {
            return false;
        };
        let Ok(row) = i32::try_from(key.row) else {
            return false;
        };
        if key.row >= store.row_count() {
            return false;
        }
        !relocated.contains(key) || !store.cell_value(row, column).is_empty()
    });
    let dropped = before - errors.len();
    if dropped > 0 {
        debug!(dropped, "dropped orphaned validation errors");
    }
    dropped
}

/// Apply a row insertion to the manager's errors and timers.
pub fn apply_rows_inserted(validation: &mut ValidationManager, at: usize, count: usize) {
    validation.rekey(rows_inserted(at, count));
}

/// Apply a row deletion to the manager's errors and timers.
pub fn apply_rows_deleted(validation: &mut ValidationManager, deleted: &[usize]) {
    let dropped = validation.rekey(rows_deleted(deleted));
    debug!(rows = deleted.len(), dropped, "rows deleted");
}

/// Apply a column remap, then prune against the store's new shape.
/// Returns the number of errors dropped.
pub fn apply_column_remap<S: CellStore + ?Sized>(
    validation: &mut ValidationManager,
    remap: &ColumnRemap,
    store: &S,
) -> usize {
    let relocated: BTreeSet<ErrorKey> = validation
        .errors()
        .iter()
        .filter_map(|(key, _)| remap.map_key(key).filter(|moved| moved != key))
        .collect();
    let dropped = if remap.is_identity() {
        0
    } else {
        validation.rekey(|key| remap.map_key(key))
    };
    dropped + prune_orphans(validation.errors_mut(), store, &relocated)
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

    fn symptom(row: usize, cell_index: u32) -> ErrorKey {
        error_key(row, &ColumnKey::new("clinicalSymptom", cell_index, None))
    }

    fn symptom_col(col_index: u32, cell_index: u32, header: &str) -> ColumnDescriptor {
        ColumnDescriptor::new(col_index, "clinicalSymptom", "symptoms")
            .with_cell_index(cell_index)
            .with_header(header)
    }

    #[test]
    fn test_row_insert_shift() {
        let map = rows_inserted(3, 2);
        assert_eq!(map(&symptom(2, 0)), Some(symptom(2, 0)));
        assert_eq!(map(&symptom(3, 0)), Some(symptom(5, 0)));
    }

    #[test]
    fn test_row_delete_shift() {
        let map = rows_deleted(&[3, 1]);
        assert_eq!(map(&symptom(0, 1)), Some(symptom(0, 1)));
        assert_eq!(map(&symptom(1, 1)), None);
        assert_eq!(map(&symptom(2, 1)), Some(symptom(1, 1)));
        assert_eq!(map(&symptom(5, 1)), Some(symptom(3, 1)));
    }

    #[test]
    fn test_reorder_is_identity() {
        let old = vec![
            ColumnDescriptor::new(0, "shortText", "name"),
            symptom_col(1, 0, "A"),
            symptom_col(2, 1, "B"),
        ];
        let new = vec![
            symptom_col(0, 1, "B"),
            ColumnDescriptor::new(1, "shortText", "name"),
            symptom_col(2, 0, "A"),
        ];
        assert!(ColumnRemap::between(&old, &new).is_identity());
    }

    #[test]
    fn test_insert_in_middle_found_by_alignment() {
        let old = vec![symptom_col(0, 0, "Fever"), symptom_col(1, 1, "Cough")];
        let new = vec![
            symptom_col(0, 0, "Fever"),
            symptom_col(1, 1, "Rash"),
            symptom_col(2, 2, "Cough"),
        ];
        let remap = ColumnRemap::between(&old, &new);
        assert_eq!(remap.map_key(&symptom(4, 0)), Some(symptom(4, 0)));
        assert_eq!(remap.map_key(&symptom(4, 1)), Some(symptom(4, 2)));
    }

    #[test]
    fn test_delete_found_by_alignment() {
        let old = vec![
            symptom_col(0, 0, "Fever"),
            symptom_col(1, 1, "Rash"),
            symptom_col(2, 2, "Cough"),
        ];
        let new = vec![symptom_col(0, 0, "Fever"), symptom_col(1, 1, "Cough")];
        let remap = ColumnRemap::between(&old, &new);
        assert_eq!(remap.map_key(&symptom(0, 1)), None);
        assert_eq!(remap.map_key(&symptom(0, 2)), Some(symptom(0, 1)));
    }

    #[test]
    fn test_explicit_insert_and_delete() {
        let class = ColumnKey::new("clinicalSymptom", 0, None).class();
        let insert = ColumnRemap::insert_columns(class.clone(), 1, 2);
        assert_eq!(insert.map_key(&symptom(0, 0)), Some(symptom(0, 0)));
        assert_eq!(insert.map_key(&symptom(0, 1)), Some(symptom(0, 3)));

        let delete = ColumnRemap::delete_columns(class, 1, 1);
        assert_eq!(delete.map_key(&symptom(0, 1)), None);
        assert_eq!(delete.map_key(&symptom(0, 2)), Some(symptom(0, 1)));
        assert_eq!(delete.map_key(&symptom(0, 0)), Some(symptom(0, 0)));
    }

    #[test]
    fn test_other_classes_untouched() {
        let class = ColumnKey::new("clinicalSymptom", 0, None).class();
        let remap = ColumnRemap::delete_columns(class, 0, 1);
        let other = error_key(2, &ColumnKey::new("shortText", 0, None));
        assert_eq!(remap.map_key(&other), Some(other.clone()));
    }
}
