//! Structural identity of columns and cells.
//!
//! A column's position (`col_index`) shifts on every insert, delete or
//! reorder. Its identity does not: identity is the triple
//! `(type, cell_index, group)`. Validation errors are keyed by
//! `(row, identity)` so they follow the logical column around.
//!
//! Keys are structured values. They are only ever flattened to strings for
//! display or for hosts that need a flat dictionary key; nothing in this
//! crate parses a flattened key back.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ColumnDescriptor;

/// Separator between the parts of a flattened column key.
const KEY_SEPARATOR: &str = "__";

/// Identity of a logical column, independent of its on-screen position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnKey {
    /// Semantic kind of the column (e.g. `shortText`, `dateTime`).
    #[serde(rename = "type")]
    pub column_type: String,
    /// Sub-position when several columns share one logical field.
    pub cell_index: u32,
    /// Optional further partition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl ColumnKey {
    pub fn new(column_type: impl Into<String>, cell_index: u32, group: Option<String>) -> Self {
        Self {
            column_type: column_type.into(),
            cell_index,
            group,
        }
    }

    /// The class this key belongs to: all columns sharing type and group.
    pub fn class(&self) -> ColumnClass {
        ColumnClass {
            column_type: self.column_type.clone(),
            group: self.group.clone(),
        }
    }

    /// Whether this key belongs to `class`.
    pub fn is_in(&self, class: &ColumnClass) -> bool {
        self.column_type == class.column_type && self.group == class.group
    }

    /// Copy of this key pointing at another sub-index of the same class.
    #[must_use]
    pub fn with_cell_index(&self, cell_index: u32) -> Self {
        Self {
            column_type: self.column_type.clone(),
            cell_index,
            group: self.group.clone(),
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.column_type, self.cell_index)?;
        if let Some(group) = &self.group {
            write!(f, "{KEY_SEPARATOR}{group}")?;
        }
        Ok(())
    }
}

/// Columns that share a type and group. Sub-indices are counted per class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnClass {
    pub column_type: String,
    pub group: Option<String>,
}

impl ColumnClass {
    pub fn of(column: &ColumnDescriptor) -> Self {
        Self {
            column_type: column.column_type.clone(),
            group: column.group.clone(),
        }
    }
}

/// Composite key of a validation error: a body row plus a column identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ErrorKey {
    pub row: usize,
    pub column: ColumnKey,
}

impl ErrorKey {
    /// Same column, different row.
    #[must_use]
    pub fn with_row(&self, row: usize) -> Self {
        Self {
            row,
            column: self.column.clone(),
        }
    }
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.row, self.column)
    }
}

/// Unique (structural) key of a column descriptor.
pub fn unique_key(column: &ColumnDescriptor) -> ColumnKey {
    ColumnKey::new(
        column.column_type.clone(),
        column.cell_index,
        column.group.clone(),
    )
}

/// Build the error key for `(row, key)`.
pub fn error_key(row: usize, key: &ColumnKey) -> ErrorKey {
    ErrorKey {
        row,
        column: key.clone(),
    }
}

/// Find the column currently carrying `key`.
pub fn find_column<'a>(columns: &'a [ColumnDescriptor], key: &ColumnKey) -> Option<&'a ColumnDescriptor> {
    columns.iter().find(|c| {
        c.cell_index == key.cell_index && c.column_type == key.column_type && c.group == key.group
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

    #[test]
    fn test_flattened_keys() {
        let key = ColumnKey::new("clinicalSymptom", 1, None);
        assert_eq!(key.to_string(), "clinicalSymptom__1");
        assert_eq!(error_key(5, &key).to_string(), "5_clinicalSymptom__1");

        let grouped = ColumnKey::new("flag", 0, Some("visit_2".into()));
        assert_eq!(grouped.to_string(), "flag__0__visit_2");
    }

    #[test]
    fn test_identity_ignores_position() {
        let a = ColumnDescriptor::new(3, "shortText", "name");
        let mut b = a.clone();
        b.col_index = 7;
        assert_eq!(unique_key(&a), unique_key(&b));
    }

    #[test]
    fn test_underscores_in_type_do_not_collide() {
        // "a_b" + 1 and "a" + ... would be ambiguous if keys were split on '_'.
        let left = error_key(1, &ColumnKey::new("a_b", 1, None));
        let right = error_key(1, &ColumnKey::new("a", 1, Some("b".into())));
        assert_ne!(left, right);
    }

    #[test]
    fn test_find_column_by_identity() {
        let columns = vec![
            ColumnDescriptor::new(0, "symptom", "symptoms").with_cell_index(0),
            ColumnDescriptor::new(1, "symptom", "symptoms").with_cell_index(1),
        ];
        let found = find_column(&columns, &ColumnKey::new("symptom", 1, None)).unwrap();
        assert_eq!(found.col_index, 1);
        assert!(find_column(&columns, &ColumnKey::new("symptom", 2, None)).is_none());
    }
}
