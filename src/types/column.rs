use serde::{Deserialize, Serialize};

use crate::cell_key::{unique_key, ColumnKey};

/// Column type handled by the date-time digit editor.
pub const DATE_TIME_TYPE: &str = "dateTime";

fn default_true() -> bool {
    true
}

fn default_header_row() -> i32 {
    -1
}

/// Describes one logical column.
///
/// Identity is `(column_type, cell_index, group)`; `col_index` is only the
/// current position and changes on reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    /// Current position.
    pub col_index: u32,
    /// Semantic kind, e.g. `shortText`, `dateTime`, `serial`.
    #[serde(rename = "type")]
    pub column_type: String,
    /// Sub-position when several columns share one logical field.
    #[serde(default)]
    pub cell_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Field name on a row.
    pub data_key: String,
    #[serde(default = "default_true")]
    pub is_editable: bool,
    /// Header row this column's header cell lives in.
    #[serde(default = "default_header_row")]
    pub header_row: i32,
    /// Header display text. May contain markup.
    #[serde(default)]
    pub header: String,
}

impl ColumnDescriptor {
    pub fn new(col_index: u32, column_type: &str, data_key: &str) -> Self {
        Self {
            col_index,
            column_type: column_type.to_string(),
            cell_index: 0,
            group: None,
            data_key: data_key.to_string(),
            is_editable: true,
            header_row: default_header_row(),
            header: String::new(),
        }
    }

    #[must_use]
    pub fn with_cell_index(mut self, cell_index: u32) -> Self {
        self.cell_index = cell_index;
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    #[must_use]
    pub fn with_header(mut self, header: &str) -> Self {
        self.header = header.to_string();
        self
    }

    #[must_use]
    pub fn with_header_row(mut self, header_row: i32) -> Self {
        self.header_row = header_row;
        self
    }

    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.is_editable = false;
        self
    }

    /// Structural identity of this column.
    pub fn key(&self) -> ColumnKey {
        unique_key(self)
    }

    pub fn is_date_time(&self) -> bool {
        self.column_type == DATE_TIME_TYPE
    }
}
