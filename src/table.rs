//! In-memory dataset: column descriptors plus keyed rows.

use serde::{Deserialize, Serialize};

use crate::adapter::{CellStore, StructureStore};
use crate::error::{GridError, Result};
use crate::types::{CellValue, ColumnDescriptor, Row};

/// Columns in position order plus the body rows.
///
/// Column positions are normalized on every update so that
/// `columns[i].col_index == i`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Row>,
}

impl TableData {
    pub fn new(columns: Vec<ColumnDescriptor>, rows: Vec<Row>) -> Self {
        let mut table = Self {
            columns: Vec::new(),
            rows,
        };
        table.set_columns(columns);
        table
    }

    /// Parse columns and rows from the host's JSON arrays.
    pub fn from_json(columns_json: &str, rows_json: &str) -> Result<Self> {
        let columns: Vec<ColumnDescriptor> = serde_json::from_str(columns_json)?;
        let rows: Vec<Row> = serde_json::from_str(rows_json)?;
        Ok(Self::new(columns, rows))
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Replace the column set, ordering by `col_index` and renumbering.
    pub fn set_columns(&mut self, mut columns: Vec<ColumnDescriptor>) {
        columns.sort_by_key(|c| c.col_index);
        for (i, column) in columns.iter_mut().enumerate() {
            column.col_index = u32::try_from(i).unwrap_or(u32::MAX);
        }
        self.columns = columns;
    }

    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
    }

    /// Insert `count` empty rows before `at` (clamped to the end).
    pub fn insert_rows(&mut self, at: usize, count: usize) -> usize {
        let at = at.min(self.rows.len());
        self.rows
            .splice(at..at, std::iter::repeat_with(Row::new).take(count));
        at
    }

    /// Remove the rows at `indices`. Returns the removed indices, sorted and
    /// deduplicated, ignoring any past the end.
    pub fn delete_rows(&mut self, indices: &[usize]) -> Vec<usize> {
        let mut removed: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.rows.len())
            .collect();
        removed.sort_unstable();
        removed.dedup();
        for &i in removed.iter().rev() {
            self.rows.remove(i);
        }
        removed
    }
}

impl CellStore for TableData {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn cell_value(&self, row: i32, column: &ColumnDescriptor) -> CellValue {
        match usize::try_from(row) {
            Ok(row) => self
                .rows
                .get(row)
                .and_then(|r| r.value(&column.data_key, column.cell_index))
                .cloned()
                .unwrap_or_default(),
            Err(_) if row == column.header_row => CellValue::from_input(&strip_markup(&column.header)),
            Err(_) => CellValue::Null,
        }
    }

    fn set_cell_value(
        &mut self,
        row: i32,
        column: &ColumnDescriptor,
        value: CellValue,
    ) -> Result<()> {
        let col = column.col_index;
        match usize::try_from(row) {
            Ok(index) => {
                let target = self
                    .rows
                    .get_mut(index)
                    .ok_or(GridError::OutOfBounds { row, col })?;
                target.set_value(&column.data_key, column.cell_index, value);
                Ok(())
            }
            Err(_) => {
                let header = self
                    .columns
                    .iter_mut()
                    .find(|c| c.col_index == col && c.header_row == row)
                    .ok_or(GridError::OutOfBounds { row, col })?;
                header.header = value.display();
                Ok(())
            }
        }
    }

    fn original_index(&self, row: usize) -> Option<usize> {
        self.rows.get(row).and_then(|r| r.original_index)
    }
}

impl StructureStore for TableData {
    fn insert_rows(&mut self, at: usize, count: usize) -> usize {
        TableData::insert_rows(self, at, count)
    }

    fn delete_rows(&mut self, indices: &[usize]) -> Vec<usize> {
        TableData::delete_rows(self, indices)
    }

    fn set_columns(&mut self, columns: Vec<ColumnDescriptor>) {
        TableData::set_columns(self, columns);
    }
}

/// Header display text: tags removed, line breaks and runs of whitespace
/// collapsed to one space.
pub fn strip_markup(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut tag: Option<String> = None;
    for ch in text.chars() {
        if let Some(name) = tag.as_mut() {
            if ch == '>' {
                let name = name.trim_start_matches('/').to_ascii_lowercase();
                if ["br", "p", "div", "li"]
                    .iter()
                    .any(|block| name.starts_with(block))
                {
                    plain.push(' ');
                }
                tag = None;
            } else {
                name.push(ch);
            }
        } else if ch == '<' {
            tag = Some(String::new());
        } else {
            plain.push(ch);
        }
    }
    let plain = plain
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    plain.split_whitespace().collect::<Vec<_>>().join(" ")
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

    fn table() -> TableData {
        TableData::new(
            vec![
                ColumnDescriptor::new(1, "symptom", "symptoms").with_cell_index(0),
                ColumnDescriptor::new(0, "shortText", "name").with_header("Patient<br/>name"),
                ColumnDescriptor::new(2, "symptom", "symptoms").with_cell_index(1),
            ],
            vec![
                Row::new()
                    .with("name", "Ada")
                    .with_list("symptoms", vec!["fever".into(), CellValue::Null]),
                Row::new().with("name", "Bob"),
            ],
        )
    }

    #[test]
    fn test_columns_normalized() {
        let t = table();
        let positions: Vec<u32> = t.columns().iter().map(|c| c.col_index).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(t.columns()[0].data_key, "name");
    }

    #[test]
    fn test_read_by_cell_index() {
        let t = table();
        let c1 = t.column_at(1).unwrap().clone();
        assert_eq!(t.cell_value(0, &c1), CellValue::Text("fever".into()));
        assert_eq!(t.cell_value(1, &c1), CellValue::Null);
    }

    #[test]
    fn test_header_text_without_markup() {
        let t = table();
        let c0 = t.column_at(0).unwrap().clone();
        assert_eq!(t.cell_value(-1, &c0), CellValue::Text("Patient name".into()));
        assert_eq!(t.cell_value(-2, &c0), CellValue::Null);
    }

    #[test]
    fn test_write_grows_list() {
        let mut t = table();
        let c2 = t.column_at(2).unwrap().clone();
        t.set_cell_value(1, &c2, "cough".into()).unwrap();
        assert_eq!(t.cell_value(1, &c2), CellValue::Text("cough".into()));
        assert!(t.set_cell_value(9, &c2, "x".into()).is_err());
    }

    #[test]
    fn test_insert_and_delete_rows() {
        let mut t = table();
        t.insert_rows(1, 2);
        assert_eq!(t.row_count(), 4);
        let removed = t.delete_rows(&[3, 1, 1, 99]);
        assert_eq!(removed, vec![1, 3]);
        assert_eq!(t.row_count(), 2);
    }

    #[test]
    fn test_rows_from_json_keep_original_index() {
        let t = TableData::from_json(
            r#"[{"colIndex":0,"type":"shortText","dataKey":"name"}]"#,
            r#"[{"name":"Ada","_originalIndex":7},{"name":null,"flags":[true,1.5]}]"#,
        )
        .unwrap();
        assert_eq!(t.original_index(0), Some(7));
        assert_eq!(t.original_index(1), None);
        assert_eq!(
            t.row(1).unwrap().value("flags", 1),
            Some(&CellValue::Number(1.5))
        );
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("<b>Age</b>&nbsp;(years)"), "Age (years)");
        assert_eq!(strip_markup("plain"), "plain");
    }
}
