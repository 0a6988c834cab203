use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A scalar cell value.
///
/// Untagged so rows deserialize straight from the host's plain JSON records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Value produced by an edit surface. Blank input clears the cell.
    pub fn from_input(text: &str) -> Self {
        if text.trim().is_empty() {
            Self::Null
        } else {
            Self::Text(text.to_string())
        }
    }

    /// Null, or text that is only whitespace.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// The string shown to the user and written to the clipboard.
    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// A field on a row: a scalar, or an array addressed by `cell_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    List(Vec<CellValue>),
    Scalar(CellValue),
}

/// One record of the dataset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
    /// Position in the unfiltered dataset when this row belongs to a derived view.
    #[serde(
        rename = "_originalIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub original_index: Option<usize>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style scalar field.
    #[must_use]
    pub fn with(mut self, data_key: &str, value: impl Into<CellValue>) -> Self {
        self.fields
            .insert(data_key.to_string(), FieldValue::Scalar(value.into()));
        self
    }

    /// Builder-style array field.
    #[must_use]
    pub fn with_list(mut self, data_key: &str, values: Vec<CellValue>) -> Self {
        self.fields
            .insert(data_key.to_string(), FieldValue::List(values));
        self
    }

    /// Value of `data_key`; array fields are addressed by `cell_index`.
    pub fn value(&self, data_key: &str, cell_index: u32) -> Option<&CellValue> {
        match self.fields.get(data_key)? {
            FieldValue::Scalar(v) => (cell_index == 0).then_some(v),
            FieldValue::List(values) => values.get(usize::try_from(cell_index).ok()?),
        }
    }

    /// Write `value` into `data_key`, growing array fields as needed.
    ///
    /// A scalar field written at a non-zero sub-index becomes an array whose
    /// first slot keeps the previous scalar.
    pub fn set_value(&mut self, data_key: &str, cell_index: u32, value: CellValue) {
        let Ok(slot) = usize::try_from(cell_index) else {
            return;
        };
        let field = self
            .fields
            .entry(data_key.to_string())
            .or_insert_with(|| {
                if slot == 0 {
                    FieldValue::Scalar(CellValue::Null)
                } else {
                    FieldValue::List(Vec::new())
                }
            });

        if let FieldValue::Scalar(existing) = field {
            if slot == 0 {
                *existing = value;
                return;
            }
            let first = std::mem::take(existing);
            *field = FieldValue::List(vec![first]);
        }

        if let FieldValue::List(values) = field {
            if values.len() <= slot {
                values.resize(slot + 1, CellValue::Null);
            }
            if let Some(target) = values.get_mut(slot) {
                *target = value;
            }
        }
    }
}
