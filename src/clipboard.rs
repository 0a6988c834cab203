//! Tab-separated clipboard text.
//!
//! Rows are joined by `\n` and cells by `\t`. A cell containing a tab, a
//! line break or a quote is wrapped in quotes with inner quotes doubled, the
//! way spreadsheet applications write TSV; [`parse_block`] understands the
//! same quoting so such cells survive a copy/paste round trip.

use crate::adapter::CellStore;
use crate::error::{GridError, Result};
use crate::types::CellPos;

/// Quote a cell for TSV when it contains a tab, line break or quote.
pub fn escape_cell(value: &str) -> String {
    let needs_quoting = value.contains(['\t', '\n', '\r', '"']);
    if needs_quoting {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Serialize rows of displayed values.
pub fn serialize_block(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|cell| escape_cell(cell))
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse clipboard text into rows of cells.
///
/// Accepts `\n` and `\r\n` row separators, ignores one trailing line break,
/// and unquotes cells that start with `"`. A quote inside an unquoted cell
/// is kept literally.
pub fn parse_block(text: &str) -> Vec<Vec<String>> {
    let text = text
        .strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text);
    if text.is_empty() {
        return Vec::new();
    }

    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell = String::new();
    let mut chars = text.chars().peekable();
    let mut at_cell_start = true;
    let mut in_quotes = false;

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => in_quotes = false,
                _ => cell.push(ch),
            }
            continue;
        }
        match ch {
            '"' if at_cell_start => {
                in_quotes = true;
                at_cell_start = false;
            }
            '\t' => {
                row.push(std::mem::take(&mut cell));
                at_cell_start = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut cell));
                rows.push(std::mem::take(&mut row));
                at_cell_start = true;
            }
            _ => {
                cell.push(ch);
                at_cell_start = false;
            }
        }
    }
    row.push(cell);
    rows.push(row);
    rows
}

/// Displayed values of the rectangle between `min` and `max` (inclusive),
/// row-major. Header rows yield header text without markup.
pub fn copy_block<S: CellStore + ?Sized>(store: &S, min: CellPos, max: CellPos) -> Vec<Vec<String>> {
    (min.row..=max.row)
        .map(|row| {
            (min.col..=max.col)
                .map(|col| {
                    store
                        .column_at(col)
                        .map(|column| store.cell_value(row, column).display())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect()
}

/// One cell of a paste, clamped to the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteCell {
    pub pos: CellPos,
    pub text: String,
}

/// Lay a parsed block out from `anchor`, dropping cells past the last row
/// or column.
pub fn place_block(
    block: &[Vec<String>],
    anchor: CellPos,
    row_count: usize,
    col_count: u32,
) -> Vec<PasteCell> {
    let row_limit = i64::try_from(row_count).unwrap_or(i64::MAX);
    let mut cells = Vec::new();
    for (dr, values) in block.iter().enumerate() {
        let Some(row) = i64::try_from(dr)
            .ok()
            .map(|dr| i64::from(anchor.row) + dr)
            .filter(|&row| row < row_limit)
            .and_then(|row| i32::try_from(row).ok())
        else {
            break;
        };
        for (dc, text) in values.iter().enumerate() {
            let Some(col) = u32::try_from(dc)
                .ok()
                .and_then(|dc| anchor.col.checked_add(dc))
                .filter(|&col| col < col_count)
            else {
                break;
            };
            cells.push(PasteCell {
                pos: CellPos::new(row, col),
                text: text.clone(),
            });
        }
    }
    cells
}

/// Platform clipboard.
pub trait ClipboardBackend {
    fn write_text(&mut self, text: &str) -> Result<()>;

    fn read_text(&mut self) -> Result<String>;
}

/// In-process clipboard for native hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    text: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl ClipboardBackend for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        self.text = Some(text.to_string());
        Ok(())
    }

    fn read_text(&mut self) -> Result<String> {
        self.text
            .clone()
            .ok_or_else(|| GridError::Clipboard("clipboard is empty".into()))
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

    fn block(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| (*c).to_string()).collect())
            .collect()
    }

    #[test]
    fn test_serialize_plain() {
        let text = serialize_block(&block(&[&["1", "2"], &["3", ""]]));
        assert_eq!(text, "1\t2\n3\t");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_cell("plain"), "plain");
        assert_eq!(escape_cell("a\tb"), "\"a\tb\"");
        assert_eq!(escape_cell("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_round_trip_with_awkward_cells() {
        let original = block(&[&["line\nbreak", "tab\there"], &["\"quoted\"", ""]]);
        assert_eq!(parse_block(&serialize_block(&original)), original);
    }

    #[test]
    fn test_parse_from_spreadsheet() {
        assert_eq!(
            parse_block("a\tb\r\nc\td\r\n"),
            block(&[&["a", "b"], &["c", "d"]])
        );
        assert_eq!(parse_block("5\" screen"), block(&[&["5\" screen"]]));
        assert!(parse_block("").is_empty());
    }

    #[test]
    fn test_place_block_clamps() {
        let cells = place_block(&block(&[&["1", "2", "3"], &["4", "5", "6"]]), CellPos::new(9, 3), 10, 5);
        let positions: Vec<CellPos> = cells.iter().map(|c| c.pos).collect();
        assert_eq!(positions, vec![CellPos::new(9, 3), CellPos::new(9, 4)]);
    }

    #[test]
    fn test_memory_clipboard() {
        let mut clipboard = MemoryClipboard::new();
        assert!(clipboard.read_text().is_err());
        clipboard.write_text("x").unwrap();
        assert_eq!(clipboard.read_text().unwrap(), "x");
    }
}
