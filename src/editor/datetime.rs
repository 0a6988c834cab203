//! Digit-buffer editor for `dateTime` columns.
//!
//! Typed digits fill a fixed `YYYYMMDDHHmm` buffer. The surface shows the
//! buffer through the `YYYY/MM/DD HH:mm` template with `-` in every slot not
//! typed yet, so the user always sees where the next digit lands.

use chrono::{NaiveDate, NaiveDateTime};

use super::session::{EditCommit, EditingSession, OpenRequest};
use crate::types::{CellPos, CellValue};

/// Digits in a full `YYYYMMDDHHmm` value.
pub const DATE_TIME_DIGITS: usize = 12;

/// Display template; `#` marks a digit slot.
const TEMPLATE: &str = "####/##/## ##:##";

const PLACEHOLDER: char = '-';

/// Render digits through the template, padding untyped slots.
pub fn render_digits(digits: &str) -> String {
    let mut typed = digits.chars();
    TEMPLATE
        .chars()
        .map(|slot| match slot {
            '#' => typed.next().unwrap_or(PLACEHOLDER),
            literal => literal,
        })
        .collect()
}

/// Parse a full 12-digit buffer. `None` when incomplete or not a real
/// calendar date and time.
pub fn parse_digits(digits: &str) -> Option<NaiveDateTime> {
    if digits.len() != DATE_TIME_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let field = |from: usize, to: usize| digits.get(from..to)?.parse::<u32>().ok();
    let year = i32::try_from(field(0, 4)?).ok()?;
    NaiveDate::from_ymd_opt(year, field(4, 6)?, field(6, 8)?)?.and_hms_opt(
        field(8, 10)?,
        field(10, 12)?,
        0,
    )
}

/// Canonical stored form of a date-time value.
pub fn format_date_time(value: &NaiveDateTime) -> String {
    value.format("%Y/%m/%d %H:%M").to_string()
}

/// Digits of an existing value, e.g. `"2024/03/09 14:05"` → `"202403091405"`.
fn digits_of(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_digit)
        .take(DATE_TIME_DIGITS)
        .collect()
}

#[derive(Debug, Clone)]
struct OpenEdit {
    pos: CellPos,
    original: CellValue,
    digits: String,
}

/// Editor accumulating raw digits into a fixed date-time buffer.
#[derive(Debug, Clone, Default)]
pub struct DateTimeEditor {
    edit: Option<OpenEdit>,
}

impl DateTimeEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn digits(&self) -> &str {
        self.edit.as_ref().map_or("", |e| e.digits.as_str())
    }

    /// The formatted value when the buffer holds a complete, valid date-time.
    pub fn candidate(&self) -> Option<String> {
        parse_digits(self.digits()).map(|dt| format_date_time(&dt))
    }

    pub fn push_digit(&mut self, digit: char) -> bool {
        match self.edit.as_mut() {
            Some(edit) if digit.is_ascii_digit() && edit.digits.len() < DATE_TIME_DIGITS => {
                edit.digits.push(digit);
                true
            }
            _ => false,
        }
    }

    fn commit_with(&mut self, value: CellValue) -> Option<EditCommit> {
        let edit = self.edit.take()?;
        Some(EditCommit {
            pos: edit.pos,
            value,
            original: edit.original,
        })
    }
}

impl EditingSession for DateTimeEditor {
    fn open(&mut self, request: OpenRequest) {
        let digits = digits_of(&request.seed_text());
        self.edit = Some(OpenEdit {
            pos: request.pos,
            original: request.current,
            digits,
        });
    }

    fn is_open(&self) -> bool {
        self.edit.is_some()
    }

    fn cell(&self) -> Option<CellPos> {
        self.edit.as_ref().map(|e| e.pos)
    }

    /// Re-read the digits from whatever the surface now holds.
    fn input(&mut self, text: &str) {
        if let Some(edit) = self.edit.as_mut() {
            edit.digits = digits_of(text);
        }
    }

    fn text(&self) -> String {
        render_digits(self.digits())
    }

    /// Empty buffer clears; a complete valid buffer gives the formatted
    /// date-time; anything else gives the partial rendering, which the
    /// column's rules will reject.
    fn value(&self) -> CellValue {
        let digits = self.digits();
        if digits.is_empty() {
            return CellValue::Null;
        }
        match self.candidate() {
            Some(formatted) => CellValue::Text(formatted),
            None => CellValue::Text(render_digits(digits)),
        }
    }

    fn confirm(&mut self) -> Option<EditCommit> {
        let value = self.value();
        self.commit_with(value)
    }

    fn cancel(&mut self) -> Option<(CellPos, CellValue)> {
        self.edit.take().map(|e| (e.pos, e.original))
    }

    /// Auto-save only a complete, valid date-time; otherwise revert.
    fn on_blur(&mut self) -> Option<EditCommit> {
        match self.candidate() {
            Some(formatted) => self.commit_with(CellValue::Text(formatted)),
            None => {
                self.cancel();
                None
            }
        }
    }

    fn type_char(&mut self, ch: char) {
        self.push_digit(ch);
    }

    fn backspace(&mut self) {
        if let Some(edit) = self.edit.as_mut() {
            edit.digits.pop();
        }
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

    fn open(current: CellValue) -> DateTimeEditor {
        let mut editor = DateTimeEditor::new();
        editor.open(OpenRequest::new(CellPos::new(0, 3), current));
        editor
    }

    fn type_all(editor: &mut DateTimeEditor, digits: &str) {
        for ch in digits.chars() {
            editor.type_char(ch);
        }
    }

    #[test]
    fn test_partial_render() {
        let mut editor = open(CellValue::Null);
        assert_eq!(editor.text(), "----/--/-- --:--");
        type_all(&mut editor, "20240");
        assert_eq!(editor.text(), "2024/0-/-- --:--");
        editor.backspace();
        assert_eq!(editor.text(), "2024/--/-- --:--");
        assert!(editor.candidate().is_none());
    }

    #[test]
    fn test_ignores_non_digits_and_overflow() {
        let mut editor = open(CellValue::Null);
        type_all(&mut editor, "2024a03/09 1405 99");
        assert_eq!(editor.digits(), "202403091405");
        assert_eq!(editor.candidate().as_deref(), Some("2024/03/09 14:05"));
    }

    #[test]
    fn test_rejects_impossible_dates() {
        assert!(parse_digits("202302291200").is_none());
        assert!(parse_digits("202401012460").is_none());
        assert!(parse_digits("202402291200").is_some());
    }

    #[test]
    fn test_blur_saves_only_complete_values() {
        let mut editor = open("2024/01/01 00:00".into());
        editor.input("");
        type_all(&mut editor, "2024123");
        assert!(editor.on_blur().is_none());
        assert!(!editor.is_open());

        let mut editor = open("2024/01/01 00:00".into());
        editor.input("");
        type_all(&mut editor, "202412312359");
        let commit = editor.on_blur().unwrap();
        assert_eq!(commit.value, CellValue::from("2024/12/31 23:59"));
        assert_eq!(commit.original, CellValue::from("2024/01/01 00:00"));
    }

    #[test]
    fn test_confirm_partial_is_committed_for_validation() {
        let mut editor = open(CellValue::Null);
        type_all(&mut editor, "2024");
        let commit = editor.confirm().unwrap();
        assert_eq!(commit.value, CellValue::from("2024/--/-- --:--"));
    }

    #[test]
    fn test_opens_from_existing_value() {
        let editor = open("2023/07/04 09:30".into());
        assert_eq!(editor.digits(), "202307040930");
        assert_eq!(editor.value(), CellValue::from("2023/07/04 09:30"));
    }
}
