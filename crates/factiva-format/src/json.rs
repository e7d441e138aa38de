//! JSON output format.

use factiva_types::Table;
use std::io::Write;

use crate::{FormatError, Formatter};

/// JSON output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    /// JSON array (standard JSON).
    #[default]
    Array,
    /// Newline-delimited JSON (NDJSON/JSONL).
    Ndjson,
}

/// JSON formatter. Each row becomes one object keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    /// Output style.
    style: JsonStyle,
    /// Whether to pretty-print (only for array style).
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter with default settings (array style).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            style: JsonStyle::Array,
            pretty: false,
        }
    }

    /// Creates a new NDJSON formatter.
    #[must_use]
    pub const fn ndjson() -> Self {
        Self {
            style: JsonStyle::Ndjson,
            pretty: false,
        }
    }

    /// Sets whether to pretty-print output (array style only).
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Sets the output style.
    #[must_use]
    pub const fn with_style(mut self, style: JsonStyle) -> Self {
        self.style = style;
        self
    }
}

impl JsonFormatter {
    /// Bytes written before the first row, between rows, and after the last.
    const fn framing(&self, empty: bool) -> (&'static [u8], &'static [u8], &'static [u8]) {
        match (self.style, self.pretty) {
            (JsonStyle::Ndjson, _) if empty => (b"", b"", b""),
            (JsonStyle::Ndjson, _) => (b"", b"\n", b"\n"),
            (JsonStyle::Array, _) if empty => (b"[", b"", b"]\n"),
            (JsonStyle::Array, false) => (b"[", b",", b"]\n"),
            (JsonStyle::Array, true) => (b"[\n", b",\n", b"\n]\n"),
        }
    }
}

impl Formatter for JsonFormatter {
    fn write_table<W: Write + Send>(&self, table: &Table, mut writer: W) -> Result<(), FormatError> {
        let (open, separator, close) = self.framing(table.num_rows() == 0);
        let pretty = self.pretty && self.style == JsonStyle::Array;

        writer.write_all(open)?;
        for row in table.json_rows() {
            if row.index() > 0 {
                writer.write_all(separator)?;
            }
            if pretty {
                serde_json::to_writer_pretty(&mut writer, &row)?;
            } else {
                serde_json::to_writer(&mut writer, &row)?;
            }
        }
        writer.write_all(close)?;
        Ok(())
    }

    fn extension(&self) -> &str {
        match self.style {
            JsonStyle::Array => "json",
            JsonStyle::Ndjson => "ndjson",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factiva_types::Cell;
    use std::io::Cursor;

    fn create_test_table() -> Table {
        Table::from_records(vec![
            vec![("date", Cell::from("2024-01")), ("count", Cell::Int(12))],
            vec![("date", Cell::from("2024-02")), ("count", Cell::Int(7))],
        ])
    }

    #[test]
    fn test_json_array() {
        let formatter = JsonFormatter::new();
        let mut output = Cursor::new(Vec::new());

        formatter.write_table(&create_test_table(), &mut output).unwrap();

        let result = String::from_utf8(output.into_inner()).unwrap();
        assert!(result.starts_with('['));
        assert!(result.contains("\"count\":12"));
    }

    #[test]
    fn test_ndjson() {
        let formatter = JsonFormatter::ndjson();
        let mut output = Cursor::new(Vec::new());

        formatter.write_table(&create_test_table(), &mut output).unwrap();

        let result = String::from_utf8(output.into_inner()).unwrap();
        let lines: Vec<_> = result.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with('{'));
        assert!(lines[1].contains("2024-02"));
    }

    #[test]
    fn test_pretty_json() {
        let formatter = JsonFormatter::new().with_pretty(true);
        let mut output = Cursor::new(Vec::new());

        formatter.write_table(&create_test_table(), &mut output).unwrap();

        let result = String::from_utf8(output.into_inner()).unwrap();
        assert!(result.contains('\n'));
        assert!(result.contains("  "));
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed[1]["count"], 7);
    }

    #[test]
    fn test_array_parses_back_in_column_order() {
        let mut output = Cursor::new(Vec::new());
        JsonFormatter::new()
            .write_table(&create_test_table(), &mut output)
            .unwrap();

        let result = String::from_utf8(output.into_inner()).unwrap();
        assert_eq!(
            result,
            "[{\"date\":\"2024-01\",\"count\":12},{\"date\":\"2024-02\",\"count\":7}]\n"
        );
    }

    #[test]
    fn test_empty_table() {
        let mut array = Cursor::new(Vec::new());
        JsonFormatter::new().write_table(&Table::new(), &mut array).unwrap();
        assert_eq!(array.into_inner(), b"[]\n");

        let mut lines = Cursor::new(Vec::new());
        JsonFormatter::ndjson()
            .write_table(&Table::new(), &mut lines)
            .unwrap();
        assert!(lines.into_inner().is_empty());
    }

    #[test]
    fn test_ndjson_ignores_pretty() {
        let mut output = Cursor::new(Vec::new());
        JsonFormatter::ndjson()
            .with_pretty(true)
            .write_table(&create_test_table(), &mut output)
            .unwrap();

        let result = String::from_utf8(output.into_inner()).unwrap();
        assert_eq!(result.lines().count(), 2);
        assert!(result.ends_with("}\n"));
    }
}
