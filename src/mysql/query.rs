use std::collections::HashMap;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use mysql_async::{Row, Value};
use regex::Regex;

use crate::types::SqlValue;

/// Buffered rows from one MySQL query.
#[derive(Debug)]
pub struct MysqlRows {
    rows: Vec<Row>,
    cursor: usize,
}

impl MysqlRows {
    pub(crate) fn new(rows: Vec<Row>) -> Self {
        Self { rows, cursor: 0 }
    }

    pub(crate) fn fetch_row(&mut self) -> Option<Vec<SqlValue>> {
        let row = self.rows.get(self.cursor)?;
        self.cursor += 1;
        Some((0..row.len()).filter_map(|i| value_at(row, i)).collect())
    }

    pub(crate) fn fetch_assoc(&mut self) -> Option<HashMap<String, SqlValue>> {
        let row = self.rows.get(self.cursor)?;
        self.cursor += 1;
        let columns = row.columns_ref();
        let mut mapped = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if let Some(value) = value_at(row, i) {
                mapped.insert(column.name_str().to_string(), value);
            }
        }
        Some(mapped)
    }

    /// `row == 0` reads the next row in cursor order; `row > 0` seeks first.
    /// Either way the cursor moves past the row that was read.
    pub(crate) fn cell(&mut self, row: usize, col: usize) -> Option<SqlValue> {
        if row > 0 {
            self.cursor = row;
        }
        let current = self.rows.get(self.cursor)?;
        self.cursor += 1;
        value_at(current, col)
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }
}

fn value_at(row: &Row, idx: usize) -> Option<SqlValue> {
    let value: Option<Value> = row.get(idx);
    value.map(|v| convert_value(&v))
}

fn convert_value(value: &Value) -> SqlValue {
    match value {
        Value::NULL => SqlValue::Null,
        // Text columns arrive as bytes; fall back to a blob when they are
        // not UTF-8.
        Value::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => SqlValue::Text(text.to_string()),
            Err(_) => SqlValue::Blob(bytes.clone()),
        },
        Value::Int(i) => SqlValue::Int(*i),
        Value::UInt(u) => SqlValue::Int(*u as i64),
        Value::Float(f) => SqlValue::Float(f64::from(*f)),
        Value::Double(d) => SqlValue::Float(*d),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            NaiveDate::from_ymd_opt(i32::from(*year), u32::from(*month), u32::from(*day))
                .and_then(|date| {
                    date.and_hms_micro_opt(
                        u32::from(*hour),
                        u32::from(*minute),
                        u32::from(*second),
                        *micros,
                    )
                })
                .map_or(SqlValue::Null, SqlValue::Timestamp)
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if *negative { "-" } else { "" };
            let hours = days * 24 + u32::from(*hours);
            SqlValue::Text(format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{micros:06}"))
        }
    }
}

/// MySQL escaping, matching the server's string-literal rules: NUL, quotes,
/// backslash, newlines, and ctrl-Z all get a backslash escape.
pub(crate) fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\u{1a}' => out.push_str("\\Z"),
            _ => out.push(ch),
        }
    }
    out
}

lazy_static! {
    static ref VERSION_PREFIX: Regex = Regex::new(r"^([^-]+)").unwrap();
}

/// Trim a server version like `8.0.36-0ubuntu0.22.04.1` down to `8.0.36`.
pub(crate) fn normalize_version(raw: &str) -> String {
    VERSION_PREFIX
        .find(raw)
        .map_or_else(|| raw.to_string(), |m| m.as_str().to_string())
}

pub(crate) fn error_parts(err: &mysql_async::Error) -> (i64, String) {
    match err {
        mysql_async::Error::Server(server) => (i64::from(server.code), server.message.clone()),
        other => (0, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_the_literal_metacharacters() {
        assert_eq!(escape("O'Brien"), "O\\'Brien");
        assert_eq!(escape("a\\b"), "a\\\\b");
        assert_eq!(escape("nul\0byte"), "nul\\0byte");
        assert_eq!(escape("line\nbreak"), "line\\nbreak");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn version_suffix_is_trimmed() {
        assert_eq!(normalize_version("8.0.36-0ubuntu0.22.04.1"), "8.0.36");
        assert_eq!(normalize_version("11.2.2-MariaDB"), "11.2.2");
        assert_eq!(normalize_version("9.1.0"), "9.1.0");
    }

    #[test]
    fn null_and_numeric_values_convert() {
        assert_eq!(convert_value(&Value::NULL), SqlValue::Null);
        assert_eq!(convert_value(&Value::Int(-3)), SqlValue::Int(-3));
        assert_eq!(convert_value(&Value::UInt(7)), SqlValue::Int(7));
        assert_eq!(convert_value(&Value::Double(1.5)), SqlValue::Float(1.5));
    }

    #[test]
    fn text_bytes_convert_to_text() {
        let v = convert_value(&Value::Bytes(b"hello".to_vec()));
        assert_eq!(v, SqlValue::Text("hello".to_string()));

        let raw = convert_value(&Value::Bytes(vec![0xff, 0xfe]));
        assert_eq!(raw, SqlValue::Blob(vec![0xff, 0xfe]));
    }

    #[test]
    fn datetime_values_convert_to_timestamps() {
        let v = convert_value(&Value::Date(2024, 1, 3, 10, 30, 0, 0));
        let ts = v.as_timestamp().unwrap();
        assert_eq!(ts.to_string(), "2024-01-03 10:30:00");
    }
}
