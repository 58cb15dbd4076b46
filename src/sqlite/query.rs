use std::collections::HashMap;

use rusqlite::Connection;
use rusqlite::types::Value;

use crate::types::SqlValue;

/// Buffered rows from one SQLite query.
///
/// rusqlite rows borrow their statement, so the result set is materialized
/// up front; the handle then owns it outright. Positional access treats the
/// row argument as an absolute offset into this buffer.
#[derive(Debug)]
pub struct SqliteRows {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    cursor: usize,
}

impl SqliteRows {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            cursor: 0,
        }
    }

    pub(crate) fn fetch_row(&mut self) -> Option<Vec<SqlValue>> {
        let row = self.rows.get(self.cursor)?;
        self.cursor += 1;
        Some(row.iter().map(extract_value).collect())
    }

    pub(crate) fn fetch_assoc(&mut self) -> Option<HashMap<String, SqlValue>> {
        let row = self.rows.get(self.cursor)?;
        self.cursor += 1;
        let mut mapped = HashMap::with_capacity(self.columns.len());
        for (name, value) in self.columns.iter().zip(row) {
            mapped.insert(strip_qualifier(name).to_string(), extract_value(value));
        }
        Some(mapped)
    }

    /// Absolute cell access; the cursor does not move.
    pub(crate) fn cell(&self, row: usize, col: usize) -> Option<SqlValue> {
        self.rows.get(row).and_then(|r| r.get(col)).map(extract_value)
    }
}

/// Strip a `table.` or `alias.` qualifier so joined queries expose bare
/// column names uniformly.
pub(crate) fn strip_qualifier(name: &str) -> &str {
    name.split_once('.').map_or(name, |(_, rest)| rest)
}

fn extract_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Int(*i),
        Value::Real(f) => SqlValue::Float(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Blob(b) => SqlValue::Blob(b.clone()),
    }
}

/// Execute one statement and buffer whatever rows it produces. DML runs to
/// completion with an empty buffer.
pub(crate) fn run_query(conn: &Connection, sql: &str) -> Result<SqliteRows, rusqlite::Error> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();

    let mut rows_iter = stmt.query([])?;
    let mut buffered = Vec::new();
    while let Some(row) = rows_iter.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            values.push(row.get::<_, Value>(i)?);
        }
        buffered.push(values);
    }

    Ok(SqliteRows::new(columns, buffered))
}

/// SQLite escaping: double single quotes. Embedded NUL bytes cannot survive
/// an SQL text literal on this backend.
pub(crate) fn escape(input: &str) -> String {
    input.replace('\'', "''")
}

pub(crate) fn error_parts(err: &rusqlite::Error) -> (i64, String) {
    match err {
        rusqlite::Error::SqliteFailure(code, msg) => (
            i64::from(code.extended_code),
            msg.clone().unwrap_or_else(|| code.to_string()),
        ),
        other => (0, other.to_string()),
    }
}
