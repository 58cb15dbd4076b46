use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use tokio_postgres::{SimpleQueryMessage, SimpleQueryRow};

use crate::types::SqlValue;

/// Buffered rows from one PostgreSQL query.
///
/// The driver speaks the simple-query protocol, so every non-null cell
/// arrives as text; rows are owned by the handle from the start.
pub struct PostgresRows {
    rows: Vec<SimpleQueryRow>,
    cursor: usize,
}

impl fmt::Debug for PostgresRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresRows")
            .field("rows", &self.rows.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl PostgresRows {
    pub(crate) fn fetch_row(&mut self) -> Option<Vec<SqlValue>> {
        let row = self.rows.get(self.cursor)?;
        self.cursor += 1;
        Some((0..row.len()).map(|i| cell_value(row, i)).collect())
    }

    pub(crate) fn fetch_assoc(&mut self) -> Option<HashMap<String, SqlValue>> {
        let row = self.rows.get(self.cursor)?;
        self.cursor += 1;
        let mut mapped = HashMap::with_capacity(row.len());
        for (i, column) in row.columns().iter().enumerate() {
            mapped.insert(column.name().to_string(), cell_value(row, i));
        }
        Some(mapped)
    }

    /// `row == 0` reads the next row in cursor order; `row > 0` addresses
    /// the cell directly, leaving the cursor where it was.
    pub(crate) fn cell(&mut self, row: usize, col: usize) -> Option<SqlValue> {
        let target = if row > 0 {
            self.rows.get(row)?
        } else {
            let current = self.rows.get(self.cursor)?;
            self.cursor += 1;
            current
        };
        if col >= target.len() {
            return None;
        }
        Some(cell_value(target, col))
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }
}

fn cell_value(row: &SimpleQueryRow, idx: usize) -> SqlValue {
    match row.try_get(idx).ok().flatten() {
        Some(text) => SqlValue::Text(text.to_string()),
        None => SqlValue::Null,
    }
}

/// Fold a simple-query message stream into buffered rows plus the last
/// command-completion count (the backend's affected-rows figure).
pub(crate) fn collect(messages: Vec<SimpleQueryMessage>) -> (PostgresRows, Option<u64>) {
    let mut rows = Vec::new();
    let mut affected = None;
    for message in messages {
        match message {
            SimpleQueryMessage::Row(row) => rows.push(row),
            SimpleQueryMessage::CommandComplete(count) => affected = Some(count),
            _ => {}
        }
    }
    (PostgresRows { rows, cursor: 0 }, affected)
}

/// PostgreSQL escaping: double single quotes. With standard conforming
/// strings in force, backslashes need no treatment.
pub(crate) fn escape(input: &str) -> String {
    input.replace('\'', "''")
}

lazy_static! {
    static ref VERSION_TOKEN: Regex = Regex::new(r"[0-9][^\s,-]*").unwrap();
}

/// Pull the numeric version out of a `SELECT VERSION()` banner like
/// `PostgreSQL 16.2 (Debian 16.2-1) on x86_64...`.
pub(crate) fn normalize_version(raw: &str) -> String {
    VERSION_TOKEN
        .find(raw)
        .map_or_else(|| raw.to_string(), |m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_banner_is_normalized() {
        assert_eq!(
            normalize_version("PostgreSQL 16.2 (Debian 16.2-1.pgdg120+2) on x86_64-pc-linux-gnu"),
            "16.2"
        );
        assert_eq!(normalize_version("PostgreSQL 9.6.24"), "9.6.24");
    }

    #[test]
    fn unparseable_banner_passes_through() {
        assert_eq!(normalize_version("odd banner"), "odd banner");
    }

    #[test]
    fn escape_doubles_quotes_only() {
        assert_eq!(escape("it's"), "it''s");
        assert_eq!(escape("a\\b"), "a\\b");
    }
}
