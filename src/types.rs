use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::Serialize;

use crate::error::DbError;

/// A single cell produced by a query.
///
/// The same enum is used across backends so calling code does not need to
/// branch on driver types. Note that the PostgreSQL driver speaks the
/// simple-query protocol, so its non-null cells are always `Text`.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value
    Null,
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Binary data
    Blob(Vec<u8>),
    /// Timestamp value
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view of the value. Numeric text parses too, which keeps
    /// assertions uniform across backends that return text cells.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SqlValue::Int(value) => Some(*value),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            SqlValue::Float(value) => Some(*value),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let SqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let SqlValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let SqlValue::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Try "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // Try "YYYY-MM-DD HH:MM:SS.SSS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S.%3f") {
                return Some(dt);
            }
        }
        None
    }
}

/// Outcome of a cursor fetch.
///
/// Distinguishes "no more rows" from "the handle was never valid (or has been
/// freed)" so callers can tell a failed query apart from an exhausted one.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// The next row.
    Row(T),
    /// The result set is exhausted.
    End,
    /// The handle is invalid or freed; nothing can be fetched from it.
    Invalid,
}

impl<T> Fetched<T> {
    /// The row, if one was fetched.
    #[must_use]
    pub fn row(self) -> Option<T> {
        match self {
            Fetched::Row(row) => Some(row),
            Fetched::End | Fetched::Invalid => None,
        }
    }

    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Fetched::End)
    }

    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Fetched::Invalid)
    }
}

/// The database backends supported by this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DriverKind {
    /// MySQL / MariaDB via `mysql_async`
    #[cfg(feature = "mysql")]
    Mysql,
    /// `PostgreSQL` via `tokio-postgres`
    #[cfg(feature = "postgres")]
    Postgres,
    /// `SQLite` via `rusqlite`
    #[cfg(feature = "sqlite")]
    Sqlite,
}

impl FromStr for DriverKind {
    type Err = DbError;

    /// Resolve a driver name. Aliases match the names the settings files of
    /// the applications this layer serves have historically used.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            #[cfg(feature = "mysql")]
            "mysql" | "mysqli" | "mariadb" => Ok(DriverKind::Mysql),
            #[cfg(not(feature = "mysql"))]
            "mysql" | "mysqli" | "mariadb" => Err(DbError::ConfigError(
                "this build does not include MySQL support".to_string(),
            )),
            #[cfg(feature = "postgres")]
            "postgres" | "postgresql" | "pgsql" => Ok(DriverKind::Postgres),
            #[cfg(not(feature = "postgres"))]
            "postgres" | "postgresql" | "pgsql" => Err(DbError::ConfigError(
                "this build does not include PostgreSQL support".to_string(),
            )),
            #[cfg(feature = "sqlite")]
            "sqlite" | "sqlite3" => Ok(DriverKind::Sqlite),
            #[cfg(not(feature = "sqlite"))]
            "sqlite" | "sqlite3" => Err(DbError::ConfigError(
                "this build does not include SQLite support".to_string(),
            )),
            other => Err(DbError::ConfigError(format!(
                "'{other}' is not a valid database driver; check your database settings"
            ))),
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            #[cfg(feature = "mysql")]
            DriverKind::Mysql => "mysql",
            #[cfg(feature = "postgres")]
            DriverKind::Postgres => "postgres",
            #[cfg(feature = "sqlite")]
            DriverKind::Sqlite => "sqlite3",
        };
        f.write_str(name)
    }
}

/// Error state reported by a driver's `error()` accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// The most recent statement text.
    pub error_sql: String,
    /// Backend-specific numeric code; 0 when the backend does not supply one.
    pub error_no: i64,
    /// Human-readable message, or "Unknown" when none is available.
    pub error_msg: String,
}

/// Backend product name and normalized version string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerVersion {
    pub name: String,
    pub version: String,
}

/// One entry of the per-driver query/timing log.
///
/// Failed statements are recorded with zero elapsed time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryLogEntry {
    pub sql: String,
    pub elapsed: f64,
}

impl QueryLogEntry {
    pub(crate) fn new(sql: impl Into<String>, elapsed: f64) -> Self {
        Self {
            sql: sql.into(),
            elapsed,
        }
    }

    pub(crate) fn untimed(sql: impl Into<String>) -> Self {
        Self::new(sql, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_accessor_parses_text() {
        assert_eq!(SqlValue::Int(7).as_int(), Some(7));
        assert_eq!(SqlValue::Text("42".to_string()).as_int(), Some(42));
        assert_eq!(SqlValue::Text("nope".to_string()).as_int(), None);
        assert_eq!(SqlValue::Null.as_int(), None);
    }

    #[test]
    fn timestamp_accessor_parses_text() {
        let v = SqlValue::Text("2024-01-03 10:30:00".to_string());
        let dt = v.as_timestamp().unwrap();
        assert_eq!(
            dt,
            NaiveDateTime::parse_from_str("2024-01-03 10:30:00", "%Y-%m-%d %H:%M:%S").unwrap()
        );
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn driver_names_parse_with_aliases() {
        assert_eq!("sqlite3".parse::<DriverKind>().unwrap(), DriverKind::Sqlite);
        assert_eq!("SQLite".parse::<DriverKind>().unwrap(), DriverKind::Sqlite);
    }

    #[test]
    fn unknown_driver_name_is_a_config_error() {
        let err = "mongodb".parse::<DriverKind>().unwrap_err();
        assert!(matches!(err, DbError::ConfigError(_)));
        assert!(err.to_string().contains("mongodb"));
    }

    #[test]
    fn log_entries_serialize() {
        let entry = QueryLogEntry::untimed("SELECT 1");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("SELECT 1"));
    }
}
