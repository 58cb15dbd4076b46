use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use rusqlite::Connection;

use super::{config, query};
use crate::error::DbError;
use crate::layer::{DbLayer, guard_statement_length};
use crate::result::{DbResult, NativeResult};
use crate::settings::ConnectionSettings;
use crate::types::{ErrorReport, Fetched, QueryLogEntry, ServerVersion, SqlValue};

/// SQLite driver backed by a single rusqlite connection.
pub struct SqliteDriver {
    link: Option<Connection>,
    in_transaction: u32,
    num_queries: u64,
    last_query: String,
    saved_queries: Vec<QueryLogEntry>,
    log_queries: bool,
    error_no: i64,
    error_msg: String,
    has_result: bool,
}

impl SqliteDriver {
    /// Open the database file named by the settings.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ConnectionError` when the file cannot be created or
    /// is not both readable and writable.
    pub async fn connect(settings: ConnectionSettings) -> Result<Self, DbError> {
        let conn = config::open(&settings)?;
        Ok(Self {
            link: Some(conn),
            in_transaction: 0,
            num_queries: 0,
            last_query: String::new(),
            saved_queries: Vec::new(),
            log_queries: settings.log_queries,
            error_no: 0,
            error_msg: "Unknown".to_string(),
            has_result: false,
        })
    }
}

#[async_trait]
impl DbLayer for SqliteDriver {
    async fn start_transaction(&mut self) -> bool {
        self.in_transaction += 1;
        match self.link.as_ref() {
            Some(conn) => conn.execute_batch("BEGIN TRANSACTION").is_ok(),
            None => false,
        }
    }

    async fn end_transaction(&mut self) -> bool {
        self.in_transaction = self.in_transaction.saturating_sub(1);
        let Some(conn) = self.link.as_ref() else {
            return false;
        };
        if conn.execute_batch("COMMIT").is_ok() {
            true
        } else {
            let _ = conn.execute_batch("ROLLBACK");
            false
        }
    }

    async fn query(&mut self, sql: &str, _unbuffered: bool) -> DbResult {
        guard_statement_length(sql);

        let Some(conn) = self.link.as_ref() else {
            self.last_query = sql.to_string();
            self.error_msg = "connection is closed".to_string();
            return DbResult::invalid();
        };

        let started = Instant::now();
        match query::run_query(conn, sql) {
            Ok(rows) => {
                if self.log_queries {
                    self.saved_queries
                        .push(QueryLogEntry::new(sql, started.elapsed().as_secs_f64()));
                }
                self.last_query = sql.to_string();
                self.num_queries += 1;
                self.has_result = true;
                DbResult::valid(NativeResult::Sqlite(rows))
            }
            Err(err) => {
                if self.log_queries {
                    self.saved_queries.push(QueryLogEntry::untimed(sql));
                }
                self.last_query = sql.to_string();
                self.has_result = false;
                let (error_no, error_msg) = query::error_parts(&err);
                self.error_no = error_no;
                self.error_msg = error_msg;
                if self.in_transaction > 0 {
                    tracing::warn!("statement failed inside a transaction; rolling back");
                    let _ = conn.execute_batch("ROLLBACK");
                    self.in_transaction -= 1;
                }
                DbResult::invalid()
            }
        }
    }

    fn result(&self, res: &mut DbResult, row: usize, col: usize) -> Option<SqlValue> {
        match res.native_mut() {
            Some(NativeResult::Sqlite(rows)) => rows.cell(row, col),
            _ => None,
        }
    }

    fn fetch_assoc(&self, res: &mut DbResult) -> Fetched<HashMap<String, SqlValue>> {
        match res.native_mut() {
            Some(NativeResult::Sqlite(rows)) => match rows.fetch_assoc() {
                Some(row) => Fetched::Row(row),
                None => Fetched::End,
            },
            _ => Fetched::Invalid,
        }
    }

    fn fetch_row(&self, res: &mut DbResult) -> Fetched<Vec<SqlValue>> {
        match res.native_mut() {
            Some(NativeResult::Sqlite(rows)) => match rows.fetch_row() {
                Some(row) => Fetched::Row(row),
                None => Fetched::End,
            },
            _ => Fetched::Invalid,
        }
    }

    /// The SQLite client has no cheap row count without consuming the
    /// cursor; this backend reports "unsupported" unconditionally.
    fn num_rows(&self, _res: &DbResult) -> Option<u64> {
        None
    }

    fn affected_rows(&self) -> Option<u64> {
        if !self.has_result {
            return None;
        }
        self.link.as_ref().map(Connection::changes)
    }

    async fn insert_id(&mut self) -> Option<i64> {
        self.link.as_ref().map(Connection::last_insert_rowid)
    }

    fn num_queries(&self) -> u64 {
        self.num_queries
    }

    fn saved_queries(&self) -> &[QueryLogEntry] {
        &self.saved_queries
    }

    fn free_result(&self, res: &mut DbResult) {
        res.free();
    }

    fn escape(&self, input: &str) -> String {
        query::escape(input)
    }

    fn error(&self) -> ErrorReport {
        ErrorReport {
            error_sql: self.last_query.clone(),
            error_no: self.error_no,
            error_msg: self.error_msg.clone(),
        }
    }

    async fn close(&mut self) -> bool {
        match self.link.take() {
            Some(conn) => {
                if self.in_transaction > 0 {
                    if self.log_queries {
                        self.saved_queries.push(QueryLogEntry::untimed("COMMIT"));
                    }
                    let _ = conn.execute_batch("COMMIT");
                }
                conn.close().is_ok()
            }
            None => false,
        }
    }

    async fn set_names(&mut self, _names: &str) -> DbResult {
        DbResult::invalid()
    }

    async fn set_charset(&mut self, _charset: &str) -> bool {
        false
    }

    async fn get_version(&mut self) -> ServerVersion {
        ServerVersion {
            name: "SQLite3".to_string(),
            version: rusqlite::version().to_string(),
        }
    }
}
