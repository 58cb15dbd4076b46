use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use mysql_async::Conn;
use mysql_async::prelude::Queryable;

use super::query::{self, MysqlRows};
use super::config;
use crate::error::DbError;
use crate::layer::{DbLayer, guard_statement_length};
use crate::result::{DbResult, NativeResult};
use crate::settings::ConnectionSettings;
use crate::types::{ErrorReport, Fetched, QueryLogEntry, ServerVersion, SqlValue};

/// MySQL driver backed by a single mysql_async connection.
pub struct MysqlDriver {
    link: Option<Conn>,
    in_transaction: u32,
    num_queries: u64,
    last_query: String,
    saved_queries: Vec<QueryLogEntry>,
    log_queries: bool,
    // Server error of the most recent failed statement; cleared by the next
    // success, so `error()` mirrors the live connection state.
    last_error: Option<(i64, String)>,
}

impl MysqlDriver {
    /// Connect to the server named by the settings.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ConnectionError` when the server is unreachable or
    /// refuses the credentials.
    pub async fn connect(settings: ConnectionSettings) -> Result<Self, DbError> {
        let conn = config::open(&settings).await?;
        Ok(Self {
            link: Some(conn),
            in_transaction: 0,
            num_queries: 0,
            last_query: String::new(),
            saved_queries: Vec::new(),
            log_queries: settings.log_queries,
            last_error: None,
        })
    }
}

#[async_trait]
impl DbLayer for MysqlDriver {
    async fn start_transaction(&mut self) -> bool {
        self.in_transaction += 1;
        match self.link.as_mut() {
            Some(conn) => conn.query_drop("START TRANSACTION").await.is_ok(),
            None => false,
        }
    }

    async fn end_transaction(&mut self) -> bool {
        self.in_transaction = self.in_transaction.saturating_sub(1);
        let Some(conn) = self.link.as_mut() else {
            return false;
        };
        if conn.query_drop("COMMIT").await.is_ok() {
            true
        } else {
            let _ = conn.query_drop("ROLLBACK").await;
            false
        }
    }

    async fn query(&mut self, sql: &str, _unbuffered: bool) -> DbResult {
        guard_statement_length(sql);

        let Some(conn) = self.link.as_mut() else {
            self.last_query = sql.to_string();
            self.last_error = Some((0, "connection is closed".to_string()));
            return DbResult::invalid();
        };

        let started = Instant::now();
        let outcome: Result<Vec<mysql_async::Row>, mysql_async::Error> = conn.query(sql).await;
        match outcome {
            Ok(rows) => {
                if self.log_queries {
                    self.saved_queries
                        .push(QueryLogEntry::new(sql, started.elapsed().as_secs_f64()));
                }
                self.last_query = sql.to_string();
                self.num_queries += 1;
                self.last_error = None;
                DbResult::valid(NativeResult::Mysql(MysqlRows::new(rows)))
            }
            Err(err) => {
                if self.log_queries {
                    self.saved_queries.push(QueryLogEntry::untimed(sql));
                }
                self.last_query = sql.to_string();
                self.last_error = Some(query::error_parts(&err));
                if self.in_transaction > 0 {
                    tracing::warn!("statement failed inside a transaction; rolling back");
                    let _ = conn.query_drop("ROLLBACK").await;
                    self.in_transaction -= 1;
                }
                DbResult::invalid()
            }
        }
    }

    fn result(&self, res: &mut DbResult, row: usize, col: usize) -> Option<SqlValue> {
        match res.native_mut() {
            Some(NativeResult::Mysql(rows)) => rows.cell(row, col),
            _ => None,
        }
    }

    fn fetch_assoc(&self, res: &mut DbResult) -> Fetched<HashMap<String, SqlValue>> {
        match res.native_mut() {
            Some(NativeResult::Mysql(rows)) => match rows.fetch_assoc() {
                Some(row) => Fetched::Row(row),
                None => Fetched::End,
            },
            _ => Fetched::Invalid,
        }
    }

    fn fetch_row(&self, res: &mut DbResult) -> Fetched<Vec<SqlValue>> {
        match res.native_mut() {
            Some(NativeResult::Mysql(rows)) => match rows.fetch_row() {
                Some(row) => Fetched::Row(row),
                None => Fetched::End,
            },
            _ => Fetched::Invalid,
        }
    }

    fn num_rows(&self, res: &DbResult) -> Option<u64> {
        match res.native() {
            Some(NativeResult::Mysql(rows)) if res.is_valid() => Some(rows.len() as u64),
            _ => None,
        }
    }

    fn affected_rows(&self) -> Option<u64> {
        self.link.as_ref().map(Conn::affected_rows)
    }

    async fn insert_id(&mut self) -> Option<i64> {
        self.link
            .as_ref()
            .map(|conn| conn.last_insert_id().map_or(0, |id| id as i64))
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
        let (error_no, error_msg) = self.last_error.clone().unwrap_or((0, String::new()));
        ErrorReport {
            error_sql: self.last_query.clone(),
            error_no,
            error_msg,
        }
    }

    async fn close(&mut self) -> bool {
        match self.link.take() {
            Some(conn) => conn.disconnect().await.is_ok(),
            None => false,
        }
    }

    async fn set_names(&mut self, names: &str) -> DbResult {
        let statement = format!("SET NAMES '{}'", query::escape(names));
        self.query(&statement, false).await
    }

    async fn set_charset(&mut self, charset: &str) -> bool {
        match self.link.as_mut() {
            Some(conn) => {
                let statement = format!("SET CHARACTER SET '{}'", query::escape(charset));
                conn.query_drop(statement).await.is_ok()
            }
            None => false,
        }
    }

    async fn get_version(&mut self) -> ServerVersion {
        let mut res = self.query("SELECT VERSION()", false).await;
        let raw = self
            .result(&mut res, 0, 0)
            .and_then(|v| v.as_text().map(str::to_string));
        ServerVersion {
            name: "MySQL".to_string(),
            version: raw.map(|s| query::normalize_version(&s)).unwrap_or_default(),
        }
    }
}
