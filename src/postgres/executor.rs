use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use tokio_postgres::{Client, SimpleQueryMessage};

use super::{config, query, rewrite};
use crate::error::DbError;
use crate::layer::{DbLayer, guard_statement_length};
use crate::result::{DbResult, NativeResult};
use crate::settings::ConnectionSettings;
use crate::types::{ErrorReport, Fetched, QueryLogEntry, ServerVersion, SqlValue};

/// PostgreSQL driver backed by a single tokio-postgres client.
pub struct PostgresDriver {
    link: Option<Client>,
    in_transaction: u32,
    num_queries: u64,
    last_query: String,
    saved_queries: Vec<QueryLogEntry>,
    log_queries: bool,
    // This backend reports no numeric code; the message persists until the
    // next failure overwrites it.
    error_msg: String,
    // Text of the most recent successful statement, for the insert-id
    // sequence heuristic.
    last_ok_query: Option<String>,
    last_affected: Option<u64>,
}

impl PostgresDriver {
    /// Connect to the server named by the settings.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ConnectionError` when the server is unreachable or
    /// refuses the credentials.
    pub async fn connect(settings: ConnectionSettings) -> Result<Self, DbError> {
        let client = config::open(&settings).await?;
        Ok(Self {
            link: Some(client),
            in_transaction: 0,
            num_queries: 0,
            last_query: String::new(),
            saved_queries: Vec::new(),
            log_queries: settings.log_queries,
            error_msg: "Unknown".to_string(),
            last_ok_query: None,
            last_affected: None,
        })
    }
}

fn failure_message(err: &tokio_postgres::Error) -> String {
    err.as_db_error()
        .map_or_else(|| err.to_string(), |db| db.message().to_string())
}

#[async_trait]
impl DbLayer for PostgresDriver {
    async fn start_transaction(&mut self) -> bool {
        self.in_transaction += 1;
        match self.link.as_ref() {
            Some(client) => client.simple_query("BEGIN").await.is_ok(),
            None => false,
        }
    }

    async fn end_transaction(&mut self) -> bool {
        self.in_transaction = self.in_transaction.saturating_sub(1);
        let Some(client) = self.link.as_ref() else {
            return false;
        };
        if client.simple_query("COMMIT").await.is_ok() {
            true
        } else {
            let _ = client.simple_query("ROLLBACK").await;
            false
        }
    }

    async fn query(&mut self, sql: &str, _unbuffered: bool) -> DbResult {
        guard_statement_length(sql);

        // This dialect rejects the comma form of LIMIT; fix it up before
        // execution. Bookkeeping below records the rewritten text.
        let sql = rewrite::rewrite_limit(sql).into_owned();

        let Some(client) = self.link.as_ref() else {
            self.last_query = sql;
            self.error_msg = "connection is closed".to_string();
            return DbResult::invalid();
        };

        let started = Instant::now();
        match client.simple_query(&sql).await {
            Ok(messages) => {
                if self.log_queries {
                    self.saved_queries
                        .push(QueryLogEntry::new(&sql, started.elapsed().as_secs_f64()));
                }
                let (rows, affected) = query::collect(messages);
                self.num_queries += 1;
                self.last_affected = affected;
                self.last_ok_query = Some(sql.clone());
                self.last_query = sql;
                DbResult::valid(NativeResult::Postgres(rows))
            }
            Err(err) => {
                if self.log_queries {
                    self.saved_queries.push(QueryLogEntry::untimed(&sql));
                }
                self.last_query = sql;
                self.last_affected = None;
                self.error_msg = failure_message(&err);
                if self.in_transaction > 0 {
                    tracing::warn!("statement failed inside a transaction; rolling back");
                    let _ = client.simple_query("ROLLBACK").await;
                    self.in_transaction -= 1;
                }
                DbResult::invalid()
            }
        }
    }

    fn result(&self, res: &mut DbResult, row: usize, col: usize) -> Option<SqlValue> {
        match res.native_mut() {
            Some(NativeResult::Postgres(rows)) => rows.cell(row, col),
            _ => None,
        }
    }

    fn fetch_assoc(&self, res: &mut DbResult) -> Fetched<HashMap<String, SqlValue>> {
        match res.native_mut() {
            Some(NativeResult::Postgres(rows)) => match rows.fetch_assoc() {
                Some(row) => Fetched::Row(row),
                None => Fetched::End,
            },
            _ => Fetched::Invalid,
        }
    }

    fn fetch_row(&self, res: &mut DbResult) -> Fetched<Vec<SqlValue>> {
        match res.native_mut() {
            Some(NativeResult::Postgres(rows)) => match rows.fetch_row() {
                Some(row) => Fetched::Row(row),
                None => Fetched::End,
            },
            _ => Fetched::Invalid,
        }
    }

    fn num_rows(&self, res: &DbResult) -> Option<u64> {
        match res.native() {
            Some(NativeResult::Postgres(rows)) if res.is_valid() => Some(rows.len() as u64),
            _ => None,
        }
    }

    fn affected_rows(&self) -> Option<u64> {
        self.last_affected
    }

    async fn insert_id(&mut self) -> Option<i64> {
        let client = self.link.as_ref()?;
        let table = rewrite::insert_target_table(self.last_ok_query.as_deref()?)?;
        let lookup = format!("SELECT currval('{table}_id_seq')");
        match client.simple_query(&lookup).await {
            Ok(messages) => messages.iter().find_map(|message| match message {
                SimpleQueryMessage::Row(row) => row
                    .try_get(0)
                    .ok()
                    .flatten()
                    .and_then(|text| text.parse::<i64>().ok()),
                _ => None,
            }),
            Err(_) => None,
        }
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
            error_no: 0,
            error_msg: self.error_msg.clone(),
        }
    }

    async fn close(&mut self) -> bool {
        match self.link.take() {
            Some(client) => {
                if self.in_transaction > 0 {
                    if self.log_queries {
                        self.saved_queries.push(QueryLogEntry::untimed("COMMIT"));
                    }
                    let _ = client.simple_query("COMMIT").await;
                }
                true
            }
            None => false,
        }
    }

    async fn set_names(&mut self, names: &str) -> DbResult {
        let statement = format!("SET NAMES '{}'", query::escape(names));
        self.query(&statement, false).await
    }

    async fn set_charset(&mut self, _charset: &str) -> bool {
        false
    }

    async fn get_version(&mut self) -> ServerVersion {
        let mut res = self.query("SELECT VERSION()", false).await;
        let raw = self
            .result(&mut res, 0, 0)
            .and_then(|v| v.as_text().map(str::to_string));
        ServerVersion {
            name: "PostgreSQL".to_string(),
            version: raw.map(|s| query::normalize_version(&s)).unwrap_or_default(),
        }
    }
}
