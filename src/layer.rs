use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::DbError;
use crate::result::DbResult;
use crate::settings::ConnectionSettings;
use crate::types::{ErrorReport, Fetched, QueryLogEntry, ServerVersion, SqlValue};

/// Hard ceiling on statement length. Statements past it are treated as a
/// programming error and abort, not as recoverable input.
pub const MAX_STATEMENT_LEN: usize = 140_000;

pub(crate) fn guard_statement_length(sql: &str) {
    assert!(
        sql.len() <= MAX_STATEMENT_LEN,
        "statement of {} bytes exceeds the {MAX_STATEMENT_LEN}-byte ceiling; refusing to execute",
        sql.len()
    );
}

/// The contract every backend driver satisfies.
///
/// One implementation per backend translates these operations onto the native
/// client crate and absorbs that engine's quirks (pagination syntax,
/// insert-id semantics, result-fetch primitives, error shapes). A driver owns
/// exactly one native connection, opened by its constructor and released
/// exactly once by [`close`](DbLayer::close).
#[async_trait]
pub trait DbLayer: Send {
    /// Begin a transaction. Increments the depth counter and reports whether
    /// the BEGIN statement itself succeeded; nesting is tracked, not enforced.
    async fn start_transaction(&mut self) -> bool;

    /// Commit; on commit failure roll back and report `false`. Decrements the
    /// depth counter either way (saturating at zero).
    async fn end_transaction(&mut self) -> bool;

    /// Execute one statement and wrap its outcome in a handle.
    ///
    /// The handle's validity reflects whether the backend reported a fatal
    /// error; zero-row success is still valid. A failure inside an open
    /// transaction rolls that transaction back. The `unbuffered` hint is
    /// accepted on every backend; rows are materialized into the handle
    /// regardless.
    ///
    /// # Panics
    ///
    /// Panics when `sql` exceeds [`MAX_STATEMENT_LEN`].
    async fn query(&mut self, sql: &str, unbuffered: bool) -> DbResult;

    /// Positional fetch of one cell.
    ///
    /// MySQL: `row == 0` reads the next row in cursor order, `row > 0` seeks
    /// first (the cursor moves past the read row). PostgreSQL: `row == 0`
    /// reads the next row, `row > 0` addresses the cell directly without
    /// moving the cursor. SQLite: `row` is always an absolute offset into the
    /// buffered result.
    fn result(&self, res: &mut DbResult, row: usize, col: usize) -> Option<SqlValue>;

    /// Next row as a field-name-keyed mapping.
    fn fetch_assoc(&self, res: &mut DbResult) -> Fetched<HashMap<String, SqlValue>>;

    /// Next row as a positional sequence.
    fn fetch_row(&self, res: &mut DbResult) -> Fetched<Vec<SqlValue>>;

    /// Row count of a result. `None` for invalid handles, and always `None`
    /// on SQLite (its client has no cheap count).
    fn num_rows(&self, res: &DbResult) -> Option<u64>;

    /// Rows affected by the most recent statement.
    fn affected_rows(&self) -> Option<u64>;

    /// Last insert id. Best-effort on PostgreSQL (sequence heuristic).
    async fn insert_id(&mut self) -> Option<i64>;

    /// Number of statements executed through [`query`](DbLayer::query).
    fn num_queries(&self) -> u64;

    /// The query/timing log, populated when query logging is enabled.
    fn saved_queries(&self) -> &[QueryLogEntry];

    /// Release a handle's native payload. Safe on freed or invalid handles.
    fn free_result(&self, res: &mut DbResult);

    /// Escape a string for embedding in a literal, per this backend's rules.
    fn escape(&self, input: &str) -> String;

    /// The driver's current error state.
    fn error(&self) -> ErrorReport;

    /// Close the native connection. `false` when there is none (left).
    async fn close(&mut self) -> bool;

    /// Issue the backend's `SET NAMES`; unsupported backends return an
    /// invalid handle.
    async fn set_names(&mut self, names: &str) -> DbResult;

    /// Switch the connection character set; unsupported backends return
    /// `false`.
    async fn set_charset(&mut self, charset: &str) -> bool;

    /// Backend product name and normalized version.
    async fn get_version(&mut self) -> ServerVersion;
}

/// Construct the driver named by the settings, opening the physical
/// connection. The registry is a compile-time match: unknown names never get
/// here (they fail `DriverKind` parsing before any I/O).
///
/// # Errors
///
/// Returns `DbError::ConnectionError` when the backend is unreachable or
/// refuses the credentials; `DbError::ConfigError` for malformed settings.
pub(crate) async fn connect(
    settings: ConnectionSettings,
) -> Result<Box<dyn DbLayer + Send>, DbError> {
    match settings.driver {
        #[cfg(feature = "mysql")]
        crate::types::DriverKind::Mysql => Ok(Box::new(
            crate::mysql::MysqlDriver::connect(settings).await?,
        )),
        #[cfg(feature = "postgres")]
        crate::types::DriverKind::Postgres => Ok(Box::new(
            crate::postgres::PostgresDriver::connect(settings).await?,
        )),
        #[cfg(feature = "sqlite")]
        crate::types::DriverKind::Sqlite => Ok(Box::new(
            crate::sqlite::SqliteDriver::connect(settings).await?,
        )),
    }
}
