use std::collections::HashMap;

use crate::error::DbError;
use crate::layer::{self, DbLayer};
use crate::result::DbResult;
use crate::settings::ConnectionSettings;
use crate::types::{ErrorReport, Fetched, QueryLogEntry, ServerVersion, SqlValue};

/// The single entry point application code holds.
///
/// Construction stores the connection settings without touching the network;
/// the first operation instantiates the named driver (opening the physical
/// connection, then applying the configured charset) and every call after
/// that is forwarded verbatim. The facade performs no validation or
/// transformation of its own.
///
/// ```no_run
/// use mythdb::prelude::*;
///
/// # async fn demo() -> Result<(), DbError> {
/// let settings = ConnectionSettings::new(
///     "sqlite3".parse()?,
///     "",
///     "",
///     "",
///     "/var/lib/app/data",
/// );
/// let mut db = Database::new(settings);
/// let mut res = db.query("SELECT 1", false).await?;
/// if let Fetched::Row(row) = db.fetch_row(&mut res).await? {
///     assert_eq!(row[0].as_int(), Some(1));
/// }
/// # Ok(())
/// # }
/// ```
pub struct Database {
    settings: Option<ConnectionSettings>,
    driver: Option<Box<dyn DbLayer + Send>>,
}

impl Database {
    #[must_use]
    pub fn new(settings: ConnectionSettings) -> Self {
        Self {
            settings: Some(settings),
            driver: None,
        }
    }

    /// Whether the underlying driver has been instantiated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.driver.is_some()
    }

    /// Lazily connect, then hand out the driver.
    async fn driver(&mut self) -> Result<&mut (dyn DbLayer + Send + 'static), DbError> {
        if self.driver.is_none() {
            let settings = self.settings.take().ok_or_else(|| {
                DbError::ConnectionError("database handle has been closed".to_string())
            })?;
            let charset = settings.charset.clone();
            let mut driver = layer::connect(settings).await?;
            if let Some(charset) = charset {
                let _ = driver.set_names(&charset).await;
                let _ = driver.set_charset(&charset).await;
            }
            self.driver = Some(driver);
        }
        self.driver.as_deref_mut().ok_or_else(|| {
            DbError::ConnectionError("database driver unavailable".to_string())
        })
    }

    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn start_transaction(&mut self) -> Result<bool, DbError> {
        Ok(self.driver().await?.start_transaction().await)
    }

    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn end_transaction(&mut self) -> Result<bool, DbError> {
        Ok(self.driver().await?.end_transaction().await)
    }

    /// Execute one statement. Statement failures are reported through the
    /// handle's validity flag and [`error`](Database::error), not as `Err`.
    ///
    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn query(&mut self, sql: &str, unbuffered: bool) -> Result<DbResult, DbError> {
        Ok(self.driver().await?.query(sql, unbuffered).await)
    }

    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn result(
        &mut self,
        res: &mut DbResult,
        row: usize,
        col: usize,
    ) -> Result<Option<SqlValue>, DbError> {
        Ok(self.driver().await?.result(res, row, col))
    }

    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn fetch_assoc(
        &mut self,
        res: &mut DbResult,
    ) -> Result<Fetched<HashMap<String, SqlValue>>, DbError> {
        Ok(self.driver().await?.fetch_assoc(res))
    }

    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn fetch_row(&mut self, res: &mut DbResult) -> Result<Fetched<Vec<SqlValue>>, DbError> {
        Ok(self.driver().await?.fetch_row(res))
    }

    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn num_rows(&mut self, res: &DbResult) -> Result<Option<u64>, DbError> {
        Ok(self.driver().await?.num_rows(res))
    }

    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn affected_rows(&mut self) -> Result<Option<u64>, DbError> {
        Ok(self.driver().await?.affected_rows())
    }

    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn insert_id(&mut self) -> Result<Option<i64>, DbError> {
        Ok(self.driver().await?.insert_id().await)
    }

    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn num_queries(&mut self) -> Result<u64, DbError> {
        Ok(self.driver().await?.num_queries())
    }

    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn saved_queries(&mut self) -> Result<&[QueryLogEntry], DbError> {
        Ok(self.driver().await?.saved_queries())
    }

    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn free_result(&mut self, res: &mut DbResult) -> Result<(), DbError> {
        self.driver().await?.free_result(res);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn escape(&mut self, input: &str) -> Result<String, DbError> {
        Ok(self.driver().await?.escape(input))
    }

    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn error(&mut self) -> Result<ErrorReport, DbError> {
        Ok(self.driver().await?.error())
    }

    /// Close the connection and drop the driver.
    ///
    /// Unlike every other operation, `close` never connects: on a facade
    /// that was never used it is a no-op returning `false`.
    pub async fn close(&mut self) -> bool {
        match self.driver.as_deref_mut() {
            Some(driver) => {
                let closed = driver.close().await;
                self.driver = None;
                closed
            }
            None => false,
        }
    }

    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn set_names(&mut self, names: &str) -> Result<DbResult, DbError> {
        Ok(self.driver().await?.set_names(names).await)
    }

    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn set_charset(&mut self, charset: &str) -> Result<bool, DbError> {
        Ok(self.driver().await?.set_charset(charset).await)
    }

    /// # Errors
    ///
    /// Fails only when the lazy connection cannot be established.
    pub async fn get_version(&mut self) -> Result<ServerVersion, DbError> {
        Ok(self.driver().await?.get_version().await)
    }
}
