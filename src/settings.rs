use crate::error::DbError;
use crate::types::DriverKind;

/// Connection parameters for a [`Database`](crate::database::Database).
///
/// Settings are consumed exactly once, when the lazy connection is
/// established; the facade does not retain credentials afterwards.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub driver: DriverKind,
    /// Host name, optionally carrying a custom port as `host:port`.
    pub host: String,
    pub username: String,
    pub password: String,
    /// Database name, or filesystem path for SQLite.
    pub database: String,
    /// Request a persistent connection. Mapped to TCP keepalive on the
    /// network backends; SQLite has no notion of persistence and ignores it.
    pub persistent: bool,
    /// Character set to apply right after connecting, via `set_names` and
    /// `set_charset`.
    pub charset: Option<String>,
    /// Capture a per-query timing log, readable via `get_saved_queries`.
    pub log_queries: bool,
}

impl ConnectionSettings {
    #[must_use]
    pub fn new(
        driver: DriverKind,
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            host: host.into(),
            username: username.into(),
            password: password.into(),
            database: database.into(),
            persistent: false,
            charset: None,
            log_queries: false,
        }
    }

    #[must_use]
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    #[must_use]
    pub fn with_query_log(mut self, log_queries: bool) -> Self {
        self.log_queries = log_queries;
        self
    }

    /// Split a `host:port` host string.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ConfigError` if the port part is not a number.
    pub(crate) fn split_host_port(&self) -> Result<(String, Option<u16>), DbError> {
        match self.host.split_once(':') {
            Some((host, port)) => {
                let port: u16 = port.parse().map_err(|_| {
                    DbError::ConfigError(format!(
                        "invalid port '{port}' in host '{}'",
                        self.host
                    ))
                })?;
                Ok((host.to_string(), Some(port)))
            }
            None => Ok((self.host.clone(), None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "sqlite")]
    fn settings(host: &str) -> ConnectionSettings {
        ConnectionSettings::new(DriverKind::Sqlite, host, "", "", "db")
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn host_without_port_passes_through() {
        let (host, port) = settings("localhost").split_host_port().unwrap();
        assert_eq!(host, "localhost");
        assert_eq!(port, None);
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn host_with_port_splits() {
        let (host, port) = settings("db.example.com:3307").split_host_port().unwrap();
        assert_eq!(host, "db.example.com");
        assert_eq!(port, Some(3307));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn bad_port_is_a_config_error() {
        let err = settings("localhost:junk").split_host_port().unwrap_err();
        assert!(matches!(err, DbError::ConfigError(_)));
    }
}
