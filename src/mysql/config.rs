use mysql_async::{Conn, OptsBuilder};

use crate::error::DbError;
use crate::settings::ConnectionSettings;

// Keepalive period used when a persistent connection is requested.
const KEEPALIVE_MS: u32 = 60_000;

/// Connect to the MySQL server named by the settings and select the
/// database. The persistent flag maps to TCP keepalive.
///
/// # Errors
///
/// Returns `DbError::ConnectionError` when the server is unreachable or
/// refuses the credentials.
pub(crate) async fn open(settings: &ConnectionSettings) -> Result<Conn, DbError> {
    let (host, port) = settings.split_host_port()?;

    let mut opts = OptsBuilder::default()
        .ip_or_hostname(host)
        .user(Some(settings.username.clone()))
        .pass(Some(settings.password.clone()))
        .db_name(Some(settings.database.clone()));
    if let Some(port) = port {
        opts = opts.tcp_port(port);
    }
    if settings.persistent {
        opts = opts.tcp_keepalive(Some(KEEPALIVE_MS));
    }

    let conn = Conn::new(opts).await.map_err(|e| {
        DbError::ConnectionError(format!(
            "unable to connect to MySQL server and select database: {e}"
        ))
    })?;

    tracing::debug!(host = %settings.host, "connected to MySQL server");
    Ok(conn)
}
