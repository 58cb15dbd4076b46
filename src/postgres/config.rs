use tokio_postgres::{Client, Config, NoTls};

use crate::error::DbError;
use crate::settings::ConnectionSettings;

/// Connect to the PostgreSQL server named by the settings.
///
/// Empty host/username/password/database fields are simply omitted from the
/// configuration, leaving the client's defaults in force. The persistent
/// flag maps to TCP keepalive.
///
/// # Errors
///
/// Returns `DbError::ConnectionError` when the server is unreachable or
/// refuses the credentials.
pub(crate) async fn open(settings: &ConnectionSettings) -> Result<Client, DbError> {
    let (host, port) = settings.split_host_port()?;

    let mut config = Config::new();
    if !host.is_empty() {
        config.host(&host);
    }
    if let Some(port) = port {
        config.port(port);
    }
    if !settings.database.is_empty() {
        config.dbname(&settings.database);
    }
    if !settings.username.is_empty() {
        config.user(&settings.username);
    }
    if !settings.password.is_empty() {
        config.password(&settings.password);
    }
    config.keepalives(settings.persistent);

    let (client, connection) = config.connect(NoTls).await.map_err(|e| {
        DbError::ConnectionError(format!("unable to connect to PostgreSQL server: {e}"))
    })?;

    // The connection object drives the socket; it lives on its own task for
    // as long as the client is open.
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::warn!("PostgreSQL connection task ended: {e}");
        }
    });

    tracing::debug!(host = %settings.host, "connected to PostgreSQL server");
    Ok(client)
}
