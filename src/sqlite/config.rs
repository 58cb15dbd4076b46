use std::fs;
use std::path::PathBuf;

use rusqlite::{Connection, OpenFlags};

use crate::error::DbError;
use crate::settings::ConnectionSettings;

/// The database name is a filesystem path; a `.sqlite3` suffix is appended
/// when absent.
pub(crate) fn resolve_db_path(database: &str) -> PathBuf {
    if database.to_ascii_lowercase().ends_with(".sqlite3") {
        PathBuf::from(database)
    } else {
        PathBuf::from(format!("{database}.sqlite3"))
    }
}

/// Open (creating if necessary) the database file named by the settings.
///
/// Host and username are unused by this backend; the persistent flag has no
/// SQLite counterpart and the password (an encryption key elsewhere) is
/// ignored since rusqlite builds without encryption support.
///
/// # Errors
///
/// Returns `DbError::ConnectionError` naming the path when the file cannot
/// be created, read, or written.
pub(crate) fn open(settings: &ConnectionSettings) -> Result<Connection, DbError> {
    let path = resolve_db_path(&settings.database);

    if !path.exists() {
        fs::File::create(&path).map_err(|e| {
            DbError::ConnectionError(format!(
                "unable to create new database '{}': {e}",
                path.display()
            ))
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&path, fs::Permissions::from_mode(0o666));
        }
    }

    fs::OpenOptions::new().read(true).open(&path).map_err(|e| {
        DbError::ConnectionError(format!(
            "unable to open database '{}' for reading: {e}",
            path.display()
        ))
    })?;
    fs::OpenOptions::new().write(true).open(&path).map_err(|e| {
        DbError::ConnectionError(format!(
            "unable to open database '{}' for writing: {e}",
            path.display()
        ))
    })?;

    let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_WRITE)
        .map_err(|e| {
            DbError::ConnectionError(format!("unable to open database '{}': {e}", path.display()))
        })?;

    tracing::debug!(path = %path.display(), "opened SQLite database");
    Ok(conn)
}
