//! Convenient imports for common functionality.

pub use crate::database::Database;
pub use crate::error::DbError;
pub use crate::layer::{DbLayer, MAX_STATEMENT_LEN};
pub use crate::result::DbResult;
pub use crate::settings::ConnectionSettings;
pub use crate::types::{
    DriverKind, ErrorReport, Fetched, QueryLogEntry, ServerVersion, SqlValue,
};

#[cfg(feature = "mysql")]
pub use crate::mysql::MysqlDriver;
#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresDriver;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteDriver;
