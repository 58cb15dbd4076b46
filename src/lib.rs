//! Lightweight database-access abstraction layer.
//!
//! A single [`Database`] facade defers connecting until first use, then
//! forwards every operation to one of three interchangeable drivers:
//! MySQL/MariaDB (`mysql_async`), PostgreSQL (`tokio-postgres`), and SQLite
//! (`rusqlite`). The drivers normalize the clients' divergent APIs into one
//! contract — [`layer::DbLayer`] — papering over each engine's quirks:
//! pagination syntax, insert-id semantics, result-fetch primitives, and
//! error shapes.
//!
//! Queries are raw SQL strings; there is no parameter binding, query
//! building, or pooling at this layer. A failed statement is data (an
//! invalid [`DbResult`] plus the driver's `error()` state), never an `Err`.

pub mod database;
pub mod error;
pub mod layer;
pub mod prelude;
pub mod result;
pub mod settings;
pub mod types;

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use database::Database;
pub use error::DbError;
pub use layer::{DbLayer, MAX_STATEMENT_LEN};
pub use result::{DbResult, NativeResult};
pub use settings::ConnectionSettings;
pub use types::{
    DriverKind, ErrorReport, Fetched, QueryLogEntry, ServerVersion, SqlValue,
};
