// SQLite driver.
//
// - config: database file resolution and connection opening
// - executor: the driver contract implementation
// - query: statement execution and result buffering

mod config;
mod executor;
mod query;

pub use executor::SqliteDriver;
pub use query::SqliteRows;
