// PostgreSQL driver.
//
// - config: connection configuration and session spawn
// - executor: the driver contract implementation
// - query: result buffering and version parsing
// - rewrite: textual SQL fixups this dialect needs

mod config;
mod executor;
mod query;
mod rewrite;

pub use executor::PostgresDriver;
pub use query::PostgresRows;
