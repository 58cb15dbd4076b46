// MySQL / MariaDB driver.
//
// - config: connection options and opening
// - executor: the driver contract implementation
// - query: result buffering, escaping, version parsing

mod config;
mod executor;
mod query;

pub use executor::MysqlDriver;
pub use query::MysqlRows;
