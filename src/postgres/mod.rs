// PostgreSQL backend
//
// - config: connection options and the blocking connect path
// - params: `ToSql` for `RowValues`
// - query: result extraction and building
// - connection: the blocking connection wrapper the executor dispatches to

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::PostgresOptions;
pub use connection::{PostgresConnection, PostgresPrepared};
pub use query::build_result_set;
