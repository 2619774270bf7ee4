// SQLite backend
//
// - config: opening the file/memory database and applying session pragmas
// - params: binding `Params` as rusqlite values
// - query: result extraction and building
// - connection: the connection wrapper the executor dispatches to

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::SqliteOptions;
pub use connection::SqliteConnection;
pub use params::Bound as SqliteParams;
pub use query::build_result_set;
