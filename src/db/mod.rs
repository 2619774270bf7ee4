// Connection manager, statement executor and transaction controller
//
// - connection: `Db` and the backend it dispatches to
// - executor: select/insert/update/delete helpers, sentinel and `try_` forms
// - prepared: statements compiled once and run many times
// - transaction: begin/commit/rollback pass-throughs
// - any_conn_wrapper: raw driver access

mod any_conn_wrapper;
mod connection;
mod executor;
mod prepared;
mod transaction;

pub use any_conn_wrapper::AnyConnWrapper;
pub use connection::Db;
pub use executor::{InsertResult, window_clause};
pub use prepared::Prepared;
