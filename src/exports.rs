//! Backend-specific type exports.
//!
//! Conditional re-exports of the per-backend connection, option and binding
//! types, kept in one place.

// PostgreSQL exports
#[cfg(feature = "postgres")]
pub use crate::postgres::build_result_set as postgres_build_result_set;
#[cfg(feature = "postgres")]
pub use crate::postgres::{PostgresConnection, PostgresOptions, PostgresPrepared};

// SQLite exports
#[cfg(feature = "sqlite")]
pub use crate::sqlite::build_result_set as sqlite_build_result_set;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnection, SqliteOptions, SqliteParams};
