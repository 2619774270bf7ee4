//! Convenient imports for common functionality.
//!
//! `use sqlweb::prelude::*;` brings in the connection, parameter, result,
//! request, session and response types.

pub use crate::config::{DbOptions, DbOptionsBuilder, Settings};
pub use crate::db::{AnyConnWrapper, Db, InsertResult, Prepared};
pub use crate::engine::Engine;
pub use crate::error::SqlWebError;
pub use crate::logging::init_tracing;
pub use crate::request::{
    FailurePolicy, FilterKind, FilterOptions, FilteredValue, Method, Request, RequestParam,
};
pub use crate::response::{Envelope, Response, ResponseCode};
pub use crate::results::{ResultSet, Row};
pub use crate::session::{MemorySessionStore, Session, SessionOptions, SessionStore};
pub use crate::translation::{PlaceholderStyle, Translated, translate_for_postgres};
pub use crate::types::{DatabaseType, Params, RowValues};

#[cfg(feature = "postgres")]
pub use crate::exports::{PostgresConnection, PostgresOptions, PostgresPrepared};
#[cfg(feature = "sqlite")]
pub use crate::exports::{SqliteConnection, SqliteOptions, SqliteParams};
