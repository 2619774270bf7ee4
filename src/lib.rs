//! Helpers for small database-backed web endpoints.
//!
//! - [`Db`]: one blocking connection (`SQLite` or Postgres) with select/insert/
//!   update/delete helpers, prepared statements and plain transactions.
//!   The plain methods log failures and return sentinels (`None`, `false`);
//!   each has a `try_` twin returning [`SqlWebError`].
//! - [`Request`]: GET/POST parameters, HTML-escaped and trimmed on arrival,
//!   looked up by name with optional validation filters.
//! - [`Session`], [`Response`], [`Engine`]: session values, the JSON reply
//!   envelope, and a per-call context tying them together.
//!
//! ```rust
//! use sqlweb::prelude::*;
//!
//! let db = Db::connect(&DbOptions::sqlite(":memory:"))?;
//! db.try_raw_execute("create table t (id integer primary key, name text)")?;
//! let id = db.insert("insert into t (name) values (?1)", &Params::positional(["alice"]), true);
//! assert_eq!(id, InsertResult::Id(1));
//!
//! let row = db.select_one("select name from t where id = :id", &Params::named([("id", 1)]));
//! assert_eq!(row.and_then(|r| r.get("name").cloned()), Some(RowValues::Text("alice".into())));
//! # Ok::<(), SqlWebError>(())
//! ```

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("enable at least one of the `sqlite` or `postgres` features");

pub mod prelude;

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod exports;
pub mod logging;
pub mod request;
pub mod response;
pub mod results;
pub mod session;
pub mod translation;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::{DbOptions, DbOptionsBuilder, Settings};
pub use db::{AnyConnWrapper, Db, InsertResult, Prepared};
pub use engine::Engine;
pub use error::SqlWebError;
pub use request::{FilterKind, FilterOptions, FilteredValue, Method, Request, RequestParam};
pub use response::{Envelope, Response, ResponseCode};
pub use results::{ResultSet, Row};
pub use session::{MemorySessionStore, Session, SessionOptions, SessionStore};
pub use types::{DatabaseType, Params, RowValues};
