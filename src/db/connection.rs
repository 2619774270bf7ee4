use tracing::{error, info};

use super::AnyConnWrapper;
use crate::config::DbOptions;
use crate::error::SqlWebError;
use crate::types::DatabaseType;

#[cfg(feature = "postgres")]
use crate::postgres::PostgresConnection;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteConnection;

#[derive(Debug)]
pub(crate) enum DbConnection {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteConnection),
    #[cfg(feature = "postgres")]
    Postgres(PostgresConnection),
}

/// The one live database connection of a process or request.
///
/// Every executor and transaction method runs on this connection. SQL errors
/// are logged at `warn` and turned into sentinels by the plain methods; the
/// `try_` methods return them instead.
#[derive(Debug)]
pub struct Db {
    pub(crate) conn: DbConnection,
}

impl Db {
    /// Open the connection described by `options` and apply its session settings.
    ///
    /// # Errors
    /// Returns `SqlWebError::ConfigError` for missing or unsupported options and
    /// `SqlWebError::ConnectionError` if the database cannot be reached.
    pub fn connect(options: &DbOptions) -> Result<Db, SqlWebError> {
        let conn = match options.db_type {
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => {
                if options.dbname.trim().is_empty() {
                    return Err(SqlWebError::ConfigError(
                        "a database path (or :memory:) is required".to_string(),
                    ));
                }
                DbConnection::Sqlite(SqliteConnection::open(&options.to_sqlite())?)
            }
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => {
                DbConnection::Postgres(PostgresConnection::connect(&options.to_postgres())?)
            }
        };
        info!(db_type = ?options.db_type, dbname = %options.dbname, "database connected");
        Ok(Db { conn })
    }

    /// Like [`Db::connect`], but a failure ends the process with exit status 1.
    ///
    /// Meant for one-shot scripts that cannot do anything useful without a database.
    #[must_use]
    pub fn connect_or_exit(options: &DbOptions) -> Db {
        match Self::connect(options) {
            Ok(db) => db,
            Err(e) => {
                error!(error = %e, db_type = ?options.db_type, "database connection failed");
                eprintln!("Connection failed: {e}");
                std::process::exit(1);
            }
        }
    }

    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        match &self.conn {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(_) => DatabaseType::Sqlite,
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(_) => DatabaseType::Postgres,
        }
    }

    /// Run `f` against the raw driver handle.
    ///
    /// ```rust,no_run
    /// use sqlweb::prelude::*;
    ///
    /// let mut db = Db::connect(&DbOptions::sqlite(":memory:"))?;
    /// let version = db.with_raw(|raw| match raw {
    ///     AnyConnWrapper::Sqlite(conn) => conn
    ///         .query_row("select sqlite_version()", [], |r| r.get::<_, String>(0))
    ///         .ok(),
    ///     #[allow(unreachable_patterns)]
    ///     _ => None,
    /// });
    /// # let _ = version;
    /// # Ok::<(), SqlWebError>(())
    /// ```
    pub fn with_raw<R>(&mut self, f: impl FnOnce(AnyConnWrapper<'_>) -> R) -> R {
        match &mut self.conn {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => f(AnyConnWrapper::Sqlite(conn.raw())),
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(conn) => {
                let (client, runtime) = conn.raw();
                f(AnyConnWrapper::Postgres { client, runtime })
            }
        }
    }
}
