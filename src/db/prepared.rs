use std::sync::Arc;

use super::Db;
use super::connection::DbConnection;
use super::executor::sentinel;
use crate::error::SqlWebError;
use crate::results::ResultSet;
use crate::types::{DatabaseType, Params};

#[cfg(feature = "postgres")]
use crate::postgres::PostgresPrepared;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteParams;

/// A statement compiled once by [`Db::prepare`] and run any number of times.
///
/// `SQLite` keeps the compiled form in the connection's statement cache, keyed
/// by the text; Postgres keeps a server-side statement.
#[derive(Debug, Clone)]
pub struct Prepared {
    sql: Arc<str>,
    inner: PreparedInner,
}

#[derive(Debug, Clone)]
enum PreparedInner {
    #[cfg(feature = "sqlite")]
    Sqlite,
    #[cfg(feature = "postgres")]
    Postgres(PostgresPrepared),
}

impl Prepared {
    /// The query text as given to `prepare`.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        match self.inner {
            #[cfg(feature = "sqlite")]
            PreparedInner::Sqlite => DatabaseType::Sqlite,
            #[cfg(feature = "postgres")]
            PreparedInner::Postgres(_) => DatabaseType::Postgres,
        }
    }
}

fn wrong_backend(prepared: &Prepared, db: &Db) -> SqlWebError {
    SqlWebError::ExecutionError(format!(
        "statement prepared for {:?} cannot run on {:?}",
        prepared.database_type(),
        db.database_type()
    ))
}

impl Db {
    /// Compile `query` for repeated execution.
    ///
    /// # Errors
    /// Returns `SqlWebError` if the statement does not compile.
    pub fn try_prepare(&self, query: &str) -> Result<Prepared, SqlWebError> {
        let inner = match &self.conn {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => {
                conn.prepare_statement(query)?;
                PreparedInner::Sqlite
            }
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(conn) => PreparedInner::Postgres(conn.prepare_statement(query)?),
        };
        Ok(Prepared {
            sql: Arc::from(query),
            inner,
        })
    }

    #[must_use]
    pub fn prepare(&self, query: &str) -> Option<Prepared> {
        sentinel("prepare", query, self.try_prepare(query))
    }

    /// Bind `params` to a prepared statement and execute it; returns rows affected.
    ///
    /// # Errors
    /// Returns `SqlWebError` if binding or execution fails, or the statement was
    /// prepared on another backend.
    pub fn try_execute_with(&self, prepared: &Prepared, params: &Params) -> Result<usize, SqlWebError> {
        match (&self.conn, &prepared.inner) {
            #[cfg(feature = "sqlite")]
            (DbConnection::Sqlite(conn), PreparedInner::Sqlite) => {
                conn.execute_dml(prepared.sql(), &SqliteParams::convert(params))
            }
            #[cfg(feature = "postgres")]
            (DbConnection::Postgres(conn), PreparedInner::Postgres(stmt)) => {
                conn.execute_prepared(stmt, params)
            }
            #[allow(unreachable_patterns)]
            _ => Err(wrong_backend(prepared, self)),
        }
    }

    /// `true` if the prepared statement ran, even when it touched no rows.
    #[must_use]
    pub fn execute_with(&self, prepared: &Prepared, params: &Params) -> bool {
        sentinel(
            "execute_with",
            prepared.sql(),
            self.try_execute_with(prepared, params),
        )
        .is_some()
    }

    /// Bind `params` to a prepared statement and collect the rows it returns.
    ///
    /// # Errors
    /// Returns `SqlWebError` if binding or execution fails, or the statement was
    /// prepared on another backend.
    pub fn try_query_with(&self, prepared: &Prepared, params: &Params) -> Result<ResultSet, SqlWebError> {
        match (&self.conn, &prepared.inner) {
            #[cfg(feature = "sqlite")]
            (DbConnection::Sqlite(conn), PreparedInner::Sqlite) => {
                conn.execute_select(prepared.sql(), &SqliteParams::convert(params), None)
            }
            #[cfg(feature = "postgres")]
            (DbConnection::Postgres(conn), PreparedInner::Postgres(stmt)) => {
                conn.select_prepared(stmt, params, None)
            }
            #[allow(unreachable_patterns)]
            _ => Err(wrong_backend(prepared, self)),
        }
    }

    #[must_use]
    pub fn query_with(&self, prepared: &Prepared, params: &Params) -> Option<ResultSet> {
        sentinel(
            "query_with",
            prepared.sql(),
            self.try_query_with(prepared, params),
        )
    }
}
