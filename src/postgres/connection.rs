use std::cell::Cell;
use std::fmt;
use std::future::Future;

use tokio::runtime::Runtime;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, Statement};
use tracing::debug;

use super::params::as_refs;
use super::query::build_result_set;
use crate::error::SqlWebError;
use crate::results::ResultSet;
use crate::translation::{PlaceholderStyle, Translated, translate_for_postgres};
use crate::types::Params;

/// Blocking wrapper around a `tokio_postgres` client and the runtime that drives it.
pub struct PostgresConnection {
    client: Client,
    runtime: Runtime,
    in_transaction: Cell<bool>,
}

/// A server-side prepared statement plus what translation learned about its placeholders.
#[derive(Clone)]
pub struct PostgresPrepared {
    statement: Statement,
    style: PlaceholderStyle,
}

impl PostgresPrepared {
    #[must_use]
    pub fn statement(&self) -> &Statement {
        &self.statement
    }
}

impl PostgresConnection {
    pub(crate) fn new(client: Client, runtime: Runtime) -> Self {
        Self {
            client,
            runtime,
            in_transaction: Cell::new(false),
        }
    }

    /// Borrow the raw async client together with the runtime needed to drive it.
    pub fn raw(&mut self) -> (&mut Client, &Runtime) {
        (&mut self.client, &self.runtime)
    }

    fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    fn prepare_translated(&self, query: &str) -> Result<PostgresPrepared, SqlWebError> {
        let Translated { sql, style } = translate_for_postgres(query)?;
        let statement = self.block_on(self.client.prepare(&sql))?;
        Ok(PostgresPrepared { statement, style })
    }

    /// Prepare, bind and run a row-returning query.
    ///
    /// # Errors
    /// Returns `SqlWebError` if translation, preparation, binding or execution fails.
    pub fn execute_select(
        &self,
        query: &str,
        params: &Params,
        limit: Option<usize>,
    ) -> Result<ResultSet, SqlWebError> {
        debug!(query, "postgres select");
        let prepared = self.prepare_translated(query)?;
        self.select_prepared(&prepared, params, limit)
    }

    /// Prepare, bind and execute a statement; returns rows affected.
    ///
    /// # Errors
    /// Returns `SqlWebError` if translation, preparation, binding or execution fails.
    pub fn execute_dml(&self, query: &str, params: &Params) -> Result<usize, SqlWebError> {
        debug!(query, "postgres execute");
        let prepared = self.prepare_translated(query)?;
        self.execute_prepared(&prepared, params)
    }

    /// Run query text through the simple-query protocol (no binding, several statements allowed).
    ///
    /// # Errors
    /// Returns `SqlWebError` if any statement fails.
    pub fn execute_batch(&self, query: &str) -> Result<(), SqlWebError> {
        debug!(query, "postgres batch");
        self.block_on(self.client.batch_execute(query))?;
        Ok(())
    }

    /// Prepare a statement for repeated execution.
    ///
    /// # Errors
    /// Returns `SqlWebError` if translation or preparation fails.
    pub fn prepare_statement(&self, query: &str) -> Result<PostgresPrepared, SqlWebError> {
        self.prepare_translated(query)
    }

    /// Execute a prepared statement; returns rows affected.
    ///
    /// # Errors
    /// Returns `SqlWebError` if binding or execution fails.
    pub fn execute_prepared(
        &self,
        prepared: &PostgresPrepared,
        params: &Params,
    ) -> Result<usize, SqlWebError> {
        let ordered = prepared.style.bind_order(params)?;
        let affected = self.block_on(self.client.execute(&prepared.statement, &as_refs(&ordered)))?;
        usize::try_from(affected).map_err(|e| {
            SqlWebError::ExecutionError(format!("postgres affected rows conversion error: {e}"))
        })
    }

    /// Run a prepared row-returning statement.
    ///
    /// # Errors
    /// Returns `SqlWebError` if binding, execution or value extraction fails.
    pub fn select_prepared(
        &self,
        prepared: &PostgresPrepared,
        params: &Params,
        limit: Option<usize>,
    ) -> Result<ResultSet, SqlWebError> {
        let ordered = prepared.style.bind_order(params)?;
        let rows = self.block_on(self.client.query(&prepared.statement, &as_refs(&ordered)))?;
        let keep = limit.map_or(rows.len(), |max| max.min(rows.len()));
        build_result_set(&prepared.statement, &rows[..keep])
    }

    /// Run an insert and return the sequence value it generated.
    ///
    /// `LASTVAL()` is read before and after the statement; an insert that
    /// adds no row, or leaves it unchanged, has no key of its own.
    ///
    /// # Errors
    /// Returns `SqlWebError` if the insert fails, inserts nothing or advances no sequence.
    pub fn execute_insert_id(&self, query: &str, params: &Params) -> Result<i64, SqlWebError> {
        let before = self.lastval()?;
        let affected = self.execute_dml(query, params)?;
        if affected == 0 {
            return Err(SqlWebError::ExecutionError(
                "insert affected no rows; no key to return".into(),
            ));
        }
        match self.lastval()? {
            Some(id) if before != Some(id) => Ok(id),
            _ => Err(SqlWebError::ExecutionError(
                "insert advanced no sequence; no key to return".into(),
            )),
        }
    }

    // Inside a transaction a failed LASTVAL() would abort it, so it runs under a savepoint.
    fn lastval(&self) -> Result<Option<i64>, SqlWebError> {
        let guarded = self.in_transaction.get();
        if guarded {
            self.execute_batch("SAVEPOINT sqlweb_lastval")?;
        }
        let outcome = self.block_on(self.client.query_one("SELECT LASTVAL()", &[]));
        if guarded {
            let close = if outcome.is_ok() {
                "RELEASE SAVEPOINT sqlweb_lastval"
            } else {
                "ROLLBACK TO SAVEPOINT sqlweb_lastval; RELEASE SAVEPOINT sqlweb_lastval"
            };
            self.execute_batch(close)?;
        }
        match outcome {
            Ok(row) => Ok(Some(row.try_get::<_, i64>(0)?)),
            Err(e) if e.code() == Some(&SqlState::OBJECT_NOT_IN_PREREQUISITE_STATE) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Issue `BEGIN`.
    ///
    /// # Errors
    /// Returns `SqlWebError` if the server rejects it.
    pub fn begin(&self) -> Result<(), SqlWebError> {
        self.execute_batch("BEGIN")?;
        self.in_transaction.set(true);
        Ok(())
    }

    /// Issue `COMMIT`.
    ///
    /// # Errors
    /// Returns `SqlWebError` if the server rejects it.
    pub fn commit(&self) -> Result<(), SqlWebError> {
        self.execute_batch("COMMIT")?;
        self.in_transaction.set(false);
        Ok(())
    }

    /// Issue `ROLLBACK`.
    ///
    /// # Errors
    /// Returns `SqlWebError` if the server rejects it.
    pub fn rollback(&self) -> Result<(), SqlWebError> {
        self.execute_batch("ROLLBACK")?;
        self.in_transaction.set(false);
        Ok(())
    }

    /// Tracks the last `begin`/`commit`/`rollback` issued through this wrapper.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction.get()
    }
}

impl fmt::Debug for PostgresPrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresPrepared")
            .field("style", &self.style)
            .field("params", &self.statement.params().len())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("closed", &self.client.is_closed())
            .field("in_transaction", &self.in_transaction.get())
            .finish_non_exhaustive()
    }
}
