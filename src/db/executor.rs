use tracing::warn;

use super::Db;
use super::connection::DbConnection;
use crate::error::SqlWebError;
use crate::results::{ResultSet, Row};
use crate::types::{DatabaseType, Params};

#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteParams;

/// Outcome of [`Db::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Whether the insert ran; returned when no id was requested, and on failure.
    Success(bool),
    /// Generated key of the inserted row.
    Id(i64),
}

impl InsertResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, InsertResult::Success(true) | InsertResult::Id(_))
    }

    #[must_use]
    pub fn id(&self) -> Option<i64> {
        match self {
            InsertResult::Id(id) => Some(*id),
            InsertResult::Success(_) => None,
        }
    }
}

/// Row-window suffix appended by [`Db::select_page`].
///
/// Both numbers are rendered as literals, never bound.
#[must_use]
pub fn window_clause(db_type: DatabaseType, start: u64, limit: u64) -> String {
    match db_type {
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => format!(" LIMIT {start}, {limit}"),
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => format!(" LIMIT {limit} OFFSET {start}"),
    }
}

/// Log a swallowed error and collapse the result into an `Option`.
pub(crate) fn sentinel<T>(
    operation: &'static str,
    query: &str,
    result: Result<T, SqlWebError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(operation, query, error = %e, "statement failed");
            None
        }
    }
}

impl Db {
    pub(crate) fn run_select(
        &self,
        query: &str,
        params: &Params,
        limit: Option<usize>,
    ) -> Result<ResultSet, SqlWebError> {
        match &self.conn {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => {
                conn.execute_select(query, &SqliteParams::convert(params), limit)
            }
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(conn) => conn.execute_select(query, params, limit),
        }
    }

    pub(crate) fn run_execute(&self, query: &str, params: &Params) -> Result<usize, SqlWebError> {
        match &self.conn {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => conn.execute_dml(query, &SqliteParams::convert(params)),
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(conn) => conn.execute_dml(query, params),
        }
    }


    /// First row of the result, or `None` when there is none.
    ///
    /// # Errors
    /// Returns `SqlWebError` if the query cannot be prepared or executed.
    pub fn try_select_one(&self, query: &str, params: &Params) -> Result<Option<Row>, SqlWebError> {
        let rows = self.run_select(query, params, Some(1))?;
        Ok(rows.into_rows().into_iter().next())
    }

    /// First row of the result; `None` if there is no row or the query failed.
    #[must_use]
    pub fn select_one(&self, query: &str, params: &Params) -> Option<Row> {
        sentinel("select_one", query, self.try_select_one(query, params)).flatten()
    }

    /// Every row of the result; an empty set when nothing matched.
    ///
    /// # Errors
    /// Returns `SqlWebError` if the query cannot be prepared or executed.
    pub fn try_select_all(&self, query: &str, params: &Params) -> Result<ResultSet, SqlWebError> {
        self.run_select(query, params, None)
    }

    /// Every row of the result; `None` only if the query failed.
    #[must_use]
    pub fn select_all(&self, query: &str, params: &Params) -> Option<ResultSet> {
        sentinel("select_all", query, self.try_select_all(query, params))
    }

    /// Rows `start..start + limit` of the result.
    ///
    /// The caller's text must not already end in a row-window clause; give it
    /// an `ORDER BY` for stable pages.
    ///
    /// # Errors
    /// Returns `SqlWebError` if the query cannot be prepared or executed.
    pub fn try_select_page(
        &self,
        query: &str,
        params: &Params,
        start: u64,
        limit: u64,
    ) -> Result<ResultSet, SqlWebError> {
        let base = query.trim_end().trim_end_matches(';').trim_end();
        let paged = format!("{base}{}", window_clause(self.database_type(), start, limit));
        self.run_select(&paged, params, None)
    }

    #[must_use]
    pub fn select_page(
        &self,
        query: &str,
        params: &Params,
        start: u64,
        limit: u64,
    ) -> Option<ResultSet> {
        sentinel(
            "select_page",
            query,
            self.try_select_page(query, params, start, limit),
        )
    }

    /// Run an insert; returns rows affected.
    ///
    /// # Errors
    /// Returns `SqlWebError` if the statement cannot be prepared or executed.
    pub fn try_insert(&self, query: &str, params: &Params) -> Result<usize, SqlWebError> {
        self.run_execute(query, params)
    }

    /// Run an insert and return the key generated for it.
    ///
    /// # Errors
    /// Returns `SqlWebError` if the insert fails, inserts no row (`INSERT OR
    /// IGNORE` on a conflict) or no key can be read back (on Postgres the
    /// table needs a sequence-backed column).
    pub fn try_insert_id(&self, query: &str, params: &Params) -> Result<i64, SqlWebError> {
        match &self.conn {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => {
                let affected = conn.execute_dml(query, &SqliteParams::convert(params))?;
                if affected == 0 {
                    return Err(SqlWebError::ExecutionError(
                        "insert affected no rows; no key to return".into(),
                    ));
                }
                Ok(conn.last_insert_id())
            }
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(conn) => conn.execute_insert_id(query, params),
        }
    }

    /// Run an insert.
    ///
    /// With `return_id` the generated key comes back as [`InsertResult::Id`].
    /// Any failure yields `InsertResult::Success(false)`.
    #[must_use]
    pub fn insert(&self, query: &str, params: &Params, return_id: bool) -> InsertResult {
        if return_id {
            sentinel("insert", query, self.try_insert_id(query, params))
                .map_or(InsertResult::Success(false), InsertResult::Id)
        } else {
            InsertResult::Success(sentinel("insert", query, self.try_insert(query, params)).is_some())
        }
    }

    /// # Errors
    /// Returns `SqlWebError` if the statement cannot be prepared or executed.
    pub fn try_update(&self, query: &str, params: &Params) -> Result<usize, SqlWebError> {
        self.run_execute(query, params)
    }

    /// `true` if the update ran, even when it touched no rows.
    #[must_use]
    pub fn update(&self, query: &str, params: &Params) -> bool {
        sentinel("update", query, self.try_update(query, params)).is_some()
    }

    /// # Errors
    /// Returns `SqlWebError` if the statement cannot be prepared or executed.
    pub fn try_delete(&self, query: &str, params: &Params) -> Result<usize, SqlWebError> {
        self.run_execute(query, params)
    }

    /// `true` if the delete ran, even when it touched no rows.
    #[must_use]
    pub fn delete(&self, query: &str, params: &Params) -> bool {
        sentinel("delete", query, self.try_delete(query, params)).is_some()
    }

    /// Prepare and execute one statement that takes no parameters.
    ///
    /// # Errors
    /// Returns `SqlWebError` if the statement cannot be prepared or executed.
    pub fn try_statement_no_params(&self, query: &str) -> Result<usize, SqlWebError> {
        self.run_execute(query, &Params::empty())
    }

    #[must_use]
    pub fn statement_no_params(&self, query: &str) -> bool {
        sentinel(
            "statement_no_params",
            query,
            self.try_statement_no_params(query),
        )
        .is_some()
    }

    /// Run text as-is, without preparing it. Several `;`-separated statements
    /// are allowed; nothing can be bound.
    ///
    /// # Errors
    /// Returns `SqlWebError` if any statement fails.
    pub fn try_raw_execute(&self, query: &str) -> Result<(), SqlWebError> {
        match &self.conn {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => conn.execute_batch(query),
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(conn) => conn.execute_batch(query),
        }
    }

    #[must_use]
    pub fn raw_execute(&self, query: &str) -> bool {
        sentinel("raw_execute", query, self.try_raw_execute(query)).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_window_uses_offset_comma_form() {
        assert_eq!(window_clause(DatabaseType::Sqlite, 10, 5), " LIMIT 10, 5");
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn postgres_window_uses_offset_keyword() {
        assert_eq!(
            window_clause(DatabaseType::Postgres, 10, 5),
            " LIMIT 5 OFFSET 10"
        );
    }

    #[test]
    fn insert_result_accessors() {
        assert!(InsertResult::Id(3).is_success());
        assert_eq!(InsertResult::Id(3).id(), Some(3));
        assert!(InsertResult::Success(true).is_success());
        assert!(!InsertResult::Success(false).is_success());
        assert_eq!(InsertResult::Success(true).id(), None);
    }
}
