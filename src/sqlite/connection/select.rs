use tracing::debug;

use super::SqliteConnection;
use crate::error::SqlWebError;
use crate::results::ResultSet;
use crate::sqlite::params::Bound;
use crate::sqlite::query::build_result_set;

impl SqliteConnection {
    /// Execute a SELECT and materialize into a `ResultSet`.
    ///
    /// # Errors
    /// Returns `SqlWebError` if preparing or executing the query fails.
    pub fn execute_select(
        &self,
        query: &str,
        params: &Bound,
        limit: Option<usize>,
    ) -> Result<ResultSet, SqlWebError> {
        debug!(query, "sqlite select");
        let mut stmt = self.conn.prepare_cached(query)?;
        build_result_set(&mut stmt, params, limit)
    }
}
