use tracing::debug;

use super::SqliteConnection;
use crate::error::SqlWebError;
use crate::sqlite::params::Bound;

impl SqliteConnection {
    /// Prepare, bind and execute a statement; returns rows affected.
    ///
    /// # Errors
    /// Returns `SqlWebError` if preparing or executing the statement fails.
    pub fn execute_dml(&self, query: &str, params: &Bound) -> Result<usize, SqlWebError> {
        debug!(query, "sqlite execute");
        let mut stmt = self.conn.prepare_cached(query)?;
        let affected = params.execute(&mut stmt)?;
        Ok(affected)
    }

    /// Run query text without preparing it; `;`-separated statements are allowed.
    ///
    /// # Errors
    /// Returns `SqlWebError` if any statement in the batch fails.
    pub fn execute_batch(&self, query: &str) -> Result<(), SqlWebError> {
        debug!(query, "sqlite batch");
        self.conn.execute_batch(query)?;
        Ok(())
    }
}
