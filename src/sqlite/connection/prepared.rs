use super::SqliteConnection;
use crate::error::SqlWebError;

impl SqliteConnection {
    /// Compile `query` once and keep it in the connection's statement cache so
    /// later executions reuse it.
    ///
    /// # Errors
    /// Returns `SqlWebError` if the statement does not compile.
    pub fn prepare_statement(&self, query: &str) -> Result<(), SqlWebError> {
        let _ = self.conn.prepare_cached(query)?;
        Ok(())
    }
}
