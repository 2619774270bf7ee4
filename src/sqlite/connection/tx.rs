use tracing::debug;

use super::SqliteConnection;
use crate::error::SqlWebError;

impl SqliteConnection {
    /// Issue `BEGIN`. A second call while one is open fails in the driver.
    ///
    /// # Errors
    /// Returns `SqlWebError` if the transaction cannot be started.
    pub fn begin(&self) -> Result<(), SqlWebError> {
        debug!("sqlite begin");
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    /// Issue `COMMIT`.
    ///
    /// # Errors
    /// Returns `SqlWebError` if committing fails or no transaction is active.
    pub fn commit(&self) -> Result<(), SqlWebError> {
        debug!("sqlite commit");
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    /// Issue `ROLLBACK`.
    ///
    /// # Errors
    /// Returns `SqlWebError` if rolling back fails or no transaction is active.
    pub fn rollback(&self) -> Result<(), SqlWebError> {
        debug!("sqlite rollback");
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }
}
