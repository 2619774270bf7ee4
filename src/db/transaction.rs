use super::Db;
use super::connection::DbConnection;
use super::executor::sentinel;
use crate::error::SqlWebError;

// Plain BEGIN/COMMIT/ROLLBACK on the one connection. No nesting, no
// savepoints, nothing happens on drop.
impl Db {
    /// # Errors
    /// Returns `SqlWebError` if the driver rejects `BEGIN` (e.g. one is already open).
    pub fn try_begin(&self) -> Result<(), SqlWebError> {
        match &self.conn {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => conn.begin(),
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(conn) => conn.begin(),
        }
    }

    #[must_use]
    pub fn begin(&self) -> bool {
        sentinel("begin", "BEGIN", self.try_begin()).is_some()
    }

    /// # Errors
    /// Returns `SqlWebError` if the driver rejects `COMMIT`.
    pub fn try_commit(&self) -> Result<(), SqlWebError> {
        match &self.conn {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => conn.commit(),
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(conn) => conn.commit(),
        }
    }

    #[must_use]
    pub fn commit(&self) -> bool {
        sentinel("commit", "COMMIT", self.try_commit()).is_some()
    }

    /// # Errors
    /// Returns `SqlWebError` if the driver rejects `ROLLBACK`.
    pub fn try_rollback(&self) -> Result<(), SqlWebError> {
        match &self.conn {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => conn.rollback(),
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(conn) => conn.rollback(),
        }
    }

    #[must_use]
    pub fn rollback(&self) -> bool {
        sentinel("rollback", "ROLLBACK", self.try_rollback()).is_some()
    }

    /// `SQLite` reports the driver's autocommit state; Postgres reports the last
    /// begin/commit/rollback issued through this `Db`.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        match &self.conn {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => conn.in_transaction(),
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(conn) => conn.in_transaction(),
        }
    }
}
