use std::fmt;

/// Connection wrapper around a single `rusqlite` connection.
///
/// Not `Sync`: one logical request owns it at a time.
pub struct SqliteConnection {
    pub(crate) conn: rusqlite::Connection,
}

impl SqliteConnection {
    pub(crate) fn new(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Borrow the raw driver handle.
    pub fn raw(&mut self) -> &mut rusqlite::Connection {
        &mut self.conn
    }

    /// Rowid of the most recent successful insert on this connection.
    #[must_use]
    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.conn.path())
            .field("in_transaction", &!self.conn.is_autocommit())
            .finish()
    }
}
