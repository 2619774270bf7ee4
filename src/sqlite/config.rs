use tracing::debug;

use super::connection::SqliteConnection;
use crate::error::SqlWebError;

/// Options for opening a `SQLite` database.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    /// File path, or `:memory:`
    pub db_path: String,
    /// Character set requested for the session (`utf8`, `utf16`, ...).
    pub charset: String,
    /// Switch the journal to WAL after opening (ignored for in-memory databases).
    pub wal: bool,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            charset: "utf8".to_owned(),
            wal: false,
        }
    }

    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    #[must_use]
    pub fn with_wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }

    fn is_memory(&self) -> bool {
        self.db_path == ":memory:" || self.db_path.starts_with("file::memory:")
    }
}

/// Map a configured charset to the spelling `PRAGMA encoding` expects.
///
/// # Errors
/// Returns `SqlWebError::ConfigError` for charsets `SQLite` cannot store.
pub fn sqlite_encoding(charset: &str) -> Result<&'static str, SqlWebError> {
    match charset.to_ascii_lowercase().replace('-', "").as_str() {
        "utf8" | "utf8mb4" => Ok("UTF-8"),
        "utf16" => Ok("UTF-16"),
        "utf16le" => Ok("UTF-16le"),
        "utf16be" => Ok("UTF-16be"),
        other => Err(SqlWebError::ConfigError(format!(
            "unsupported SQLite charset: {other}"
        ))),
    }
}

impl SqliteConnection {
    /// Open the database and apply the session settings.
    ///
    /// # Errors
    /// Returns `SqlWebError::ConnectionError` if the file cannot be opened, or
    /// `SqlWebError::ConfigError` for an unsupported charset.
    pub fn open(opts: &SqliteOptions) -> Result<Self, SqlWebError> {
        let encoding = sqlite_encoding(&opts.charset)?;
        let conn = rusqlite::Connection::open(&opts.db_path).map_err(|e| {
            SqlWebError::ConnectionError(format!("Failed to open SQLite database {}: {e}", opts.db_path))
        })?;

        // Only takes effect on a brand-new database file.
        conn.execute_batch(&format!("PRAGMA encoding = '{encoding}';"))?;
        if opts.wal && !opts.is_memory() {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        debug!(path = %opts.db_path, encoding, "sqlite connection opened");
        Ok(SqliteConnection::new(conn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_spellings_are_normalized() {
        assert_eq!(sqlite_encoding("utf8").unwrap(), "UTF-8");
        assert_eq!(sqlite_encoding("UTF-8").unwrap(), "UTF-8");
        assert_eq!(sqlite_encoding("utf-16le").unwrap(), "UTF-16le");
        assert!(sqlite_encoding("latin1").is_err());
    }
}
