//! Connection options and process settings.
//!
//! `DbOptions` is what `Db::connect` consumes; `Settings` gathers everything a
//! bootstrap needs (database, session, production flag) from the environment.

use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::error::SqlWebError;
use crate::session::SessionOptions;
use crate::types::DatabaseType;

#[cfg(feature = "postgres")]
use crate::postgres::PostgresOptions;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteOptions;

pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_CHARSET: &str = "utf8";

/// Everything needed to open the one database connection.
///
/// For `SQLite`, `dbname` is the file path (or `:memory:`) and the network
/// fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbOptions {
    pub db_type: DatabaseType,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub charset: String,
    /// `SQLite` only: switch a file database to write-ahead logging.
    pub wal: bool,
}

impl DbOptions {
    #[cfg(feature = "sqlite")]
    #[must_use]
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            db_type: DatabaseType::Sqlite,
            host: String::new(),
            port: 0,
            user: String::new(),
            password: String::new(),
            dbname: path.into(),
            charset: DEFAULT_CHARSET.to_owned(),
            wal: false,
        }
    }

    #[cfg(feature = "postgres")]
    #[must_use]
    pub fn postgres(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        dbname: impl Into<String>,
    ) -> Self {
        Self {
            db_type: DatabaseType::Postgres,
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            dbname: dbname.into(),
            charset: DEFAULT_CHARSET.to_owned(),
            wal: false,
        }
    }

    #[must_use]
    pub fn builder(db_type: DatabaseType) -> DbOptionsBuilder {
        DbOptionsBuilder::new(db_type)
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

    #[cfg(feature = "sqlite")]
    #[must_use]
    pub fn to_sqlite(&self) -> SqliteOptions {
        SqliteOptions::new(self.dbname.clone())
            .with_charset(self.charset.clone())
            .with_wal(self.wal)
    }

    #[cfg(feature = "postgres")]
    #[must_use]
    pub fn to_postgres(&self) -> PostgresOptions {
        PostgresOptions::new(
            self.host.clone(),
            self.port,
            self.user.clone(),
            self.password.clone(),
            self.dbname.clone(),
        )
        .with_charset(self.charset.clone())
    }
}

/// Fluent builder for `DbOptions`.
#[derive(Debug, Clone)]
pub struct DbOptionsBuilder {
    opts: DbOptions,
}

impl DbOptionsBuilder {
    #[must_use]
    pub fn new(db_type: DatabaseType) -> Self {
        Self {
            opts: DbOptions {
                db_type,
                host: "localhost".to_owned(),
                port: DEFAULT_PORT,
                user: String::new(),
                password: String::new(),
                dbname: String::new(),
                charset: DEFAULT_CHARSET.to_owned(),
                wal: false,
            },
        }
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.opts.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.opts.port = port;
        self
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.opts.user = user.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.opts.password = password.into();
        self
    }

    #[must_use]
    pub fn dbname(mut self, dbname: impl Into<String>) -> Self {
        self.opts.dbname = dbname.into();
        self
    }

    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.opts.charset = charset.into();
        self
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn finish(self) -> DbOptions {
        self.opts
    }
}

/// Backend used when nothing is configured.
#[must_use]
pub fn default_db_type() -> DatabaseType {
    #[cfg(feature = "sqlite")]
    {
        DatabaseType::Sqlite
    }
    #[cfg(not(feature = "sqlite"))]
    {
        DatabaseType::Postgres
    }
}

/// Process-wide settings read once at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db: DbOptions,
    pub session: SessionOptions,
    pub prod: bool,
    /// Application root used when `prod` is set.
    pub prod_path: PathBuf,
    /// Application root used otherwise.
    pub dev_path: PathBuf,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `SqlWebError::ConfigError` if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, SqlWebError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    /// Returns `SqlWebError::ConfigError` if a variable holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SqlWebError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_type = match get("SQLWEB_DB_TYPE") {
            Some(raw) => DatabaseType::from_str(raw.trim(), true).map_err(|e| {
                SqlWebError::ConfigError(format!("SQLWEB_DB_TYPE: {e}"))
            })?,
            None => default_db_type(),
        };

        let port = match get("SQLWEB_DB_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                SqlWebError::ConfigError(format!("SQLWEB_DB_PORT={raw}: {e}"))
            })?,
            None => DEFAULT_PORT,
        };

        let lifetime_secs = match get("SQLWEB_SESSION_LIFETIME") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                SqlWebError::ConfigError(format!("SQLWEB_SESSION_LIFETIME={raw}: {e}"))
            })?,
            None => SessionOptions::default().lifetime_secs,
        };

        let db = DbOptions {
            db_type,
            host: get("SQLWEB_DB_HOST").unwrap_or_else(|| "localhost".to_owned()),
            port,
            user: lookup("SQLWEB_DB_USER").unwrap_or_default(),
            password: lookup("SQLWEB_DB_PASSWORD").unwrap_or_default(),
            dbname: get("SQLWEB_DB_NAME").unwrap_or_else(|| ":memory:".to_owned()),
            charset: get("SQLWEB_DB_CHARSET").unwrap_or_else(|| DEFAULT_CHARSET.to_owned()),
            wal: get("SQLWEB_SQLITE_WAL").is_some_and(|v| is_truthy(&v)),
        };

        let session = SessionOptions {
            name: get("SQLWEB_SESSION_NAME")
                .unwrap_or_else(|| SessionOptions::default().name),
            lifetime_secs,
        };

        let prod = get("PROD").is_some_and(|v| is_truthy(&v));

        Ok(Settings {
            db,
            session,
            prod,
            prod_path: get("SQLWEB_PROD_PATH").map_or_else(|| PathBuf::from("."), PathBuf::from),
            dev_path: get("SQLWEB_DEV_PATH").map_or_else(|| PathBuf::from("."), PathBuf::from),
        })
    }

    /// The application root for the current mode.
    #[must_use]
    pub fn path(&self) -> &Path {
        if self.prod { &self.prod_path } else { &self.dev_path }
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
