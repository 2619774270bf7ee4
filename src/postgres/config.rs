use tokio_postgres::NoTls;
use tracing::{debug, error};

use super::connection::PostgresConnection;
use crate::error::SqlWebError;

/// Options for connecting to a `PostgreSQL` server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresOptions {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub charset: String,
}

impl PostgresOptions {
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        dbname: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            dbname: dbname.into(),
            charset: "utf8".to_owned(),
        }
    }

    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    fn validate(&self) -> Result<(), SqlWebError> {
        if self.host.is_empty() {
            return Err(SqlWebError::ConfigError("host is required".to_string()));
        }
        if self.dbname.is_empty() {
            return Err(SqlWebError::ConfigError("dbname is required".to_string()));
        }
        if self.user.is_empty() {
            return Err(SqlWebError::ConfigError("user is required".to_string()));
        }
        Ok(())
    }
}

/// Map a configured charset to a `client_encoding` name.
///
/// # Errors
/// Returns `SqlWebError::ConfigError` if the name contains anything but
/// letters, digits, `_` or `-` (it ends up in a `SET` statement).
pub fn postgres_encoding(charset: &str) -> Result<String, SqlWebError> {
    let lowered = charset.to_ascii_lowercase();
    match lowered.as_str() {
        "utf8" | "utf-8" | "utf8mb4" => Ok("UTF8".to_owned()),
        _ if !charset.is_empty()
            && charset
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') =>
        {
            Ok(charset.to_ascii_uppercase())
        }
        _ => Err(SqlWebError::ConfigError(format!(
            "unsupported Postgres charset: {charset}"
        ))),
    }
}

impl PostgresConnection {
    /// Connect, then force the session character set.
    ///
    /// The driver is async; a private current-thread runtime drives it so every
    /// call on the returned connection blocks until the server answers.
    ///
    /// # Errors
    /// Returns `SqlWebError::ConfigError` for missing options and
    /// `SqlWebError::ConnectionError` if the server cannot be reached.
    pub fn connect(opts: &PostgresOptions) -> Result<Self, SqlWebError> {
        opts.validate()?;
        let encoding = postgres_encoding(&opts.charset)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                SqlWebError::ConnectionError(format!("Failed to start Postgres runtime: {e}"))
            })?;

        let mut cfg = tokio_postgres::Config::new();
        cfg.host(&opts.host)
            .port(opts.port)
            .user(&opts.user)
            .password(&opts.password)
            .dbname(&opts.dbname);

        let (client, connection) = runtime.block_on(cfg.connect(NoTls)).map_err(|e| {
            SqlWebError::ConnectionError(format!(
                "Failed to connect to Postgres at {}:{}: {e}",
                opts.host, opts.port
            ))
        })?;
        runtime.spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "postgres connection closed with error");
            }
        });

        let conn = PostgresConnection::new(client, runtime);
        conn.execute_batch(&format!("SET client_encoding TO '{encoding}'"))?;
        debug!(host = %opts.host, port = opts.port, dbname = %opts.dbname, "postgres connection opened");
        Ok(conn)
    }
}
