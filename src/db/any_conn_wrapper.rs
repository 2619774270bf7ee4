#[cfg(feature = "postgres")]
use tokio::runtime::Runtime;

/// Raw driver handle handed out by [`Db::with_raw`](super::Db::with_raw).
///
/// Postgres calls are async; drive them with the runtime that comes with the client.
pub enum AnyConnWrapper<'a> {
    #[cfg(feature = "sqlite")]
    Sqlite(&'a mut rusqlite::Connection),
    #[cfg(feature = "postgres")]
    Postgres {
        client: &'a mut tokio_postgres::Client,
        runtime: &'a Runtime,
    },
}

impl std::fmt::Debug for AnyConnWrapper<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => f.debug_tuple("Sqlite").field(&conn.path()).finish(),
            #[cfg(feature = "postgres")]
            Self::Postgres { .. } => f.debug_tuple("Postgres").field(&"<Client>").finish(),
        }
    }
}
