//! Per-call context: the database, the request and the session together.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, error};

use crate::config::Settings;
use crate::db::Db;
use crate::error::SqlWebError;
use crate::logging::init_tracing;
use crate::request::Request;
use crate::response::{Response, ResponseCode};
use crate::session::{Session, SessionStore};

/// Everything one inbound call works with.
///
/// ```rust,no_run
/// use sqlweb::prelude::*;
///
/// let settings = Settings::from_env()?;
/// let store = MemorySessionStore::new();
/// let request = Request::from_encoded("id=3", "")?;
/// let mut engine = Engine::create(&settings, request, &store, None)?;
///
/// let id = engine.request().get_int("id", None).unwrap_or_default();
/// let row = engine.db().select_one("select ?1 as id", &Params::positional([id]));
/// engine.session_mut().set_value("last_id", id)?;
/// let body = engine.respond(&row, ResponseCode::OK)?;
/// engine.finish(&store)?;
/// # let _ = body;
/// # Ok::<(), SqlWebError>(())
/// ```
#[derive(Debug)]
pub struct Engine {
    settings: Settings,
    db: Db,
    request: Request,
    session: Session,
}

impl Engine {
    /// Install logging (once per process), connect, and start the session.
    ///
    /// # Errors
    /// Returns `SqlWebError` if the database connection or the session store fails.
    pub fn create(
        settings: &Settings,
        request: Request,
        store: &dyn SessionStore,
        incoming_session_id: Option<&str>,
    ) -> Result<Engine, SqlWebError> {
        init_tracing(settings.prod);
        let db = Db::connect(&settings.db)?;
        let session = Session::start(&settings.session, store, incoming_session_id)?;
        debug!(prod = settings.prod, params = request.len(), "engine ready");
        Ok(Engine {
            settings: settings.clone(),
            db,
            request,
            session,
        })
    }

    /// Like [`Engine::create`], but a failure ends the process with exit status 1.
    #[must_use]
    pub fn create_or_exit(
        settings: &Settings,
        request: Request,
        store: &dyn SessionStore,
        incoming_session_id: Option<&str>,
    ) -> Engine {
        match Self::create(settings, request, store, incoming_session_id) {
            Ok(engine) => engine,
            Err(e) => {
                error!(error = %e, "engine start-up failed");
                eprintln!("Start-up failed: {e}");
                std::process::exit(1);
            }
        }
    }

    #[must_use]
    pub fn db(&self) -> &Db {
        &self.db
    }

    /// Mutable access, needed for [`Db::with_raw`].
    pub fn db_mut(&mut self) -> &mut Db {
        &mut self.db
    }

    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn is_prod(&self) -> bool {
        self.settings.prod
    }

    /// Application root for the current mode.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.settings.path()
    }

    /// See [`Response::json`].
    ///
    /// # Errors
    /// Returns `SqlWebError::SerializationError` if `data` cannot be serialized.
    pub fn respond<T: Serialize>(&self, data: &T, code: ResponseCode) -> Result<String, SqlWebError> {
        Response::json(data, code)
    }

    /// Persist the session and release the connection.
    ///
    /// # Errors
    /// Returns `SqlWebError::SessionError` if the session cannot be saved.
    pub fn finish(self, store: &dyn SessionStore) -> Result<(), SqlWebError> {
        self.session.save(store)
    }
}
