//! Named, expiring key/value sessions.
//!
//! A `Session` is resumed from (or created in) a `SessionStore` at the start of
//! a request and written back with `save` at the end.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::SqlWebError;

pub const DEFAULT_SESSION_NAME: &str = "sqlweb_session";
pub const DEFAULT_SESSION_LIFETIME_SECS: u64 = 86_400;

/// Session cookie name and lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub name: String,
    pub lifetime_secs: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_SESSION_NAME.to_owned(),
            lifetime_secs: DEFAULT_SESSION_LIFETIME_SECS,
        }
    }
}

/// What a store keeps per session id.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionData {
    pub values: HashMap<String, Value>,
    pub expires_at: DateTime<Utc>,
}

/// Persistence for session data, keyed by session id.
pub trait SessionStore {
    /// # Errors
    /// Returns `SqlWebError::SessionError` if the backing storage fails.
    fn load(&self, id: &str) -> Result<Option<SessionData>, SqlWebError>;

    /// # Errors
    /// Returns `SqlWebError::SessionError` if the backing storage fails.
    fn save(&self, id: &str, data: &SessionData) -> Result<(), SqlWebError>;

    /// # Errors
    /// Returns `SqlWebError::SessionError` if the backing storage fails.
    fn destroy(&self, id: &str) -> Result<(), SqlWebError>;
}

/// In-process store; contents are lost when the process exits.
///
/// Expired sessions are swept on every `save`.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, SessionData>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, SessionData>>, SqlWebError> {
        self.sessions
            .lock()
            .map_err(|e| SqlWebError::SessionError(format!("session store poisoned: {e}")))
    }

    /// Number of stored sessions, expired ones included.
    ///
    /// # Errors
    /// Returns `SqlWebError::SessionError` if the store lock is poisoned.
    pub fn len(&self) -> Result<usize, SqlWebError> {
        Ok(self.lock()?.len())
    }

    /// # Errors
    /// Returns `SqlWebError::SessionError` if the store lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, SqlWebError> {
        Ok(self.lock()?.is_empty())
    }

    /// Drop every session whose expiry has passed; returns how many went.
    ///
    /// # Errors
    /// Returns `SqlWebError::SessionError` if the store lock is poisoned.
    pub fn purge_expired(&self) -> Result<usize, SqlWebError> {
        let mut sessions = self.lock()?;
        Ok(purge(&mut sessions, Utc::now()))
    }
}

fn purge(sessions: &mut HashMap<String, SessionData>, now: DateTime<Utc>) -> usize {
    let before = sessions.len();
    sessions.retain(|_, data| data.expires_at > now);
    let purged = before - sessions.len();
    if purged > 0 {
        debug!(purged, "expired sessions dropped");
    }
    purged
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: &str) -> Result<Option<SessionData>, SqlWebError> {
        Ok(self.lock()?.get(id).cloned())
    }

    // Each save also sweeps expired entries, so abandoned sessions do not pile up.
    fn save(&self, id: &str, data: &SessionData) -> Result<(), SqlWebError> {
        let mut sessions = self.lock()?;
        purge(&mut sessions, Utc::now());
        sessions.insert(id.to_owned(), data.clone());
        Ok(())
    }

    fn destroy(&self, id: &str) -> Result<(), SqlWebError> {
        self.lock()?.remove(id);
        Ok(())
    }
}

/// The session bound to the current request.
#[derive(Debug, Clone)]
pub struct Session {
    name: String,
    id: String,
    lifetime: Duration,
    values: HashMap<String, Value>,
}

impl Session {
    /// Resume the session named by `incoming_id` if the store still holds it
    /// unexpired; otherwise start a new one with a fresh id.
    ///
    /// # Errors
    /// Returns `SqlWebError::SessionError` if the store fails or the lifetime
    /// would push the expiry past the representable date range.
    pub fn start(
        options: &SessionOptions,
        store: &dyn SessionStore,
        incoming_id: Option<&str>,
    ) -> Result<Session, SqlWebError> {
        let lifetime = i64::try_from(options.lifetime_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .filter(|lifetime| Utc::now().checked_add_signed(*lifetime).is_some())
            .ok_or_else(|| {
                SqlWebError::SessionError(format!(
                    "session lifetime out of range: {}",
                    options.lifetime_secs
                ))
            })?;

        if let Some(id) = incoming_id.filter(|id| is_valid_id(id)) {
            match store.load(id)? {
                Some(data) if data.expires_at > Utc::now() => {
                    debug!(session = %options.name, "session resumed");
                    return Ok(Session {
                        name: options.name.clone(),
                        id: id.to_owned(),
                        lifetime,
                        values: data.values,
                    });
                }
                Some(_) => {
                    debug!(session = %options.name, "session expired");
                    store.destroy(id)?;
                }
                None => {}
            }
        }

        debug!(session = %options.name, "session created");
        Ok(Session {
            name: options.name.clone(),
            id: Uuid::new_v4().simple().to_string(),
            lifetime,
            values: HashMap::new(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value stored under `var_name`, if any.
    #[must_use]
    pub fn get_value(&self, var_name: &str) -> Option<&Value> {
        self.values.get(var_name)
    }

    /// Store any serializable value under `var_name`.
    ///
    /// # Errors
    /// Returns `SqlWebError::SerializationError` if `value` cannot be turned into JSON.
    pub fn set_value<T: Serialize>(&mut self, var_name: &str, value: T) -> Result<(), SqlWebError> {
        self.values
            .insert(var_name.to_owned(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Remove `var_name`; missing names are ignored.
    pub fn remove_value(&mut self, var_name: &str) {
        self.values.remove(var_name);
    }

    /// `Set-Cookie` header value carrying the session id.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly",
            self.name,
            self.id,
            self.lifetime.num_seconds()
        )
    }

    /// Persist the values and push the expiry out by one lifetime.
    ///
    /// # Errors
    /// Returns `SqlWebError::SessionError` if the store fails.
    pub fn save(&self, store: &dyn SessionStore) -> Result<(), SqlWebError> {
        let expires_at = Utc::now().checked_add_signed(self.lifetime).ok_or_else(|| {
            SqlWebError::SessionError(format!(
                "session lifetime out of range: {}s",
                self.lifetime.num_seconds()
            ))
        })?;
        let data = SessionData {
            values: self.values.clone(),
            expires_at,
        };
        store.save(&self.id, &data)
    }

    /// Drop the session from the store and forget its values.
    ///
    /// # Errors
    /// Returns `SqlWebError::SessionError` if the store fails.
    pub fn destroy(&mut self, store: &dyn SessionStore) -> Result<(), SqlWebError> {
        self.values.clear();
        store.destroy(&self.id)
    }
}

// Ids we hand out are 32 hex chars; anything else is not worth a lookup.
fn is_valid_id(id: &str) -> bool {
    id.len() == 32 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_a_save_and_resume() {
        let store = MemorySessionStore::new();
        let opts = SessionOptions::default();

        let mut first = Session::start(&opts, &store, None).unwrap();
        first.set_value("user_id", 42).unwrap();
        first.set_value("roles", vec!["admin", "dev"]).unwrap();
        first.save(&store).unwrap();

        let resumed = Session::start(&opts, &store, Some(first.id())).unwrap();
        assert_eq!(resumed.id(), first.id());
        assert_eq!(resumed.get_value("user_id"), Some(&Value::from(42)));
        assert_eq!(
            resumed.get_value("roles"),
            Some(&serde_json::json!(["admin", "dev"]))
        );
    }

    #[test]
    fn unknown_or_malformed_ids_start_fresh() {
        let store = MemorySessionStore::new();
        let opts = SessionOptions::default();
        let session = Session::start(&opts, &store, Some("../../etc/passwd")).unwrap();
        assert_ne!(session.id(), "../../etc/passwd");
        assert!(is_valid_id(session.id()));
        assert!(session.get_value("anything").is_none());
    }

    #[test]
    fn expired_sessions_are_discarded() {
        let store = MemorySessionStore::new();
        let opts = SessionOptions::default();
        let id = "0123456789abcdef0123456789abcdef";
        let mut values = HashMap::new();
        values.insert("k".to_owned(), Value::from("v"));
        store
            .save(
                id,
                &SessionData {
                    values,
                    expires_at: Utc::now() - Duration::seconds(1),
                },
            )
            .unwrap();

        let session = Session::start(&opts, &store, Some(id)).unwrap();
        assert_ne!(session.id(), id);
        assert!(store.load(id).unwrap().is_none());
    }

    #[test]
    fn remove_and_destroy() {
        let store = MemorySessionStore::new();
        let mut session = Session::start(&SessionOptions::default(), &store, None).unwrap();
        session.set_value("a", true).unwrap();
        session.remove_value("a");
        session.remove_value("never-set");
        assert!(session.get_value("a").is_none());

        session.save(&store).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        session.destroy(&store).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn abandoned_sessions_do_not_accumulate() {
        let store = MemorySessionStore::new();
        let opts = SessionOptions {
            name: "sid".into(),
            lifetime_secs: 0,
        };
        for _ in 0..101 {
            Session::start(&opts, &store, None).unwrap().save(&store).unwrap();
        }
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.purge_expired().unwrap(), 1);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn live_sessions_survive_a_sweep() {
        let store = MemorySessionStore::new();
        let session = Session::start(&SessionOptions::default(), &store, None).unwrap();
        session.save(&store).unwrap();
        assert_eq!(store.purge_expired().unwrap(), 0);
        assert!(store.load(session.id()).unwrap().is_some());
    }

    #[test]
    fn oversized_lifetime_is_rejected_not_a_panic() {
        let store = MemorySessionStore::new();
        let opts = SessionOptions {
            name: "sid".into(),
            lifetime_secs: 9_000_000_000_000,
        };
        assert!(matches!(
            Session::start(&opts, &store, None),
            Err(SqlWebError::SessionError(_))
        ));

        let mut session = Session::start(&SessionOptions::default(), &store, None).unwrap();
        session.lifetime = Duration::MAX;
        assert!(matches!(
            session.save(&store),
            Err(SqlWebError::SessionError(_))
        ));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn cookie_carries_name_id_and_lifetime() {
        let store = MemorySessionStore::new();
        let opts = SessionOptions {
            name: "sid".into(),
            lifetime_secs: 60,
        };
        let session = Session::start(&opts, &store, None).unwrap();
        assert_eq!(
            session.cookie_header(),
            format!("sid={}; Path=/; Max-Age=60; HttpOnly", session.id())
        );
    }
}
