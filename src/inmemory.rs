use crate::error::{key_not_found, not_found, SessionResult};
use crate::session::{Session, SessionHandle, SessionMap};
use crate::store::{register_fresh, InitStore, SessionStore};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tracing::debug;

/// Session whose map lives only in process memory. Mutation is persistence, so
/// `load` and `persist` have nothing to do.
pub struct MemorySession {
    id: String,
    data: RwLock<SessionMap>,
    expiry: AtomicU64,
    touched_at: Mutex<OffsetDateTime>,
}

impl MemorySession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: RwLock::new(SessionMap::with_capacity(8)),
            expiry: AtomicU64::new(0),
            touched_at: Mutex::new(OffsetDateTime::now_utc()),
        }
    }

    fn touch(&self, now: OffsetDateTime) {
        *self.touched_at.lock() = now;
    }

    /// Idle longer than the configured expiry. A zero expiry never lapses.
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        let ttl = self.expiry.load(Ordering::Relaxed);
        if ttl == 0 {
            return false;
        }
        let ttl = Duration::seconds(i64::try_from(ttl).unwrap_or(i64::MAX));
        now - *self.touched_at.lock() >= ttl
    }
}

impl Session for MemorySession {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self) -> SessionResult<()> {
        Ok(())
    }

    fn get(&self, key: &str) -> SessionResult<Value> {
        self.data
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| key_not_found(key))
    }

    fn set(&self, key: &str, value: Value) {
        self.data.write().insert(key.to_owned(), value);
    }

    fn del(&self, key: &str) {
        self.data.write().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    fn persist(&self) -> SessionResult<bool> {
        Ok(false)
    }

    fn set_expired(&self, seconds: u64) {
        self.expiry.store(seconds, Ordering::Relaxed);
    }

    fn expiry(&self) -> u64 {
        self.expiry.load(Ordering::Relaxed)
    }
}

/// In-memory backend: the registry is the only copy of every session.
///
/// Sessions with a non-zero expiry are dropped once they sit idle past it. Expiration is
/// handled lazily on lookup plus an occasional sweep; there is no background task.
pub struct InMemorySessionStore {
    sessions: DashMap<String, Arc<MemorySession>>,
    cleanup_hint: Mutex<OffsetDateTime>,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self {
            sessions: DashMap::with_capacity(1024),
            cleanup_hint: Mutex::new(OffsetDateTime::now_utc()),
        }
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn maybe_cleanup(&self, now: OffsetDateTime) {
        let mut guard = self.cleanup_hint.lock();
        if now - *guard < Duration::seconds(60) {
            return;
        }
        self.sessions.retain(|_, session| !session.is_expired(now));
        *guard = now;
    }
}

impl SessionStore for InMemorySessionStore {
    fn create_session(&self) -> SessionHandle {
        self.maybe_cleanup(Self::now());
        let session = register_fresh(&self.sessions, |id| Arc::new(MemorySession::new(id)));
        debug!(session_id = %session.id(), "created in-memory session");
        session
    }

    fn get_session(&self, id: &str) -> SessionResult<SessionHandle> {
        let now = Self::now();
        self.maybe_cleanup(now);
        let session = self
            .sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| not_found(id))?;
        if session.is_expired(now) {
            self.sessions.remove_if(id, |_, s| s.is_expired(now));
            debug!(session_id = %id, "in-memory session expired");
            return Err(not_found(id));
        }
        session.touch(now);
        Ok(session)
    }

    fn clear(&self, id: &str) {
        if self.sessions.remove(id).is_some() {
            debug!(session_id = %id, "cleared in-memory session");
        }
    }

    fn release(&self, id: &str) {
        if let Some(entry) = self.sessions.get(id) {
            entry.value().touch(Self::now());
        }
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

impl InitStore for InMemorySessionStore {
    fn init(_address: &str, _options: &[&str]) -> SessionResult<Self> {
        Ok(Self::new())
    }
}
