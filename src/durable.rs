use crate::error::{decode_error, encode_error, key_not_found, not_found, SessionResult};
use crate::session::{Session, SessionHandle, SessionMap};
use crate::store::{register_fresh, SessionStore};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Minimal surface of a TTL-capable key/value cache used to persist session blobs.
///
/// Implementations must be safe to share between sessions; timeouts surface as errors.
pub trait CacheClient: Send + Sync + 'static {
    /// Liveness probe.
    fn ping(&self) -> SessionResult<()>;

    /// Reads the blob stored under `key`, if any.
    fn fetch(&self, key: &str) -> SessionResult<Option<Vec<u8>>>;

    /// Writes `blob` under `key`. A `ttl_secs` of zero stores it without expiration.
    fn store(&self, key: &str, blob: &[u8], ttl_secs: u64) -> SessionResult<()>;
}

/// Encodes a whole session map into the persisted blob format (JSON object).
pub fn encode_blob(data: &SessionMap) -> SessionResult<Vec<u8>> {
    serde_json::to_vec(data).map_err(encode_error)
}

/// Decodes a persisted blob back into a session map.
pub fn decode_blob(blob: &[u8]) -> SessionResult<SessionMap> {
    serde_json::from_slice(blob).map_err(decode_error)
}

#[derive(Default)]
struct DurableState {
    data: SessionMap,
    dirty: bool,
}

/// Session persisted as a single blob in an external cache.
///
/// Writes only mark the session dirty; nothing reaches the cache until `persist`/`save`,
/// and a clean session never round-trips.
pub struct DurableSession {
    id: String,
    entry_key: String,
    client: Arc<dyn CacheClient>,
    state: RwLock<DurableState>,
    expiry: AtomicU64,
}

impl DurableSession {
    fn new(id: String, entry_key: String, client: Arc<dyn CacheClient>) -> Self {
        Self {
            id,
            entry_key,
            client,
            state: RwLock::new(DurableState::default()),
            expiry: AtomicU64::new(0),
        }
    }
}

impl Session for DurableSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self) -> SessionResult<()> {
        let mut state = self.state.write();
        state.data.clear();
        state.dirty = false;

        let blob = match self.client.fetch(&self.entry_key) {
            Ok(Some(blob)) => blob,
            Ok(None) => return Err(not_found(&self.id)),
            Err(err) => {
                warn!(session_id = %self.id, error = %err, "failed to fetch session blob");
                return Err(err);
            }
        };
        match decode_blob(&blob) {
            Ok(data) => {
                state.data = data;
                Ok(())
            }
            Err(err) => {
                warn!(session_id = %self.id, error = %err, "discarding undecodable session blob");
                Err(err)
            }
        }
    }

    fn get(&self, key: &str) -> SessionResult<Value> {
        self.state
            .read()
            .data
            .get(key)
            .cloned()
            .ok_or_else(|| key_not_found(key))
    }

    fn set(&self, key: &str, value: Value) {
        let mut state = self.state.write();
        state.data.insert(key.to_owned(), value);
        state.dirty = true;
    }

    fn del(&self, key: &str) {
        let mut state = self.state.write();
        state.data.remove(key);
        state.dirty = true;
    }

    fn keys(&self) -> Vec<String> {
        self.state.read().data.keys().cloned().collect()
    }

    fn persist(&self) -> SessionResult<bool> {
        let mut state = self.state.write();
        if !state.dirty {
            return Ok(false);
        }
        let blob = encode_blob(&state.data)?;
        let ttl = self.expiry();
        // dirty stays set on failure so the next save retries
        self.client.store(&self.entry_key, &blob, ttl)?;
        state.dirty = false;
        debug!(session_id = %self.id, bytes = blob.len(), ttl, "persisted session");
        Ok(true)
    }

    fn set_expired(&self, seconds: u64) {
        self.expiry.store(seconds, Ordering::Relaxed);
    }

    fn expiry(&self) -> u64 {
        self.expiry.load(Ordering::Relaxed)
    }
}

/// Backend persisting sessions through a [`CacheClient`].
///
/// The local registry only caches live handles; the external cache is authoritative once a
/// session has been saved. `clear` never deletes the persisted blob, its TTL does.
pub struct DurableSessionStore {
    client: Arc<dyn CacheClient>,
    namespace: Option<String>,
    sessions: DashMap<String, Arc<DurableSession>>,
}

impl DurableSessionStore {
    /// Wraps an already connected client without probing it.
    pub fn new(client: Arc<dyn CacheClient>) -> Self {
        Self {
            client,
            namespace: None,
            sessions: DashMap::with_capacity(1024),
        }
    }

    /// Probes the client and wraps it.
    pub fn connect(client: Arc<dyn CacheClient>) -> SessionResult<Self> {
        client.ping()?;
        Ok(Self::new(client))
    }

    /// Prefixes persisted keys with `namespace:`.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = (!namespace.is_empty()).then_some(namespace);
        self
    }

    /// Key under which the blob for `id` is persisted.
    pub fn entry_key(&self, id: &str) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}:{id}"),
            None => id.to_owned(),
        }
    }

    fn bind(&self, id: String) -> Arc<DurableSession> {
        let entry_key = self.entry_key(&id);
        Arc::new(DurableSession::new(id, entry_key, Arc::clone(&self.client)))
    }
}

impl SessionStore for DurableSessionStore {
    fn create_session(&self) -> SessionHandle {
        let session = register_fresh(&self.sessions, |id| self.bind(id));
        debug!(session_id = %session.id(), "created durable session");
        session
    }

    fn get_session(&self, id: &str) -> SessionResult<SessionHandle> {
        if let Some(live) = self.sessions.get(id) {
            return Ok(live.value().clone());
        }

        // hydrate outside the registry lock
        let session = self.bind(id.to_owned());
        session.load()?;

        let session = self
            .sessions
            .entry(id.to_owned())
            .or_insert(session)
            .value()
            .clone();
        debug!(session_id = %id, "hydrated durable session");
        Ok(session)
    }

    fn clear(&self, id: &str) {
        if self.sessions.remove(id).is_some() {
            debug!(session_id = %id, "released durable session handle");
        }
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}
