use crate::error::{decode_error, encode_error, SessionResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Key/value bag held by a single session.
pub type SessionMap = HashMap<String, Value>;

/// Shared handle to a live session, as handed out by a [`crate::SessionStore`].
pub type SessionHandle = Arc<dyn Session>;

/// One client's server-side state.
///
/// Every implementation guards its map with its own reader/writer lock: `get` and `keys`
/// take the shared side, everything that mutates the map (or the dirty flag) takes the
/// exclusive side. Locks are per session, so unrelated requests never contend.
pub trait Session: Send + Sync + 'static {
    /// Identifier assigned at creation. Never changes.
    fn id(&self) -> &str;

    /// Hydrates the map from the backing store.
    ///
    /// On failure the map is left empty and the caller should treat the session as fresh.
    fn load(&self) -> SessionResult<()>;

    /// Returns a copy of the value stored under `key`.
    fn get(&self, key: &str) -> SessionResult<Value>;

    /// Inserts or overwrites `key`.
    fn set(&self, key: &str, value: Value);

    /// Removes `key`. Absent keys are ignored.
    fn del(&self, key: &str);

    /// Snapshot of the keys currently set.
    fn keys(&self) -> Vec<String>;

    /// Writes pending changes to the backing store.
    ///
    /// Returns `Ok(true)` when a write happened and `Ok(false)` when there was nothing to do.
    fn persist(&self) -> SessionResult<bool>;

    /// Fire-and-forget variant of [`Session::persist`]: failures are logged and dropped.
    fn save(&self) {
        if let Err(err) = self.persist() {
            warn!(session_id = %self.id(), error = %err, "session save failed");
        }
    }

    /// Sets the time-to-live, in seconds, applied by the next save. Zero disables expiry.
    fn set_expired(&self, seconds: u64);

    /// Current time-to-live in seconds.
    fn expiry(&self) -> u64;
}

/// Typed access on top of the JSON value bag.
pub trait SessionExt {
    /// Reads `key` and deserializes it into `T`.
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> SessionResult<T>;

    /// Serializes `value` and stores it under `key`.
    fn set_as<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> SessionResult<()>;
}

impl<S: Session + ?Sized> SessionExt for S {
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> SessionResult<T> {
        let value = self.get(key)?;
        serde_json::from_value(value).map_err(decode_error)
    }

    fn set_as<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> SessionResult<()> {
        let value = serde_json::to_value(value).map_err(encode_error)?;
        self.set(key, value);
        Ok(())
    }
}
