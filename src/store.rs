use crate::error::SessionResult;
use crate::session::SessionHandle;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

/// Backend capability shared by the in-memory and durable stores.
///
/// A store owns the registry of live session handles. Registry operations are short and
/// never hold the registry lock across backend I/O.
pub trait SessionStore: Send + Sync + 'static {
    /// Allocates a fresh identifier and registers an empty session under it.
    fn create_session(&self) -> SessionHandle;

    /// Resolves an existing session by identifier.
    fn get_session(&self, id: &str) -> SessionResult<SessionHandle>;

    /// Drops the registered handle for `id`. Unknown identifiers are ignored.
    fn clear(&self, id: &str);

    /// Called once a request is done with the session.
    ///
    /// Defaults to [`SessionStore::clear`]; stores whose registry is the only copy of the
    /// data override it to keep the session around.
    fn release(&self, id: &str) {
        self.clear(id);
    }

    /// Number of handles currently registered.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Backend initialisation from an address plus up to two positional options
/// (credential, partition index).
pub trait InitStore: SessionStore + Sized {
    fn init(address: &str, options: &[&str]) -> SessionResult<Self>;
}

pub(crate) fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Inserts a value built for a freshly generated identifier, retrying on the
/// (practically impossible) case of a collision with a registered one.
pub(crate) fn register_fresh<V, F>(registry: &DashMap<String, V>, build: F) -> V
where
    V: Clone,
    F: Fn(String) -> V,
{
    loop {
        let id = new_session_id();
        if let Entry::Vacant(vacant) = registry.entry(id.clone()) {
            let value = build(id);
            vacant.insert(value.clone());
            return value;
        }
    }
}
