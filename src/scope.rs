//! Request-scoped use of a store, independent of any web framework.
//!
//! A request handler calls [`bind`] with the token the client presented (usually the
//! [`SESSION_COOKIE_NAME`] cookie), works on [`BoundSession::session`], sends
//! [`BoundSession::id`] back to the client, and calls [`BoundSession::finish`] when done.
//! Dropping the binding on an early return or during unwinding does the same work.

use crate::session::{Session, SessionHandle};
use crate::store::SessionStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Cookie carrying the session identifier.
pub const SESSION_COOKIE_NAME: &str = "session_id";

/// Session key holding the authentication flag.
pub const LOGIN_FLAG_KEY: &str = "isLogin";

/// Attributes of the session cookie. Writing the cookie is left to the web layer; `bind`
/// only consumes `max_age`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieOptions {
    pub path: String,
    pub domain: Option<String>,
    /// Cookie lifetime in seconds, also applied as the session expiry. Zero means no expiry.
    pub max_age: u64,
    pub secure: bool,
    pub http_only: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_owned(),
            domain: None,
            max_age: 0,
            secure: false,
            http_only: true,
        }
    }
}

impl CookieOptions {
    pub fn with_max_age(max_age: u64) -> Self {
        Self {
            max_age,
            ..Self::default()
        }
    }
}

/// A session attached to one in-flight request.
///
/// Saves and releases on [`finish`](Self::finish) or, failing that, on drop.
pub struct BoundSession<'a> {
    store: &'a dyn SessionStore,
    session: SessionHandle,
    fresh: bool,
    done: bool,
}

/// Resolves the session for `token`, or creates one when there is no token or the lookup
/// fails for any reason. The session's expiry is set to `options.max_age` either way.
///
/// A zero `max_age` disables expiry, so an in-memory session bound that way stays
/// registered until something calls `clear` on it.
pub fn bind<'a>(
    store: &'a dyn SessionStore,
    token: Option<&str>,
    options: &CookieOptions,
) -> BoundSession<'a> {
    let existing = token
        .filter(|id| !id.is_empty())
        .and_then(|id| match store.get_session(id) {
            Ok(session) => Some(session),
            Err(err) => {
                debug!(session_id = %id, error = %err, "session lookup failed, starting fresh");
                None
            }
        });
    let (session, fresh) = match existing {
        Some(session) => (session, false),
        None => (store.create_session(), true),
    };
    session.set_expired(options.max_age);
    BoundSession {
        store,
        session,
        fresh,
        done: false,
    }
}

impl BoundSession<'_> {
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Identifier to hand back to the client. Differs from the presented token when a
    /// fresh session had to be created.
    pub fn id(&self) -> &str {
        self.session.id()
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Saves pending changes (best effort) and releases the store's handle.
    pub fn finish(mut self) {
        self.complete();
    }

    fn complete(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        self.session.save();
        self.store.release(self.session.id());
    }
}

impl Drop for BoundSession<'_> {
    fn drop(&mut self) {
        if !self.done {
            debug!(session_id = %self.session.id(), "request scope dropped without finish");
        }
        self.complete();
    }
}

/// Auth-gate predicate: only a stored boolean `true` under [`LOGIN_FLAG_KEY`] counts.
pub fn is_logged_in(session: &dyn Session) -> bool {
    matches!(session.get(LOGIN_FLAG_KEY), Ok(Value::Bool(true)))
}
