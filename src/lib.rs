#![forbid(unsafe_code)]

pub mod config;
pub mod durable;
pub mod error;
pub mod inmemory;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod scope;
pub mod session;
pub mod store;

pub use config::{create_session_store, create_store, StoreConfig, StoreKind};
pub use durable::{CacheClient, DurableSession, DurableSessionStore};
pub use error::{ErrorCode, SessionError, SessionResult};
pub use inmemory::{InMemorySessionStore, MemorySession};
pub use session::{Session, SessionExt, SessionHandle, SessionMap};
pub use store::{InitStore, SessionStore};
