//! Backend selection: which store to build and how to reach it.

use crate::error::{invalid_config, unsupported_kind, SessionResult};
use crate::inmemory::InMemorySessionStore;
use crate::store::SessionStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Available backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Sessions live only in this process.
    #[default]
    Memory,
    /// Sessions are persisted to redis.
    #[serde(alias = "redis")]
    Durable,
}

impl StoreKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            StoreKind::Memory => "memory",
            StoreKind::Durable => "durable",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreKind {
    type Err = crate::SessionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "memory" => Ok(StoreKind::Memory),
            "durable" | "redis" => Ok(StoreKind::Durable),
            other => Err(unsupported_kind(other)),
        }
    }
}

/// Everything needed to build a store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    /// `host:port` or a `redis://` URL. Ignored by the memory backend.
    pub address: String,
    pub credential: Option<String>,
    /// Partition (database) index.
    pub db: Option<i64>,
    /// Per round-trip deadline for the external store, in milliseconds.
    pub io_timeout_ms: Option<u64>,
    /// Prefix for persisted keys.
    pub namespace: Option<String>,
}

impl StoreConfig {
    pub fn new(kind: StoreKind, address: impl Into<String>) -> Self {
        Self {
            kind,
            address: address.into(),
            ..Self::default()
        }
    }

    /// Applies the positional options accepted by the factory: `[]`, `[credential]` or
    /// `[credential, partition_index]`.
    pub fn with_positional(mut self, options: &[&str]) -> SessionResult<Self> {
        match options {
            [] => {}
            [credential] => {
                self.credential = non_empty(credential);
            }
            [credential, db] => {
                self.credential = non_empty(credential);
                self.db = Some(parse_db(db)?);
            }
            _ => {
                return Err(invalid_config(format!(
                    "expected at most 2 store options (credential, partition index), got {}",
                    options.len()
                )))
            }
        }
        Ok(self)
    }

    /// Reads the configuration from `SESSION_STORE_*` environment variables.
    pub fn from_env() -> SessionResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> SessionResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = match lookup("SESSION_STORE_KIND") {
            Some(raw) => raw.trim().parse()?,
            None => StoreKind::default(),
        };
        let db = lookup("SESSION_STORE_DB")
            .map(|raw| parse_db(&raw))
            .transpose()?;
        let io_timeout_ms = lookup("SESSION_STORE_TIMEOUT_MS")
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|_| {
                    invalid_config(format!("SESSION_STORE_TIMEOUT_MS `{raw}` is not an integer"))
                })
            })
            .transpose()?;
        Ok(Self {
            kind,
            address: lookup("SESSION_STORE_ADDR").unwrap_or_default(),
            credential: lookup("SESSION_STORE_PASSWORD").and_then(|v| non_empty(&v)),
            db,
            io_timeout_ms,
            namespace: lookup("SESSION_STORE_NAMESPACE").and_then(|v| non_empty(&v)),
        })
    }

    pub fn io_timeout(&self) -> Option<Duration> {
        self.io_timeout_ms.map(Duration::from_millis)
    }
}

fn non_empty(raw: &str) -> Option<String> {
    (!raw.is_empty()).then(|| raw.to_owned())
}

fn parse_db(raw: &str) -> SessionResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| invalid_config(format!("partition index `{raw}` is not an integer")))
}

/// Builds a store from a kind name, an address and up to two positional options.
///
/// Unknown kinds fail with `UnsupportedKind` before anything is constructed.
pub fn create_store(
    kind: &str,
    address: &str,
    options: &[&str],
) -> SessionResult<Box<dyn SessionStore>> {
    let kind: StoreKind = kind.parse()?;
    let config = StoreConfig::new(kind, address).with_positional(options)?;
    create_session_store(&config)
}

/// Builds and initialises the store described by `config`.
pub fn create_session_store(config: &StoreConfig) -> SessionResult<Box<dyn SessionStore>> {
    match config.kind {
        StoreKind::Memory => Ok(Box::new(InMemorySessionStore::new())),
        StoreKind::Durable => open_durable(config),
    }
}

#[cfg(feature = "redis")]
fn open_durable(config: &StoreConfig) -> SessionResult<Box<dyn SessionStore>> {
    let store = crate::durable::DurableSessionStore::open_redis(config)?;
    Ok(Box::new(store))
}

#[cfg(not(feature = "redis"))]
fn open_durable(_config: &StoreConfig) -> SessionResult<Box<dyn SessionStore>> {
    Err(invalid_config(
        "durable session store requires the `redis` feature",
    ))
}
