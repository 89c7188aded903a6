use crate::config::{StoreConfig, StoreKind};
use crate::durable::{CacheClient, DurableSessionStore};
use crate::error::{invalid_config, redis_error, SessionResult};
use crate::store::InitStore;
use redis::{Client, Commands, Connection, ConnectionInfo, IntoConnectionInfo};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Redis implementation of [`CacheClient`].
///
/// Constructors accept addresses (`host:port` or `redis://` URLs) rather than redis types.
/// A connection is taken per round-trip; the `redis::Client` is opened once and shared.
pub struct RedisCacheClient {
    client: Client,
    timeout: Option<Duration>,
}

impl RedisCacheClient {
    /// Opens a client for `address`, overriding the password and database when given.
    pub fn open(address: &str, credential: Option<&str>, db: Option<i64>) -> SessionResult<Self> {
        let info = Self::connection_info(address, credential, db)?;
        let client = Client::open(info).map_err(redis_error)?;
        Ok(Self {
            client,
            timeout: None,
        })
    }

    /// Bounds connect, read and write time of every round-trip.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn connection_info(
        address: &str,
        credential: Option<&str>,
        db: Option<i64>,
    ) -> SessionResult<ConnectionInfo> {
        let url = if address.contains("://") {
            address.to_owned()
        } else {
            format!("redis://{address}")
        };
        let mut info = url
            .as_str()
            .into_connection_info()
            .map_err(|err| invalid_config(format!("invalid redis address `{address}`: {err}")))?;
        if let Some(password) = credential.filter(|p| !p.is_empty()) {
            info.redis.password = Some(password.to_owned());
        }
        if let Some(db) = db {
            info.redis.db = db;
        }
        Ok(info)
    }

    fn conn(&self) -> SessionResult<Connection> {
        let Some(timeout) = self.timeout else {
            return self.client.get_connection().map_err(redis_error);
        };
        let conn = self
            .client
            .get_connection_with_timeout(timeout)
            .map_err(redis_error)?;
        conn.set_read_timeout(Some(timeout)).map_err(redis_error)?;
        conn.set_write_timeout(Some(timeout)).map_err(redis_error)?;
        Ok(conn)
    }
}

impl CacheClient for RedisCacheClient {
    fn ping(&self) -> SessionResult<()> {
        let mut conn = self.conn()?;
        redis::cmd("PING")
            .query::<String>(&mut conn)
            .map_err(redis_error)?;
        Ok(())
    }

    fn fetch(&self, key: &str) -> SessionResult<Option<Vec<u8>>> {
        let mut conn = self.conn()?;
        conn.get(key).map_err(redis_error)
    }

    fn store(&self, key: &str, blob: &[u8], ttl_secs: u64) -> SessionResult<()> {
        let mut conn = self.conn()?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(blob);
        if ttl_secs > 0 {
            cmd.arg("EX").arg(ttl_secs);
        }
        cmd.query::<()>(&mut conn).map_err(redis_error)
    }
}

impl DurableSessionStore {
    /// Connects to redis as described by `config` and probes it.
    pub fn open_redis(config: &StoreConfig) -> SessionResult<Self> {
        let mut client = RedisCacheClient::open(
            &config.address,
            config.credential.as_deref(),
            config.db,
        )?;
        if let Some(timeout) = config.io_timeout() {
            client = client.with_timeout(timeout);
        }
        let mut store = Self::connect(Arc::new(client))?;
        if let Some(namespace) = &config.namespace {
            store = store.with_namespace(namespace.as_str());
        }
        info!(address = %config.address, db = config.db.unwrap_or(0), "redis session store ready");
        Ok(store)
    }
}

impl InitStore for DurableSessionStore {
    fn init(address: &str, options: &[&str]) -> SessionResult<Self> {
        let config = StoreConfig::new(StoreKind::Durable, address).with_positional(options)?;
        Self::open_redis(&config)
    }
}
