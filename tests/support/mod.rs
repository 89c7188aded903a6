#![allow(dead_code)]

use parking_lot::Mutex;
use sessionkit::{CacheClient, ErrorCode, SessionError, SessionResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-process stand-in for the external cache that counts round-trips.
#[derive(Default)]
pub struct FakeCache {
    entries: Mutex<HashMap<String, (Vec<u8>, u64)>>,
    pub pings: AtomicUsize,
    pub fetches: AtomicUsize,
    pub stores: AtomicUsize,
    offline: AtomicBool,
}

impl FakeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Raw blob and TTL last written under `key`.
    pub fn entry(&self, key: &str) -> Option<(Vec<u8>, u64)> {
        self.entries.lock().get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, blob: &[u8]) {
        self.entries.lock().insert(key.to_owned(), (blob.to_vec(), 0));
    }

    fn check_online(&self) -> SessionResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SessionError::new(ErrorCode::Unavailable, "fake cache offline"));
        }
        Ok(())
    }
}

impl CacheClient for FakeCache {
    fn ping(&self) -> SessionResult<()> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        self.check_online()
    }

    fn fetch(&self, key: &str) -> SessionResult<Option<Vec<u8>>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(self.entries.lock().get(key).map(|(blob, _)| blob.clone()))
    }

    fn store(&self, key: &str, blob: &[u8], ttl_secs: u64) -> SessionResult<()> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.entries
            .lock()
            .insert(key.to_owned(), (blob.to_vec(), ttl_secs));
        Ok(())
    }
}
