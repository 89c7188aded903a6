use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;
use sessionkit::durable::{CacheClient, DurableSessionStore};
use sessionkit::inmemory::InMemorySessionStore;
use sessionkit::{Session, SessionResult, SessionStore};

/// Cache that accepts every write and never returns anything.
struct NullCache;

impl CacheClient for NullCache {
    fn ping(&self) -> SessionResult<()> {
        Ok(())
    }

    fn fetch(&self, _key: &str) -> SessionResult<Option<Vec<u8>>> {
        Ok(None)
    }

    fn store(&self, _key: &str, blob: &[u8], _ttl_secs: u64) -> SessionResult<()> {
        black_box(blob);
        Ok(())
    }
}

fn inmemory_benches(c: &mut Criterion) {
    let store = InMemorySessionStore::new();

    c.bench_function("inmemory_create", |b| {
        b.iter(|| {
            let session = store.create_session();
            store.clear(session.id());
        });
    });

    c.bench_function("inmemory_set", |b| {
        let session = store.create_session();
        let mut counter = 0u64;
        b.iter(|| {
            counter = counter.wrapping_add(1);
            let bucket = counter % 16;
            session.set(&format!("key-{bucket}"), json!(counter));
        });
    });

    c.bench_function("inmemory_get", |b| {
        let session = store.create_session();
        session.set("isLogin", json!(true));
        let id = session.id().to_owned();
        b.iter(|| {
            let session = store.get_session(&id).expect("registered");
            black_box(session.get("isLogin").expect("set"));
        });
    });
}

fn durable_benches(c: &mut Criterion) {
    let store = DurableSessionStore::connect(Arc::new(NullCache)).expect("null cache");

    c.bench_function("durable_save_dirty", |b| {
        let session = store.create_session();
        for i in 0..8 {
            session.set(&format!("field-{i}"), json!({ "n": i, "tag": "bench" }));
        }
        b.iter(|| {
            session.set("counter", json!(1));
            session.save();
        });
    });

    c.bench_function("durable_save_clean", |b| {
        let session = store.create_session();
        session.set("isLogin", json!(true));
        session.save();
        b.iter(|| session.save());
    });
}

criterion_group!(session_ops, inmemory_benches, durable_benches);
criterion_main!(session_ops);
