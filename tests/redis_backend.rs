#![cfg(feature = "redis")]

use serde_json::json;
use sessionkit::durable::DurableSessionStore;
use sessionkit::store::InitStore;
use sessionkit::{create_session_store, Session, SessionStore, StoreConfig, StoreKind};
use uuid::Uuid;

fn redis_url() -> Option<String> {
    std::env::var("REDIS_URL").ok()
}

#[test]
fn redis_backend_round_trip_when_url_provided() {
    let Some(url) = redis_url() else {
        eprintln!("skipping redis_backend_round_trip_when_url_provided: REDIS_URL not set");
        return;
    };

    let config = StoreConfig {
        namespace: Some(format!("sessionkit:test:{}", Uuid::new_v4())),
        io_timeout_ms: Some(2_000),
        ..StoreConfig::new(StoreKind::Durable, url)
    };
    let store = create_session_store(&config).expect("construct redis store");
    let session = store.create_session();
    session.set_expired(60);
    session.set("isLogin", json!(true));
    session.set("cart", json!([{ "sku": "tea", "qty": 2 }]));
    session.save();
    let id = session.id().to_owned();
    store.clear(&id);

    // a second store stands in for a restarted process
    let restarted = create_session_store(&config).expect("construct redis store");
    let loaded = restarted.get_session(&id).expect("persisted in redis");
    assert_eq!(loaded.get("isLogin").expect("flag"), json!(true));
    assert_eq!(
        loaded.get("cart").expect("cart"),
        json!([{ "sku": "tea", "qty": 2 }])
    );

    let err = restarted
        .get_session(&Uuid::new_v4().to_string())
        .err()
        .expect("unknown id");
    assert!(err.is_not_found());
}

#[test]
fn init_accepts_positional_options_when_url_provided() {
    let Some(url) = redis_url() else {
        eprintln!("skipping init_accepts_positional_options_when_url_provided: REDIS_URL not set");
        return;
    };
    let store = DurableSessionStore::init(&url, &[""]).expect("empty credential is ignored");
    assert!(store.is_empty());
}
