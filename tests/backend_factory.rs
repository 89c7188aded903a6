use serde_json::json;
use sessionkit::{create_session_store, create_store, ErrorCode, Session, SessionStore, StoreConfig};

#[test]
fn factory_returns_inmemory_store() {
    let store = create_store("memory", "", &[]).expect("factory should build in-memory store");
    let session = store.create_session();
    session.set("isLogin", json!(true));

    let fetched = store.get_session(session.id()).expect("registered");
    assert_eq!(fetched.get("isLogin").expect("flag"), json!(true));
}

#[test]
fn unknown_kind_is_rejected() {
    for kind in ["bogus", "", "Memory", "memcached"] {
        let err = create_store(kind, "127.0.0.1:6379", &[])
            .err()
            .expect("unknown kinds must not default to a backend");
        assert_eq!(err.code, ErrorCode::UnsupportedKind, "kind {kind:?}");
        assert!(err.message.contains(kind));
    }
}

#[test]
fn too_many_options_is_invalid_config() {
    let err = create_store("memory", "", &["a", "1", "x"])
        .err()
        .expect("three options are not accepted");
    assert_eq!(err.code, ErrorCode::InvalidConfig);
}

#[test]
fn config_builds_memory_store() {
    let store = create_session_store(&StoreConfig::default()).expect("memory by default");
    assert!(store.is_empty());
    store.create_session();
    assert_eq!(store.len(), 1);
}

#[cfg(feature = "redis")]
#[test]
fn non_integer_partition_index_is_invalid_config() {
    let err = create_store("durable", "127.0.0.1:6379", &["pw", "zero"])
        .err()
        .expect("partition index must be an integer");
    assert_eq!(err.code, ErrorCode::InvalidConfig);
}

#[cfg(feature = "redis")]
#[test]
fn refused_connection_is_unavailable() {
    // nothing listens on port 1
    let config = StoreConfig {
        io_timeout_ms: Some(500),
        ..StoreConfig::new(sessionkit::StoreKind::Durable, "127.0.0.1:1")
    };
    let err = create_session_store(&config)
        .err()
        .expect("probe must fail");
    assert_eq!(err.code, ErrorCode::Unavailable);

    let err = create_store("redis", "127.0.0.1:1", &[])
        .err()
        .expect("probe must fail");
    assert_eq!(err.code, ErrorCode::Unavailable);
}
