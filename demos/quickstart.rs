use serde_json::json;
use sessionkit::scope::{bind, is_logged_in, CookieOptions, LOGIN_FLAG_KEY};
use sessionkit::{
    create_session_store, create_store, Session, SessionExt, SessionResult, StoreConfig,
};

fn run_memory_demo() -> SessionResult<()> {
    println!("== In-memory session demo ==");
    let store = create_store("memory", "", &[])?;
    let cookie = CookieOptions::with_max_age(3600);

    // first request: no cookie yet
    let request = bind(store.as_ref(), None, &cookie);
    println!("Issued session {}", request.id());
    println!("Logged in? {}", is_logged_in(request.session().as_ref()));
    request.session().set(LOGIN_FLAG_KEY, json!(true));
    request.session().set_as("user", &"ferris")?;
    let token = request.id().to_owned();
    request.finish();

    // second request presents the cookie
    let request = bind(store.as_ref(), Some(&token), &cookie);
    let user: String = request.session().get_as("user")?;
    println!(
        "Welcome back {user}, logged in? {}",
        is_logged_in(request.session().as_ref())
    );
    request.finish();
    Ok(())
}

fn run_configured_demo() -> SessionResult<()> {
    let config = StoreConfig::from_env()?;
    println!("== {} session demo ==", config.kind);
    let store = create_session_store(&config)?;
    let request = bind(store.as_ref(), None, &CookieOptions::with_max_age(600));
    request.session().set("visits", json!(1));
    println!("Saved session {}", request.id());
    request.finish();
    Ok(())
}

fn main() -> SessionResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    run_memory_demo()?;
    run_configured_demo()
}
