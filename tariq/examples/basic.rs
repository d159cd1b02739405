//! Basic example of Tariq controllers.
//!
//! Run with `RUST_LOG=tariq_mvc=debug` to see routes being registered.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tariq::prelude::*;
use tracing_subscriber::EnvFilter;

// === Services ===

#[derive(Debug, Clone, Serialize)]
struct User {
    id: u64,
    name: String,
}

trait UserStore: Send + Sync {
    fn find(&self, id: u64) -> Option<User>;
    fn insert(&self, name: &str) -> User;
}

#[derive(Default)]
struct MemoryStore {
    users: RwLock<HashMap<u64, User>>,
}

impl UserStore for MemoryStore {
    fn find(&self, id: u64) -> Option<User> {
        self.users.read().get(&id).cloned()
    }

    fn insert(&self, name: &str) -> User {
        let mut users = self.users.write();
        let user = User {
            id: users.len() as u64 + 1,
            name: name.to_string(),
        };
        users.insert(user.id, user.clone());
        user
    }
}

#[derive(Clone)]
struct RequestLog(String);

// === Controller ===

#[derive(Default, Inject)]
struct UserController {
    store: Option<Arc<dyn UserStore>>,
    #[inject(skip)]
    started: Option<std::time::Instant>,
}

#[controller]
impl UserController {
    pub fn begin_request(&mut self, _ctx: &mut Context) {
        self.started = Some(std::time::Instant::now());
    }

    pub fn end_request(&mut self, ctx: &mut Context) {
        if let Some(started) = self.started {
            tracing::info!(path = ctx.path(), status = %ctx.status(), elapsed = ?started.elapsed(), "Request served");
        }
    }

    pub fn get_by(&self, id: u64) -> (Option<Json<User>>, bool) {
        let user = self.store.as_ref().and_then(|s| s.find(id));
        let found = user.is_some();
        (user.map(Json), found)
    }

    pub fn post_by(&self, name: String, log: RequestLog) -> (Json<User>, StatusCode) {
        tracing::debug!(request = %log.0, "Creating user");
        let store = self.store.as_ref().map(Arc::clone);
        let user = match store {
            Some(store) => store.insert(&name),
            None => User { id: 0, name },
        };
        (Json(user), StatusCode::CREATED)
    }

    pub fn get_profile_by(&self, id: u64) -> (serde_json::Value, &'static str) {
        (serde_json::json!({ "id": id }), "users/profile.html")
    }
}

fn main() -> Result<(), tariq::InjectError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tariq_mvc=debug")))
        .init();

    let store: Arc<dyn UserStore> = Arc::new(MemoryStore::default());
    let engine = Engine::builder()
        .bind(store)
        .bind_with(|ctx: &mut Context| RequestLog(format!("{} {}", ctx.method(), ctx.path())))
        .pretty_json(true)
        .build();

    let mut router = Router::new();
    engine.controller::<UserController>(&mut router.party("/users", vec![]));

    router.get("/ping", engine.handler(|_ctx: &mut Context| "pong")?);

    println!("Routes:\n{}", router.render_routes());

    for (method, path) in [
        (Method::POST, "/users/kataras"),
        (Method::GET, "/users/1"),
        (Method::GET, "/users/2"),
        (Method::GET, "/users/profile/1"),
        (Method::GET, "/ping"),
    ] {
        let ctx = router.serve(method.clone(), path);
        println!("{method} {path} -> {} {}", ctx.status(), ctx.body_text());
        if let Some(view) = ctx.view_call() {
            println!("  view {} with {}", view.name, view.data);
        }
    }

    for error in router.reporter().errors() {
        eprintln!("{error}");
    }

    Ok(())
}
