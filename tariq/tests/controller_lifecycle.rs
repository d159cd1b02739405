use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tariq::Handler;
use tariq::prelude::*;

#[derive(Default, Inject)]
struct ProfileController {
    #[inject(skip)]
    username: String,
}

#[controller]
impl ProfileController {
    pub fn begin_request(&mut self, ctx: &mut Context) {
        self.username = ctx.params().get("username").unwrap_or_default().to_string();
    }

    pub fn end_request(&mut self, ctx: &mut Context) {
        ctx.write_str("done");
    }

    pub fn get(&self, ctx: &mut Context) {
        ctx.write_str(&self.username);
    }

    pub fn post(&self, ctx: &mut Context) {
        ctx.write_str(&self.username);
    }
}

const USERNAMES: [(&str, bool); 6] = [
    ("kataras", true),
    ("makis", false),
    ("efi", true),
    ("rg", false),
    ("bill", true),
    ("whoisyourdaddy", false),
];

#[test]
fn hooks_wrap_every_method() {
    let mut router = Router::new();
    Engine::new().controller::<ProfileController>(&mut router.party("/profile/{username}", vec![]));

    for (username, _) in USERNAMES {
        for method in [Method::GET, Method::POST] {
            let ctx = router.serve(method, &format!("/profile/{username}"));
            assert_eq!(ctx.status(), StatusCode::OK);
            assert_eq!(ctx.body_text(), format!("{username}done"));
        }
    }
}

#[test]
fn party_middleware_runs_first() {
    let check: Handler = Arc::new(|ctx: &mut Context| {
        let username = ctx.params().get("username").unwrap_or_default();
        let allowed = USERNAMES.iter().any(|(name, allow)| *name == username && *allow);
        if allowed {
            ctx.next();
            return;
        }
        ctx.set_status(StatusCode::FORBIDDEN);
        ctx.write_str("forbidden");
    });

    let mut router = Router::new();
    Engine::new().controller::<ProfileController>(&mut router.party("/profile/{username}", vec![check]));

    for (username, allow) in USERNAMES {
        for method in [Method::GET, Method::POST] {
            let ctx = router.serve(method, &format!("/profile/{username}"));
            if allow {
                assert_eq!(ctx.status(), StatusCode::OK);
                assert_eq!(ctx.body_text(), format!("{username}done"));
            } else {
                assert_eq!(ctx.status(), StatusCode::FORBIDDEN);
                assert_eq!(ctx.body_text(), "forbidden");
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Model {
    username: String,
}

struct ViewModels(Vec<(&'static str, Model)>);

#[derive(Default, Inject)]
struct AwarenessController;

#[controller]
impl AwarenessController {
    pub fn get(&self, ctx: &mut Context) {
        let username = ctx.params().get("username").unwrap_or_default().to_string();
        ctx.values_mut().insert(ViewModels(vec![
            ("TestModel", Model { username: username.clone() }),
            ("myModel", Model { username: format!("{username}2") }),
        ]));
    }

    pub fn end_request(&mut self, ctx: &mut Context) {
        let names: Vec<String> = match ctx.values().get::<ViewModels>() {
            Some(models) => models.0.iter().map(|(_, m)| m.username.clone()).collect(),
            None => vec!["no view models".to_string()],
        };
        for name in names {
            ctx.write_str(&name);
        }
    }
}

#[test]
fn end_hook_sees_what_the_method_stored() {
    let mut router = Router::new();
    Engine::new().controller::<AwarenessController>(&mut router.party("/era/{username}", vec![]));

    for username in ["kataras", "makis"] {
        let ctx = router.serve(Method::GET, &format!("/era/{username}"));
        assert_eq!(ctx.status(), StatusCode::OK);
        assert_eq!(ctx.body_text(), format!("{username}{username}2"));
    }
}

#[derive(Clone)]
struct Title(&'static str);

/// Shared base behavior, composed into controllers by hand.
#[derive(Default)]
struct Base;

impl Base {
    fn end_request(&mut self, ctx: &mut Context) {
        ctx.write_str("finish");
    }
}

#[derive(Default, Inject)]
struct NestedController {
    #[inject(skip)]
    base: Base,
    title: Option<Arc<Title>>,
}

#[controller]
impl NestedController {
    pub fn get(&self, ctx: &Context) -> String {
        ctx.params().get("username").unwrap_or_default().to_string()
    }

    pub fn end_request(&mut self, ctx: &mut Context) {
        match &self.title {
            Some(title) => ctx.write_str(title.0),
            None => ctx.write_str("\ntitle is missing!\n"),
        }
        self.base.end_request(ctx);
    }
}

#[test]
fn only_the_outer_hook_is_called() {
    let engine = Engine::builder().bind(Arc::new(Title("mytitle"))).build();
    let mut router = Router::new();
    engine.controller::<NestedController>(&mut router.party("/user/{username}", vec![]));

    let ctx = router.serve(Method::GET, "/user/gerasimos");
    assert_eq!(ctx.status(), StatusCode::OK);
    assert_eq!(ctx.body_text(), "gerasimosmytitlefinish");
}

static GUARDED_CALLS: AtomicUsize = AtomicUsize::new(0);
static GUARDED_ENDS: AtomicUsize = AtomicUsize::new(0);

#[derive(Default, Inject)]
struct GuardedController {
    title: Option<Arc<Title>>,
}

#[controller]
impl GuardedController {
    pub fn begin_request(&mut self, ctx: &mut Context) {
        if ctx.params().get("token") != Some("secret") {
            ctx.stop_with_status(StatusCode::UNAUTHORIZED);
        }
    }

    pub fn end_request(&mut self, ctx: &mut Context) {
        GUARDED_ENDS.fetch_add(1, Ordering::SeqCst);
        if self.title.is_none() {
            ctx.write_str("unfilled");
        }
    }

    pub fn get_by(&self, _token: String) -> &'static str {
        GUARDED_CALLS.fetch_add(1, Ordering::SeqCst);
        "welcome"
    }
}

#[test]
fn stopping_in_begin_skips_the_method_but_not_the_end_hook() {
    let engine = Engine::builder().bind(Arc::new(Title("t"))).build();
    let mut router = Router::new();
    let descriptor = engine.controller::<GuardedController>(&mut router.party("/{token:string}", vec![]));
    assert_eq!(descriptor.routes.len(), 1);

    let ctx = router.serve(Method::GET, "/wrong/wrong");
    assert_eq!(ctx.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.body_text(), "unfilled");
    assert_eq!(GUARDED_CALLS.load(Ordering::SeqCst), 0);
    assert_eq!(GUARDED_ENDS.load(Ordering::SeqCst), 1);

    let ctx = router.serve(Method::GET, "/secret/secret");
    assert_eq!(ctx.status(), StatusCode::OK);
    assert_eq!(ctx.body_text(), "welcome");
    assert_eq!(GUARDED_CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(GUARDED_ENDS.load(Ordering::SeqCst), 2);
}

#[test]
fn hooks_are_not_routes() {
    let mut router = Router::new();
    let descriptor = Engine::new().controller::<ProfileController>(&mut router);

    assert!(descriptor.reserved.iter().any(|r| r == "begin_request"));
    assert!(descriptor.reserved.iter().any(|r| r == "end_request"));
    assert_eq!(descriptor.routes.len(), 2);
}

#[derive(Debug, Clone, Default)]
struct Session(&'static str);

fn stopping_engine() -> Engine {
    Engine::builder()
        .bind_with(|ctx: &mut Context| {
            ctx.stop_with_status(StatusCode::FORBIDDEN);
            Session("expired")
        })
        .build()
}

static FIELD_CALLS: AtomicUsize = AtomicUsize::new(0);
static FIELD_ENDS: AtomicUsize = AtomicUsize::new(0);

#[derive(Default, Inject)]
struct FieldStopController {
    session: Session,
}

#[controller]
impl FieldStopController {
    pub fn end_request(&mut self, ctx: &mut Context) {
        FIELD_ENDS.fetch_add(1, Ordering::SeqCst);
        ctx.write_str(self.session.0);
    }

    pub fn get(&self) -> &'static str {
        FIELD_CALLS.fetch_add(1, Ordering::SeqCst);
        "served"
    }
}

#[test]
fn stopping_while_filling_fields_skips_the_method() {
    let mut router = Router::new();
    stopping_engine().controller::<FieldStopController>(&mut router);

    let ctx = router.serve(Method::GET, "/");
    assert_eq!(ctx.status(), StatusCode::FORBIDDEN);
    assert_eq!(ctx.body_text(), "expired");
    assert_eq!(FIELD_CALLS.load(Ordering::SeqCst), 0);
    assert_eq!(FIELD_ENDS.load(Ordering::SeqCst), 1);
}

static ARG_CALLS: AtomicUsize = AtomicUsize::new(0);
static ARG_ENDS: AtomicUsize = AtomicUsize::new(0);

#[derive(Default, Inject)]
struct ArgStopController;

#[controller]
impl ArgStopController {
    pub fn end_request(&mut self, _ctx: &mut Context) {
        ARG_ENDS.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self, session: Session) -> &'static str {
        ARG_CALLS.fetch_add(1, Ordering::SeqCst);
        session.0
    }
}

#[test]
fn stopping_while_filling_arguments_skips_the_method() {
    let mut router = Router::new();
    let descriptor = stopping_engine().controller::<ArgStopController>(&mut router);
    assert_eq!(descriptor.routes.len(), 1);

    let ctx = router.serve(Method::GET, "/");
    assert_eq!(ctx.status(), StatusCode::FORBIDDEN);
    assert!(ctx.body().is_empty());
    assert_eq!(ARG_CALLS.load(Ordering::SeqCst), 0);
    assert_eq!(ARG_ENDS.load(Ordering::SeqCst), 1);
}
