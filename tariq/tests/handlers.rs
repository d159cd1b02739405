use std::sync::Arc;

use serde::Serialize;
use tariq::prelude::*;
use tariq::InjectError;

#[derive(Debug, Clone, Serialize, PartialEq)]
struct User {
    id: i64,
    username: String,
}

trait Greeter: Send + Sync {
    fn say(&self, message: &str) -> String;
}

struct PrefixGreeter {
    prefix: &'static str,
}

impl Greeter for PrefixGreeter {
    fn say(&self, message: &str) -> String {
        format!("{} {message}", self.prefix)
    }
}

#[derive(Clone)]
struct PathText(String);

fn engine() -> Engine {
    Engine::builder()
        .bind_with(|ctx: &mut Context| User {
            id: ctx.params().get_i64("id").unwrap_or_default(),
            username: ctx.params().get("username").unwrap_or_default().to_string(),
        })
        .bind(Arc::new(PrefixGreeter { prefix: "say" }) as Arc<dyn Greeter>)
        .bind_with(|ctx: &mut Context| PathText(ctx.params().get("param").unwrap_or_default().to_string()))
        .build()
}

fn consume_user(_ctx: &mut Context, user: User) -> Json<User> {
    Json(user)
}

fn consume_service(_ctx: &mut Context, service: Arc<dyn Greeter>) -> String {
    service.say("something")
}

#[test]
fn functions_become_handlers() {
    let engine = engine();
    let mut router = Router::new();

    router.get("/{id:long}/{username:string}", engine.handler(consume_user).unwrap());
    router.get("/service", engine.handler(consume_service).unwrap());
    router.get(
        "/param/{param:string}",
        engine
            .handler(|_ctx: &mut Context, param: PathText| format!("param is: {}", param.0))
            .unwrap(),
    );

    let ctx = router.serve(Method::GET, "/42/kataras");
    assert_eq!(ctx.status(), StatusCode::OK);
    let user: serde_json::Value = serde_json::from_slice(ctx.body()).unwrap();
    assert_eq!(user, serde_json::json!({ "id": 42, "username": "kataras" }));

    assert_eq!(router.serve(Method::GET, "/service").body_text(), "say something");
    assert_eq!(
        router.serve(Method::GET, "/param/the_param_value").body_text(),
        "param is: the_param_value"
    );
}

#[test]
fn several_arguments_in_order() {
    let engine = engine();
    let mut router = Router::new();
    let handler = engine
        .handler(|ctx: &mut Context, user: User, service: Arc<dyn Greeter>| {
            ctx.set_status(StatusCode::ACCEPTED);
            service.say(&user.username)
        })
        .unwrap();
    router.get("/{id:int}/{username:string}", handler);

    let ctx = router.serve(Method::GET, "/1/makis");
    assert_eq!(ctx.status(), StatusCode::ACCEPTED);
    assert_eq!(ctx.body_text(), "say makis");
}

#[test]
fn unbound_arguments_are_rejected_up_front() {
    let err = Engine::new().handler(consume_user).err().unwrap();
    match err {
        InjectError::NotBound(err) => assert!(err.requested.type_name().contains("User")),
        other => panic!("unexpected error: {other}"),
    }
}
