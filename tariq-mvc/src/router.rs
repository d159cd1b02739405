//! Route registration and in-memory dispatch.
//!
//! [`Party`] is the seam between controllers and whatever router serves
//! them: controllers only ever register routes, parse templates and report
//! problems through it. [`Router`] is the in-memory implementation used by
//! tests and the demo; [`PartyScope`] groups routes under a prefix with
//! shared middleware.

use std::fmt;

use http::{Method, StatusCode};
use parking_lot::Mutex;
use tariq_support::rendering::{RouteEntry, render_routes};
use tracing::{debug, trace, warn};

use crate::context::{Context, Handler, Params};
use crate::template::{Template, TemplateError};

/// A registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    /// Full path, including every party prefix
    pub path: String,
    /// Display name of the main handler, e.g. `user::Controller.get_by`
    pub handler_name: String,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.method, self.path, self.handler_name)
    }
}

/// Collects non-fatal registration errors.
#[derive(Debug, Default)]
pub struct Reporter {
    errors: Mutex<Vec<String>>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message.
    pub fn add(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(error = %message, "Registration error");
        self.errors.lock().push(message);
    }

    /// Records an error.
    pub fn add_err(&self, err: &dyn std::error::Error) {
        self.add(err.to_string());
    }

    /// Every message recorded so far.
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }
}

/// A place routes can be registered.
pub trait Party {
    /// Registers `handlers` (middleware first, main handler last) for
    /// `method` and `path`, relative to this party.
    ///
    /// Returns `None` if the route was rejected; the reason is reported.
    fn handle(
        &mut self,
        method: Method,
        path: &str,
        handler_name: &str,
        handlers: Vec<Handler>,
    ) -> Option<Route>;

    /// Parses a relative route path.
    fn parse_template(&self, raw: &str) -> Result<Template, TemplateError> {
        Template::parse(raw)
    }

    /// Where non-fatal errors go.
    fn reporter(&self) -> &Reporter;
}

/// Joins a party prefix and a relative path.
///
/// ```
/// use tariq_mvc::router::join_path;
///
/// assert_eq!(join_path("/profile/{username}", "/"), "/profile/{username}");
/// assert_eq!(join_path("/", "/login"), "/login");
/// assert_eq!(join_path("/admin/", "login"), "/admin/login");
/// assert_eq!(join_path("", "/"), "/");
/// ```
pub fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    let joined = match (prefix.is_empty(), path.is_empty()) {
        (true, true) => return "/".to_string(),
        (_, true) => prefix.to_string(),
        (true, false) => format!("/{path}"),
        (false, false) => format!("{prefix}/{path}"),
    };

    if joined.starts_with('/') {
        joined
    } else {
        format!("/{joined}")
    }
}

struct RouteRecord {
    route: Route,
    template: Template,
    handlers: Vec<Handler>,
}

/// An in-memory router.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use http::Method;
/// use tariq_mvc::context::Context;
/// use tariq_mvc::router::Router;
///
/// let mut router = Router::new();
/// router.get("/ping", Arc::new(|ctx: &mut Context| ctx.text("pong")));
///
/// let ctx = router.serve(Method::GET, "/ping");
/// assert_eq!(ctx.body_text(), "pong");
/// ```
#[derive(Default)]
pub struct Router {
    records: Vec<RouteRecord>,
    reporter: Reporter,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a party: routes registered through it share `prefix` and run
    /// `middleware` before their own handlers.
    pub fn party(&mut self, prefix: &str, middleware: Vec<Handler>) -> PartyScope<'_> {
        PartyScope {
            router: self,
            prefix: join_path("", prefix),
            middleware,
        }
    }

    /// Registers a single-handler GET route.
    pub fn get(&mut self, path: &str, handler: Handler) -> Option<Route> {
        self.handle(Method::GET, path, "", vec![handler])
    }

    /// Every registered route, in registration order.
    pub fn routes(&self) -> Vec<Route> {
        self.records.iter().map(|r| r.route.clone()).collect()
    }

    /// Renders the route table.
    pub fn render_routes(&self) -> String {
        let entries: Vec<RouteEntry> = self
            .records
            .iter()
            .map(|r| RouteEntry {
                method: r.route.method.to_string(),
                path: r.route.path.clone(),
                handler: r.route.handler_name.clone(),
            })
            .collect();
        render_routes(&entries)
    }

    /// Serves a request and returns the finished context.
    pub fn serve(&self, method: Method, path: &str) -> Context {
        self.serve_context(Context::new(method, path))
    }

    /// Serves a prepared request context.
    pub fn serve_context(&self, mut ctx: Context) -> Context {
        let Some((record, params)) = self.lookup(ctx.method(), ctx.path()) else {
            trace!(method = %ctx.method(), path = ctx.path(), "No route matched");
            ctx.stop_with_status(StatusCode::NOT_FOUND);
            ctx.text("Not Found");
            return ctx;
        };

        trace!(route = %record.route, "Route matched");
        for (name, value) in params.iter() {
            ctx.params_mut().set(name, value);
        }
        ctx.set_handlers(record.handlers.clone());
        ctx.do_handlers();
        ctx
    }

    /// Finds the most specific route: most literal segments first, then
    /// routes without a trailing wildcard, then registration order.
    fn lookup(&self, method: &Method, path: &str) -> Option<(&RouteRecord, Params)> {
        let mut best: Option<(&RouteRecord, Params)> = None;

        for record in self.records.iter().filter(|r| r.route.method == *method) {
            let Some(params) = record.template.matches(path) else {
                continue;
            };
            let better = match &best {
                None => true,
                Some((current, _)) => rank(&record.template) > rank(&current.template),
            };
            if better {
                best = Some((record, params));
            }
        }

        best
    }

    fn add(&mut self, method: Method, path: String, handler_name: &str, handlers: Vec<Handler>) -> Option<Route> {
        let template = match Template::parse(&path) {
            Ok(template) => template,
            Err(err) => {
                self.reporter.add(format!("Invalid route path '{path}': {err}"));
                return None;
            }
        };

        let duplicate = self
            .records
            .iter()
            .any(|r| r.route.method == method && r.template.segments() == template.segments());
        if duplicate {
            self.reporter
                .add(format!("Route {method} {path} is already registered"));
            return None;
        }

        let route = Route {
            method,
            path,
            handler_name: handler_name.to_string(),
        };
        debug!(method = %route.method, path = %route.path, handler = %route.handler_name, "Registered route");

        self.records.push(RouteRecord {
            route: route.clone(),
            template,
            handlers,
        });
        Some(route)
    }
}

fn rank(template: &Template) -> (usize, bool) {
    (template.static_count(), !template.has_wildcard())
}

impl Party for Router {
    fn handle(
        &mut self,
        method: Method,
        path: &str,
        handler_name: &str,
        handlers: Vec<Handler>,
    ) -> Option<Route> {
        self.add(method, join_path("", path), handler_name, handlers)
    }

    fn reporter(&self) -> &Reporter {
        &self.reporter
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes())
            .field("reporter", &self.reporter)
            .finish()
    }
}

/// A group of routes sharing a prefix and middleware.
pub struct PartyScope<'r> {
    router: &'r mut Router,
    prefix: String,
    middleware: Vec<Handler>,
}

impl PartyScope<'_> {
    /// Opens a nested party.
    pub fn party(&mut self, prefix: &str, middleware: Vec<Handler>) -> PartyScope<'_> {
        let mut chain = self.middleware.clone();
        chain.extend(middleware);
        PartyScope {
            prefix: join_path(&self.prefix, prefix),
            router: &mut *self.router,
            middleware: chain,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Party for PartyScope<'_> {
    fn handle(
        &mut self,
        method: Method,
        path: &str,
        handler_name: &str,
        handlers: Vec<Handler>,
    ) -> Option<Route> {
        let mut chain = self.middleware.clone();
        chain.extend(handlers);
        self.router
            .add(method, join_path(&self.prefix, path), handler_name, chain)
    }

    fn reporter(&self) -> &Reporter {
        &self.router.reporter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn writes(text: &'static str) -> Handler {
        Arc::new(move |ctx: &mut Context| ctx.text(text))
    }

    #[test]
    fn unmatched_path_is_not_found() {
        let router = Router::new();
        let ctx = router.serve(Method::GET, "/nothing");
        assert_eq!(ctx.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn literal_beats_parameter() {
        let mut router = Router::new();
        router.get("/{param0:string}", writes("param"));
        router.get("/login", writes("login"));

        assert_eq!(router.serve(Method::GET, "/login").body_text(), "login");
        assert_eq!(router.serve(Method::GET, "/other").body_text(), "param");
    }

    #[test]
    fn method_must_match() {
        let mut router = Router::new();
        router.get("/", writes("get"));
        let ctx = router.serve(Method::POST, "/");
        assert_eq!(ctx.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn party_prefix_and_middleware() {
        let mut router = Router::new();
        let guard: Handler = Arc::new(|ctx: &mut Context| {
            if ctx.params().get("username") == Some("kataras") {
                ctx.next();
            } else {
                ctx.set_status(StatusCode::FORBIDDEN);
                ctx.text("forbidden");
            }
        });

        let route = router
            .party("/profile/{username}", vec![guard])
            .handle(Method::GET, "/", "profile", vec![writes("ok")])
            .unwrap();
        assert_eq!(route.path, "/profile/{username}");

        assert_eq!(router.serve(Method::GET, "/profile/kataras").body_text(), "ok");
        let denied = router.serve(Method::GET, "/profile/makis");
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
        assert_eq!(denied.body_text(), "forbidden");
    }

    #[test]
    fn nested_parties_join_prefixes() {
        let mut router = Router::new();
        let mut api = router.party("/api", vec![]);
        let route = api
            .party("/v1", vec![])
            .handle(Method::GET, "/users", "users", vec![writes("users")])
            .unwrap();
        assert_eq!(route.path, "/api/v1/users");
    }

    #[test]
    fn duplicates_and_bad_paths_are_reported() {
        let mut router = Router::new();
        assert!(router.get("/a", writes("a")).is_some());
        assert!(router.get("/a", writes("b")).is_none());
        assert!(router.get("/{x", writes("c")).is_none());
        assert_eq!(router.reporter().len(), 2);
    }

    #[test]
    fn route_table_lists_handlers() {
        let mut router = Router::new();
        router.handle(Method::GET, "/", "home::Controller.get", vec![writes("")]);
        let table = router.render_routes();
        assert!(table.contains("GET"));
        assert!(table.contains("home::Controller.get"));
    }
}
