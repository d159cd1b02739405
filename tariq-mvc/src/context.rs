//! The request context handed to every handler.
//!
//! [`Context`] is the in-memory stand-in for an HTTP exchange: it carries the
//! request line and matched path parameters, a typed per-request value
//! store, and the response being built. Handlers run as a chain; each one
//! decides whether the next runs by calling [`Context::next`].

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use anymap2::AnyMap;
use http::{Method, StatusCode};
use tracing::trace;

/// A request handler.
pub type Handler = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// Content type used for plain text bodies.
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Content type used for JSON bodies.
pub const APPLICATION_JSON: &str = "application/json; charset=utf-8";

/// Named values captured from the request path, in template order.
///
/// # Examples
/// ```
/// use tariq_mvc::context::Params;
///
/// let mut params = Params::new();
/// params.set("id", "42");
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.get_i64("id"), Some(42));
/// assert_eq!(params.get("missing"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing an earlier value of the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// A view selected by a handler: the template name and its data.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewCall {
    pub name: String,
    pub data: serde_json::Value,
}

/// One request/response exchange.
pub struct Context {
    method: Method,
    path: String,
    params: Params,
    values: AnyMap,
    status: StatusCode,
    content_type: Option<String>,
    body: Vec<u8>,
    view: Option<ViewCall>,
    stopped: bool,
    handlers: Vec<Handler>,
    cursor: usize,
}

impl Context {
    /// Creates a context for a request with an empty response.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Params::new(),
            values: AnyMap::new(),
            status: StatusCode::OK,
            content_type: None,
            body: Vec::new(),
            view: None,
            stopped: false,
            handlers: Vec::new(),
            cursor: 0,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// Typed per-request values, e.g. the user resolved by a middleware.
    pub fn values(&self) -> &AnyMap {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut AnyMap {
        &mut self.values
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = Some(content_type.into());
    }

    /// Appends raw bytes to the response body.
    pub fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    /// Appends text to the response body.
    pub fn write_str(&mut self, text: &str) {
        self.write(text.as_bytes());
    }

    /// Appends text, defaulting the content type to plain text.
    pub fn text(&mut self, text: &str) {
        if self.content_type.is_none() {
            self.set_content_type(TEXT_PLAIN);
        }
        self.write_str(text);
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The response body as text.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Selects a view to render with `data`.
    ///
    /// Rendering itself is outside this crate; the selection is recorded.
    pub fn view(&mut self, name: impl Into<String>, data: serde_json::Value) {
        let name = name.into();
        trace!(view = %name, "View selected");
        self.view = Some(ViewCall { name, data });
    }

    pub fn view_call(&self) -> Option<&ViewCall> {
        self.view.as_ref()
    }

    /// Stops the handler chain; no further handler runs.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Sets `status` and stops the handler chain.
    pub fn stop_with_status(&mut self, status: StatusCode) {
        self.status = status;
        self.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Replaces the handler chain and rewinds it.
    pub fn set_handlers(&mut self, handlers: Vec<Handler>) {
        self.handlers = handlers;
        self.cursor = 0;
    }

    /// Runs the first handler of the chain.
    pub fn do_handlers(&mut self) {
        self.cursor = 0;
        self.run_current();
    }

    /// Runs the next handler of the chain, unless the chain was stopped.
    pub fn next(&mut self) {
        self.cursor += 1;
        self.run_current();
    }

    fn run_current(&mut self) {
        if self.stopped {
            return;
        }
        if let Some(handler) = self.handlers.get(self.cursor).cloned() {
            handler(self);
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("body", &self.body_text())
            .field("view", &self.view)
            .field("stopped", &self.stopped)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer(text: &'static str, call_next: bool) -> Handler {
        Arc::new(move |ctx: &mut Context| {
            ctx.write_str(text);
            if call_next {
                ctx.next();
            }
        })
    }

    #[test]
    fn params_replace_by_name() {
        let mut params = Params::new();
        params.set("username", "kataras");
        params.set("username", "makis");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("username"), Some("makis"));
    }

    #[test]
    fn chain_runs_while_next_is_called() {
        let mut ctx = Context::new(Method::GET, "/");
        ctx.set_handlers(vec![writer("a", true), writer("b", true), writer("c", false)]);
        ctx.do_handlers();
        assert_eq!(ctx.body_text(), "abc");
    }

    #[test]
    fn chain_ends_without_next() {
        let mut ctx = Context::new(Method::GET, "/");
        ctx.set_handlers(vec![writer("a", false), writer("b", false)]);
        ctx.do_handlers();
        assert_eq!(ctx.body_text(), "a");
    }

    #[test]
    fn stop_prevents_next() {
        let stopper: Handler = Arc::new(|ctx: &mut Context| {
            ctx.stop_with_status(StatusCode::FORBIDDEN);
            ctx.next();
        });

        let mut ctx = Context::new(Method::GET, "/");
        ctx.set_handlers(vec![stopper, writer("unreachable", false)]);
        ctx.do_handlers();

        assert!(ctx.is_stopped());
        assert_eq!(ctx.status(), StatusCode::FORBIDDEN);
        assert!(ctx.body().is_empty());
    }

    #[test]
    fn text_keeps_explicit_content_type() {
        let mut ctx = Context::new(Method::GET, "/");
        ctx.set_content_type("text/html");
        ctx.text("<h1>hi</h1>");
        assert_eq!(ctx.content_type(), Some("text/html"));

        let mut ctx = Context::new(Method::GET, "/");
        ctx.text("hi");
        assert_eq!(ctx.content_type(), Some(TEXT_PLAIN));
    }

    #[test]
    fn typed_values() {
        #[derive(Debug, PartialEq)]
        struct User(&'static str);

        let mut ctx = Context::new(Method::GET, "/");
        ctx.values_mut().insert(User("gerasimos"));
        assert_eq!(ctx.values().get::<User>(), Some(&User("gerasimos")));
    }
}
