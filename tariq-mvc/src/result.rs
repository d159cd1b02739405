//! Turning method results into responses.
//!
//! A method's return value is flattened into a list of [`Output`]s by
//! [`IntoOutputs`], then [`dispatch_func_result`] writes the response from
//! the shape of that list:
//!
//! | outputs | response |
//! |---|---|
//! | `[]` | nothing written |
//! | `[value]` | the value: text, JSON, a status, or a [`Response`] |
//! | `[value, int or StatusCode]` | the status, then the value |
//! | `[value, text]` | the value with that content type, or the view of that name |
//! | `[value, bool]` | the value, or 404 when `false` |
//! | `[.., error]` | the error status and message when the error is set |

use std::fmt;

use http::StatusCode;
use serde::Serialize;
use tracing::{error, trace, warn};

use crate::context::{APPLICATION_JSON, Context, TEXT_PLAIN};

/// Settings applied when writing results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Status written for a returned error, unless an error status is
    /// already set
    pub error_status: StatusCode,
    /// Indent JSON bodies
    pub pretty_json: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            error_status: StatusCode::BAD_REQUEST,
            pretty_json: false,
        }
    }
}

/// A value that renders itself into the response.
pub trait Response: Send {
    fn render(self: Box<Self>, ctx: &mut Context, options: &DispatchOptions);

    /// The value as template data, when it is paired with a view name.
    fn view_data(&self) -> Option<serde_json::Value> {
        None
    }
}

/// One returned value, type-erased.
pub enum Output {
    Nil,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Json(serde_json::Value),
    Status(StatusCode),
    /// The error half of a `Result`; `None` for `Ok`
    Error(Option<String>),
    Response(Box<dyn Response>),
}

impl Output {
    /// Wraps a custom [`Response`].
    pub fn response<R: Response + 'static>(response: R) -> Self {
        Output::Response(Box::new(response))
    }

    pub fn kind(&self) -> OutputKind {
        match self {
            Output::Nil => OutputKind::Nil,
            Output::Text(_) => OutputKind::Text,
            Output::Int(_) => OutputKind::Int,
            Output::Float(_) => OutputKind::Float,
            Output::Bool(_) => OutputKind::Bool,
            Output::Json(_) => OutputKind::Json,
            Output::Status(_) => OutputKind::Status,
            Output::Error(_) => OutputKind::Error,
            Output::Response(_) => OutputKind::Response,
        }
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Nil => f.write_str("Nil"),
            Output::Text(v) => f.debug_tuple("Text").field(v).finish(),
            Output::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Output::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Output::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Output::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Output::Status(v) => f.debug_tuple("Status").field(v).finish(),
            Output::Error(v) => f.debug_tuple("Error").field(v).finish(),
            Output::Response(_) => f.write_str("Response(..)"),
        }
    }
}

/// The static kind of an [`Output`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Nil,
    Text,
    Int,
    Float,
    Bool,
    Json,
    Status,
    Error,
    Response,
}

/// A single returnable value.
pub trait IntoOutput {
    fn kind() -> OutputKind
    where
        Self: Sized;

    fn into_output(self) -> Output;
}

/// A method's whole return value.
pub trait IntoOutputs {
    /// The output kinds every value of this type produces.
    fn kinds() -> Vec<OutputKind>
    where
        Self: Sized;

    fn into_outputs(self) -> Vec<Output>;
}

impl IntoOutput for String {
    fn kind() -> OutputKind {
        OutputKind::Text
    }

    fn into_output(self) -> Output {
        Output::Text(self)
    }
}

impl IntoOutput for &'static str {
    fn kind() -> OutputKind {
        OutputKind::Text
    }

    fn into_output(self) -> Output {
        Output::Text(self.to_string())
    }
}

macro_rules! int_output {
    ($($ty:ty),*) => {
        $(
            impl IntoOutput for $ty {
                fn kind() -> OutputKind {
                    OutputKind::Int
                }

                fn into_output(self) -> Output {
                    match i64::try_from(self) {
                        Ok(v) => Output::Int(v),
                        Err(_) => Output::Text(self.to_string()),
                    }
                }
            }
        )*
    };
}

int_output!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl IntoOutput for f32 {
    fn kind() -> OutputKind {
        OutputKind::Float
    }

    fn into_output(self) -> Output {
        Output::Float(f64::from(self))
    }
}

impl IntoOutput for f64 {
    fn kind() -> OutputKind {
        OutputKind::Float
    }

    fn into_output(self) -> Output {
        Output::Float(self)
    }
}

impl IntoOutput for bool {
    fn kind() -> OutputKind {
        OutputKind::Bool
    }

    fn into_output(self) -> Output {
        Output::Bool(self)
    }
}

impl IntoOutput for StatusCode {
    fn kind() -> OutputKind {
        OutputKind::Status
    }

    fn into_output(self) -> Output {
        Output::Status(self)
    }
}

impl IntoOutput for serde_json::Value {
    fn kind() -> OutputKind {
        OutputKind::Json
    }

    fn into_output(self) -> Output {
        Output::Json(self)
    }
}

impl<T: IntoOutput> IntoOutput for Option<T> {
    fn kind() -> OutputKind {
        T::kind()
    }

    fn into_output(self) -> Output {
        match self {
            Some(value) => value.into_output(),
            None => Output::Nil,
        }
    }
}

impl IntoOutputs for () {
    fn kinds() -> Vec<OutputKind> {
        Vec::new()
    }

    fn into_outputs(self) -> Vec<Output> {
        Vec::new()
    }
}

impl<T: IntoOutput> IntoOutputs for T {
    fn kinds() -> Vec<OutputKind> {
        vec![T::kind()]
    }

    fn into_outputs(self) -> Vec<Output> {
        vec![self.into_output()]
    }
}

impl<A: IntoOutput, B: IntoOutput> IntoOutputs for (A, B) {
    fn kinds() -> Vec<OutputKind> {
        vec![A::kind(), B::kind()]
    }

    fn into_outputs(self) -> Vec<Output> {
        vec![self.0.into_output(), self.1.into_output()]
    }
}

impl<T: IntoOutputs, E: fmt::Display> IntoOutputs for Result<T, E> {
    fn kinds() -> Vec<OutputKind> {
        let mut kinds = T::kinds();
        kinds.push(OutputKind::Error);
        kinds
    }

    fn into_outputs(self) -> Vec<Output> {
        match self {
            Ok(value) => {
                let mut outputs = value.into_outputs();
                outputs.push(Output::Error(None));
                outputs
            }
            Err(err) => vec![Output::Error(Some(err.to_string()))],
        }
    }
}

/// A value serialized as a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T: Serialize + Send> Response for Json<T> {
    fn render(self: Box<Self>, ctx: &mut Context, options: &DispatchOptions) {
        let encoded = if options.pretty_json {
            serde_json::to_vec_pretty(&self.0)
        } else {
            serde_json::to_vec(&self.0)
        };

        match encoded {
            Ok(body) => {
                if ctx.content_type().is_none() {
                    ctx.set_content_type(APPLICATION_JSON);
                }
                ctx.write(&body);
            }
            Err(err) => {
                error!(error = %err, "JSON encoding failed");
                ctx.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                ctx.text(&err.to_string());
            }
        }
    }

    fn view_data(&self) -> Option<serde_json::Value> {
        serde_json::to_value(&self.0)
            .inspect_err(|err| error!(error = %err, "View data encoding failed"))
            .ok()
    }
}

impl<T: Serialize + Send + 'static> IntoOutput for Json<T> {
    fn kind() -> OutputKind {
        OutputKind::Response
    }

    fn into_output(self) -> Output {
        Output::response(self)
    }
}

/// A view to render, with its data.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub name: String,
    pub data: serde_json::Value,
}

impl View {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: serde_json::Value::Null,
        }
    }

    /// Sets the view data.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

impl Response for View {
    fn render(self: Box<Self>, ctx: &mut Context, _options: &DispatchOptions) {
        let View { name, data } = *self;
        ctx.view(name, data);
    }
}

impl IntoOutput for View {
    fn kind() -> OutputKind {
        OutputKind::Response
    }

    fn into_output(self) -> Output {
        Output::response(self)
    }
}

const CONTENT_TYPE_TOPS: [&str; 10] = [
    "application",
    "audio",
    "example",
    "font",
    "image",
    "message",
    "model",
    "multipart",
    "text",
    "video",
];

/// Returns `true` if `value` reads as a MIME content type rather than a
/// view name.
///
/// ```
/// use tariq_mvc::result::is_content_type;
///
/// assert!(is_content_type("text/html"));
/// assert!(is_content_type("application/json; charset=utf-8"));
/// assert!(!is_content_type("user/profile.html"));
/// assert!(!is_content_type("index.html"));
/// ```
pub fn is_content_type(value: &str) -> bool {
    let essence = value.split(';').next().unwrap_or_default().trim();
    let Some((top, sub)) = essence.split_once('/') else {
        return false;
    };

    CONTENT_TYPE_TOPS.contains(&top.to_ascii_lowercase().as_str())
        && !sub.is_empty()
        && !sub.contains('/')
        && !sub.contains(char::is_whitespace)
}

/// Returns `true` if results of these kinds can be written.
pub fn is_supported_shape(kinds: &[OutputKind]) -> bool {
    let kinds = match kinds.split_last() {
        Some((OutputKind::Error, rest)) => rest,
        _ => kinds,
    };

    match kinds {
        [] | [_] => true,
        [first, second] => {
            *first != OutputKind::Error
                && matches!(
                    second,
                    OutputKind::Int | OutputKind::Status | OutputKind::Text | OutputKind::Bool
                )
        }
        _ => false,
    }
}

/// Writes a method's outputs to the response.
pub fn dispatch_func_result(ctx: &mut Context, mut outputs: Vec<Output>, options: &DispatchOptions) {
    if matches!(outputs.last(), Some(Output::Error(_))) {
        if let Some(Output::Error(Some(message))) = outputs.pop() {
            trace!(error = %message, "Method returned an error");
            if !ctx.status().is_client_error() && !ctx.status().is_server_error() {
                ctx.set_status(options.error_status);
            }
            ctx.text(&message);
            return;
        }
    }

    let mut outputs = outputs.into_iter();
    match (outputs.next(), outputs.next(), outputs.next()) {
        (None, _, _) => {}
        (Some(value), None, _) => render(ctx, value, options),
        (Some(value), Some(second), None) => dispatch_pair(ctx, value, second, options),
        _ => warn!("Unsupported result shape: more than two values"),
    }
}

fn dispatch_pair(ctx: &mut Context, value: Output, second: Output, options: &DispatchOptions) {
    match second {
        Output::Int(code) => {
            match u16::try_from(code).ok().and_then(|c| StatusCode::from_u16(c).ok()) {
                Some(status) => ctx.set_status(status),
                None => warn!(code, "Returned status code is out of range"),
            }
            render(ctx, value, options);
        }
        Output::Status(status) => {
            ctx.set_status(status);
            render(ctx, value, options);
        }
        Output::Text(text) if is_content_type(&text) => {
            ctx.set_content_type(text);
            render(ctx, value, options);
        }
        Output::Text(view) => {
            let data = view_data(value);
            ctx.view(view, data);
        }
        Output::Bool(false) => {
            ctx.set_status(StatusCode::NOT_FOUND);
        }
        Output::Bool(true) => render(ctx, value, options),
        other => warn!(kind = ?other.kind(), "Unsupported result shape"),
    }
}

fn render(ctx: &mut Context, value: Output, options: &DispatchOptions) {
    match value {
        Output::Nil | Output::Error(None) => {}
        Output::Text(text) => ctx.text(&text),
        Output::Int(v) => ctx.text(&v.to_string()),
        Output::Float(v) => ctx.text(&v.to_string()),
        Output::Bool(v) => ctx.text(&v.to_string()),
        Output::Status(status) => ctx.set_status(status),
        Output::Error(Some(message)) => {
            ctx.set_status(options.error_status);
            ctx.text(&message);
        }
        Output::Json(value) => render_json(ctx, value, options),
        Output::Response(response) => response.render(ctx, options),
    }
}

fn render_json(ctx: &mut Context, value: serde_json::Value, options: &DispatchOptions) {
    match value {
        serde_json::Value::Null => {}
        serde_json::Value::String(text) => ctx.text(&text),
        serde_json::Value::Number(n) => ctx.text(&n.to_string()),
        serde_json::Value::Bool(b) => ctx.text(&b.to_string()),
        structured => {
            if ctx.content_type().is_none() {
                ctx.set_content_type(APPLICATION_JSON);
            }
            let encoded = if options.pretty_json {
                serde_json::to_vec_pretty(&structured)
            } else {
                serde_json::to_vec(&structured)
            };
            match encoded {
                Ok(body) => ctx.write(&body),
                Err(err) => {
                    error!(error = %err, "JSON encoding failed");
                    ctx.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                }
            }
        }
    }
}

fn view_data(value: Output) -> serde_json::Value {
    match value {
        Output::Json(value) => value,
        Output::Text(text) => serde_json::Value::String(text),
        Output::Int(v) => serde_json::Value::from(v),
        Output::Float(v) => serde_json::Value::from(v),
        Output::Bool(v) => serde_json::Value::Bool(v),
        Output::Nil | Output::Error(_) | Output::Status(_) => serde_json::Value::Null,
        Output::Response(response) => response.view_data().unwrap_or_else(|| {
            warn!("Response has no view data");
            serde_json::Value::Null
        }),
    }
}
