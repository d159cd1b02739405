//! Controllers and handlers bound to routes.
//!
//! A controller's public methods become routes named after their verbs and
//! `by` segments; its fields and the methods' arguments are injected from a
//! [`Dependencies`](tariq_container::Dependencies) registry, path
//! parameters included. Results are written by [`result::dispatch_func_result`].

pub mod activator;
pub mod binding;
pub mod context;
pub mod controller;
pub mod engine;
pub mod handler;
pub mod parser;
pub mod result;
pub mod router;
pub mod template;

pub use activator::{ActivationError, ActivationState, ControllerActivator, ControllerDescriptor};
pub use context::{APPLICATION_JSON, Context, Handler, Params, TEXT_PLAIN, ViewCall};
pub use controller::{Controller, ControllerMethod, Invoker};
pub use engine::{Engine, EngineBuilder};
pub use handler::IntoHandler;
pub use parser::{ParseError, RouteDef, Verb, parse_method};
pub use result::{DispatchOptions, IntoOutput, IntoOutputs, Json, Output, OutputKind, Response, View};
pub use router::{Party, PartyScope, Reporter, Route, Router};
pub use template::{ParamType, Template, TemplateError};

pub use http::{Method, StatusCode};
