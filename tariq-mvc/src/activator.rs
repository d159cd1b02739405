//! Controller activation: from a controller type to registered routes.
//!
//! Activation runs once per controller registration:
//!
//! 1. the controller's [`Controller::on_activate`] hook runs; it may bind
//!    defaults or register routes itself with [`ControllerActivator::handle`]
//! 2. the struct injector is built from the final registry
//! 3. every method named like a route is registered
//!
//! Each route gets its own registry (the controller's plus the route's path
//! parameters) and its own function injector, both fixed from then on.

use std::any::type_name;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tariq_container::{Args, Dependencies, FuncInjector, InjectError, StructInjector, TypeKey};
use tariq_support::rendering::{controller_name, render_suggestions, suggest_similar};
use tracing::{debug, instrument, trace};

use crate::binding::path_params_for_input;
use crate::context::{Context, Handler};
use crate::controller::{Controller, ControllerMethod};
use crate::handler::fail_request;
use crate::parser::{ParseError, Verb, parse_method};
use crate::result::{DispatchOptions, dispatch_func_result, is_supported_shape};
use crate::router::{Party, Route};
use crate::template::TemplateError;

/// Hook names that never become routes.
const ON_ACTIVATE: &str = "on_activate";
const BEGIN_REQUEST: &str = "begin_request";
const END_REQUEST: &str = "end_request";

/// Where an activator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    Created,
    Activating,
    Activated,
}

/// What activation produced for one controller type.
#[derive(Debug, Clone)]
pub struct ControllerDescriptor {
    pub type_key: TypeKey,
    /// Display name, e.g. `user::Controller`
    pub full_name: String,
    /// Method names that can no longer be registered
    pub reserved: Vec<String>,
    pub routes: Vec<Route>,
}

/// A route that could not be registered.
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    #[error("Empty {what} passed to handle for '{controller}'")]
    EmptyArgument {
        controller: String,
        what: &'static str,
    },

    #[error("Method '{controller}.{name}' is reserved or already registered")]
    Reserved { controller: String, name: String },

    #[error("Method '{name}' doesn't exist in controller '{controller}'{}", render_suggestions(.suggestions))]
    MethodNotFound {
        controller: String,
        name: String,
        suggestions: Vec<String>,
    },

    #[error("Unknown HTTP method '{method}' for '{controller}.{name}'")]
    UnknownVerb {
        controller: String,
        name: String,
        method: String,
    },

    #[error("Failed to infer the route of '{controller}.{name}': {source}")]
    Parse {
        controller: String,
        name: String,
        source: ParseError,
    },

    #[error("Failed to parse the path of '{controller}.{name}': {source}")]
    Template {
        controller: String,
        name: String,
        source: TemplateError,
    },

    #[error("Failed to bind the inputs of '{controller}.{name}': {source}")]
    Inject {
        controller: String,
        name: String,
        source: InjectError,
    },
}

/// Registers the routes of one controller type.
///
/// Handed to [`Controller::on_activate`], where the controller can inspect
/// and extend its registry or register routes by hand.
pub struct ControllerActivator<'p, T> {
    party: &'p mut dyn Party,
    descriptor: ControllerDescriptor,
    dependencies: Dependencies<Context>,
    methods: Vec<ControllerMethod<T>>,
    injector: Arc<OnceCell<StructInjector<T, Context>>>,
    options: DispatchOptions,
    state: ActivationState,
}

impl<'p, T: Controller> ControllerActivator<'p, T> {
    pub(crate) fn new(
        party: &'p mut dyn Party,
        dependencies: Dependencies<Context>,
        options: DispatchOptions,
    ) -> Self {
        let mut reserved = vec![ON_ACTIVATE.to_string()];
        if T::HAS_LIFECYCLE {
            reserved.push(BEGIN_REQUEST.to_string());
            reserved.push(END_REQUEST.to_string());
        }

        Self {
            party,
            descriptor: ControllerDescriptor {
                type_key: TypeKey::of::<T>(),
                full_name: controller_name(type_name::<T>()),
                reserved,
                routes: Vec::new(),
            },
            dependencies,
            methods: T::methods(),
            injector: Arc::new(OnceCell::new()),
            options,
            state: ActivationState::Created,
        }
    }

    pub fn full_name(&self) -> &str {
        &self.descriptor.full_name
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    pub fn descriptor(&self) -> &ControllerDescriptor {
        &self.descriptor
    }

    /// The controller's registry. Changes made before the struct injector
    /// is built apply to every route.
    pub fn dependencies(&mut self) -> &mut Dependencies<Context> {
        &mut self.dependencies
    }

    /// The party routes are registered on.
    pub fn party(&mut self) -> &mut (dyn Party + 'p) {
        &mut *self.party
    }

    /// Returns `true` if `name` is a hook or was already registered.
    pub fn is_reserved_method(&self, name: &str) -> bool {
        self.descriptor.reserved.iter().any(|r| r == name)
    }

    /// Registers `name` for `method` (an HTTP method, or `ALL`/`ANY`) and
    /// `path`, with `middleware` running first.
    ///
    /// Errors are reported to the party and returned.
    pub fn handle(
        &mut self,
        method: &str,
        path: &str,
        name: &str,
        middleware: Vec<Handler>,
    ) -> Result<Vec<Route>, ActivationError> {
        let result = self.try_handle(method, path, name, middleware);
        if let Err(err) = &result {
            self.party.reporter().add_err(err);
        }
        result
    }

    fn try_handle(
        &mut self,
        method: &str,
        path: &str,
        name: &str,
        middleware: Vec<Handler>,
    ) -> Result<Vec<Route>, ActivationError> {
        let controller = self.descriptor.full_name.clone();

        for (what, value) in [("method", method), ("path", path), ("name", name)] {
            if value.is_empty() {
                return Err(ActivationError::EmptyArgument { controller, what });
            }
        }

        if self.is_reserved_method(name) {
            return Err(ActivationError::Reserved {
                controller,
                name: name.to_string(),
            });
        }

        let Some(target) = self.methods.iter().find(|m| m.name() == name).cloned() else {
            let names: Vec<&str> = self.methods.iter().map(|m| m.name()).collect();
            return Err(ActivationError::MethodNotFound {
                controller,
                name: name.to_string(),
                suggestions: suggest_similar(name, &names, 3),
            });
        };

        let Some(verb) = Verb::parse(method) else {
            return Err(ActivationError::UnknownVerb {
                controller,
                name: name.to_string(),
                method: method.to_string(),
            });
        };

        let template = self
            .party
            .parse_template(path)
            .map_err(|source| ActivationError::Template {
                controller: controller.clone(),
                name: name.to_string(),
                source,
            })?;

        self.descriptor.reserved.push(name.to_string());

        let mut route_deps = self.dependencies.clone();
        for provider in path_params_for_input(&template, target.params()) {
            route_deps.add_path_param(provider);
        }

        let handler_name = format!("{controller}.{name}");
        let funcs = FuncInjector::new(target.params(), &route_deps, &handler_name).map_err(|source| {
            ActivationError::Inject {
                controller: controller.clone(),
                name: name.to_string(),
                source,
            }
        })?;

        if !is_supported_shape(target.outputs()) {
            self.party.reporter().add(format!(
                "Results of '{handler_name}' cannot be written: unsupported shape {:?}",
                target.outputs()
            ));
        }

        let handler = self.make_handler(target, funcs);
        let mut routes = Vec::new();
        for http_method in verb.methods() {
            let mut handlers = middleware.clone();
            handlers.push(handler.clone());
            if let Some(route) = self.party.handle(http_method, path, &handler_name, handlers) {
                routes.push(route);
            }
        }

        debug!(handler = %handler_name, verb = %verb, path, routes = routes.len(), "Registered controller method");
        self.descriptor.routes.extend(routes.iter().cloned());
        Ok(routes)
    }

    fn make_handler(&self, method: ControllerMethod<T>, funcs: FuncInjector<Context>) -> Handler {
        let injector = self.injector.clone();
        let options = self.options;

        Arc::new(move |ctx: &mut Context| {
            if T::HAS_LIFECYCLE {
                let mut guard = EndRequest {
                    controller: T::default(),
                    ctx,
                };
                guard.controller.begin_request(&mut *guard.ctx);
                serve(&mut guard.controller, &mut *guard.ctx, &injector, &funcs, &method, &options);
            } else {
                let mut controller = T::default();
                serve(&mut controller, ctx, &injector, &funcs, &method, &options);
            }
        })
    }

    #[instrument(skip_all, fields(controller = %self.descriptor.full_name))]
    pub(crate) fn activate(mut self) -> ControllerDescriptor {
        self.state = ActivationState::Activating;
        T::on_activate(&mut self);

        let injector = StructInjector::of(&self.dependencies);
        debug!(fields = injector.plan().len(), "Built struct injector");
        if self.injector.set(injector).is_err() {
            trace!("Struct injector already set");
        }

        let candidates: Vec<_> = self
            .methods
            .iter()
            .map(|m| (m.name(), m.params().to_vec()))
            .collect();

        for (name, params) in candidates {
            match parse_method(name, &params, |n| self.is_reserved_method(n)) {
                Ok(Some(def)) => {
                    // `handle` has already added the error to the reporter.
                    if let Err(err) = self.handle(def.verb.as_str(), &def.path, name, Vec::new()) {
                        trace!(method = name, error = %err, "Route skipped");
                    }
                }
                Ok(None) => trace!(method = name, "Not a route"),
                Err(source) => {
                    let err = ActivationError::Parse {
                        controller: self.descriptor.full_name.clone(),
                        name: name.to_string(),
                        source,
                    };
                    self.party.reporter().add_err(&err);
                }
            }
        }

        self.state = ActivationState::Activated;
        debug!(routes = self.descriptor.routes.len(), "Controller activated");
        self.descriptor
    }
}

/// Calls `end_request` when dropped, so it runs on every exit path of a
/// request that began.
struct EndRequest<'a, T: Controller> {
    controller: T,
    ctx: &'a mut Context,
}

impl<T: Controller> Drop for EndRequest<'_, T> {
    fn drop(&mut self) {
        self.controller.end_request(&mut *self.ctx);
    }
}

fn serve<T: Controller>(
    controller: &mut T,
    ctx: &mut Context,
    injector: &OnceCell<StructInjector<T, Context>>,
    funcs: &FuncInjector<Context>,
    method: &ControllerMethod<T>,
    options: &DispatchOptions,
) {
    if ctx.is_stopped() {
        trace!(method = method.name(), "Request stopped by begin_request");
        return;
    }

    if let Some(injector) = injector.get().filter(|i| i.is_valid()) {
        if let Err(err) = injector.inject_elem(controller, ctx) {
            fail_request(ctx, &err);
            return;
        }
        if ctx.is_stopped() {
            return;
        }
    }

    let mut args = Args::with_len(funcs.len());
    if funcs.is_valid() {
        if let Err(err) = funcs.inject(&mut args, ctx) {
            fail_request(ctx, &err);
            return;
        }
        if ctx.is_stopped() {
            return;
        }
    }

    match method.invoke(controller, ctx, &mut args) {
        Ok(outputs) => dispatch_func_result(ctx, outputs, options),
        Err(err) => fail_request(ctx, &err),
    }
}
