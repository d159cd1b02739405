//! The controller contract.
//!
//! A controller is a `Default` struct whose injectable fields are described
//! by [`Injectable`] and whose endpoint methods are listed by
//! [`Controller::methods`]. Both are normally generated: `#[derive(Inject)]`
//! on the struct and `#[controller]` on its inherent impl.

use std::fmt;
use std::sync::Arc;

use tariq_container::{Args, InjectError, Injectable, Param};

use crate::activator::ControllerActivator;
use crate::context::Context;
use crate::result::{Output, OutputKind};

/// Calls one method of `T` with arguments drained from [`Args`].
pub type Invoker<T> =
    Arc<dyn Fn(&mut T, &mut Context, &mut Args) -> Result<Vec<Output>, InjectError> + Send + Sync>;

/// One public method of a controller.
pub struct ControllerMethod<T> {
    name: &'static str,
    params: Vec<Param>,
    outputs: Vec<OutputKind>,
    invoker: Invoker<T>,
}

impl<T> ControllerMethod<T> {
    /// Describes a method.
    ///
    /// `params` lists the declared parameters without the receiver, with
    /// [`Param::context`] for the request context; `outputs` is the kind
    /// list of the return type.
    pub fn new<F>(name: &'static str, params: Vec<Param>, outputs: Vec<OutputKind>, invoker: F) -> Self
    where
        F: Fn(&mut T, &mut Context, &mut Args) -> Result<Vec<Output>, InjectError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name,
            params,
            outputs,
            invoker: Arc::new(invoker),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn outputs(&self) -> &[OutputKind] {
        &self.outputs
    }

    /// Calls the method.
    pub fn invoke(&self, target: &mut T, ctx: &mut Context, args: &mut Args) -> Result<Vec<Output>, InjectError> {
        (self.invoker)(target, ctx, args)
    }
}

impl<T> Clone for ControllerMethod<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            params: self.params.clone(),
            outputs: self.outputs.clone(),
            invoker: self.invoker.clone(),
        }
    }
}

impl<T> fmt::Debug for ControllerMethod<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerMethod")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("outputs", &self.outputs)
            .finish()
    }
}

/// A type whose methods are served as routes.
///
/// A fresh `Self::default()` serves every request. When the type declares
/// [`Controller::begin_request`] or [`Controller::end_request`], set
/// [`Controller::HAS_LIFECYCLE`] so the hooks are called and their names
/// are kept out of routing.
pub trait Controller: Injectable + Default {
    /// Whether the request hooks are declared.
    const HAS_LIFECYCLE: bool = false;

    /// The public methods, in declaration order.
    fn methods() -> Vec<ControllerMethod<Self>>;

    /// Runs before the method; may stop the request.
    fn begin_request(&mut self, _ctx: &mut Context) {}

    /// Runs after the method, on every exit path once the request began.
    fn end_request(&mut self, _ctx: &mut Context) {}

    /// Runs once while routes are being built; may bind defaults or
    /// register extra routes.
    fn on_activate(_activator: &mut ControllerActivator<'_, Self>) {}
}
