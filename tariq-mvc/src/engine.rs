//! The engine: shared bindings and settings for many controllers.
//!
//! An [`Engine`] holds the registry every controller it activates starts
//! from, plus the settings used when writing results. It is built with
//! [`EngineBuilder`] and cheap to clone.
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use http::StatusCode;
//! use tariq_mvc::engine::Engine;
//!
//! struct Database { url: String }
//!
//! let engine = Engine::builder()
//!     .bind(Arc::new(Database { url: "postgres://localhost".into() }))
//!     .error_status(StatusCode::UNPROCESSABLE_ENTITY)
//!     .build();
//!
//! assert!(engine.dependencies().bind_exists::<Arc<Database>>());
//! ```

use http::StatusCode;
use tariq_container::{Dependencies, InjectError};
use tracing::debug;

use crate::activator::{ControllerActivator, ControllerDescriptor};
use crate::context::{Context, Handler};
use crate::controller::Controller;
use crate::handler::IntoHandler;
use crate::result::DispatchOptions;
use crate::router::Party;

/// Builder for [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
    dependencies: Dependencies<Context>,
    options: DispatchOptions,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a value shared by every request.
    pub fn bind<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.dependencies.bind(value);
        self
    }

    /// Binds a value computed from each request.
    pub fn bind_with<T, F>(mut self, factory: F) -> Self
    where
        T: Send + 'static,
        F: Fn(&mut Context) -> T + Send + Sync + 'static,
    {
        self.dependencies.bind_with(factory);
        self
    }

    /// Binds a shared value built on first use.
    pub fn bind_lazy<T, F>(mut self, factory: F) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.dependencies.bind_lazy(factory);
        self
    }

    /// Status written for returned errors (default: 400 Bad Request).
    pub fn error_status(mut self, status: StatusCode) -> Self {
        self.options.error_status = status;
        self
    }

    /// Indent JSON bodies.
    pub fn pretty_json(mut self, pretty: bool) -> Self {
        self.options.pretty_json = pretty;
        self
    }

    pub fn build(self) -> Engine {
        debug!(providers = self.dependencies.len(), "Built engine");
        Engine {
            dependencies: self.dependencies,
            options: self.options,
        }
    }
}

/// Activates controllers and builds handlers against shared bindings.
#[derive(Clone, Debug, Default)]
pub struct Engine {
    dependencies: Dependencies<Context>,
    options: DispatchOptions,
}

impl Engine {
    /// An engine without bindings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn dependencies(&self) -> &Dependencies<Context> {
        &self.dependencies
    }

    pub fn options(&self) -> DispatchOptions {
        self.options
    }

    /// Registers the routes of controller `T` on `party`.
    ///
    /// Problems with individual routes are reported to the party; the
    /// returned descriptor lists the routes that were registered.
    pub fn controller<T: Controller>(&self, party: &mut dyn Party) -> ControllerDescriptor {
        self.controller_with::<T>(party, Dependencies::new())
    }

    /// Like [`Engine::controller`], with values that take precedence over
    /// the engine's bindings and the controller's own defaults.
    pub fn controller_with<T: Controller>(
        &self,
        party: &mut dyn Party,
        presets: Dependencies<Context>,
    ) -> ControllerDescriptor {
        let mut dependencies = self.dependencies.clone();
        dependencies.prepend(presets);
        ControllerActivator::<T>::new(party, dependencies, self.options).activate()
    }

    /// Turns a function into a handler whose arguments are injected from
    /// the engine's bindings. The first argument is always the context.
    pub fn handler<M, F: IntoHandler<M>>(&self, f: F) -> Result<Handler, InjectError> {
        f.into_handler(&self.dependencies, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_settings() {
        let engine = Engine::builder()
            .bind(String::from("title"))
            .bind_with(|ctx: &mut Context| ctx.path().len())
            .bind_lazy(|| 7u8)
            .error_status(StatusCode::CONFLICT)
            .pretty_json(true)
            .build();

        assert_eq!(engine.dependencies().len(), 3);
        assert_eq!(engine.options().error_status, StatusCode::CONFLICT);
        assert!(engine.options().pretty_json);
    }

    #[test]
    fn clones_share_bindings() {
        let engine = Engine::builder().bind(1u32).build();
        let copy = engine.clone();
        assert!(copy.dependencies().bind_exists::<u32>());
    }

    #[test]
    fn defaults() {
        let engine = Engine::new();
        assert!(engine.dependencies().is_empty());
        assert_eq!(engine.options(), DispatchOptions::default());
    }
}
