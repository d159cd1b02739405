//! Typed dependency resolution for Tariq controllers and handlers.

pub mod error;
pub mod injector;
pub mod key;
pub mod provider;
pub mod registry;
pub mod scope;

pub use error::{InjectError, NotBoundError, Result};
pub use injector::{Args, Field, FuncInjector, Injectable, Param, Plan, PlanSource, StructInjector};
pub use key::TypeKey;
pub use provider::{BinderFn, BoxedValue, PathParam, Provider, Source};
pub use registry::Dependencies;
pub use scope::Scope;
