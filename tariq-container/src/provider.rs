//! Providers, the typed sources of injectable values.
//!
//! A [`Provider`] produces values of exactly one type, identified by its
//! [`TypeKey`]. Static providers hold a value that is cloned into every
//! target; request providers run a factory against the live request
//! context `C`.
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use tariq_container::provider::Provider;
//! use tariq_container::scope::Scope;
//!
//! struct Request { user: String }
//!
//! let greeting: Provider<Request> = Provider::value(Arc::new("hello".to_string()));
//! assert_eq!(greeting.scope(), Scope::Singleton);
//!
//! let user: Provider<Request> = Provider::factory(|req: &mut Request| req.user.clone());
//! assert_eq!(user.scope(), Scope::Request);
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::Result;
use crate::key::TypeKey;
use crate::scope::Scope;

/// A type-erased injectable value.
pub type BoxedValue = Box<dyn Any + Send>;

/// Produces a copy of a stored static value.
pub type StaticFn = Arc<dyn Fn() -> BoxedValue + Send + Sync>;

/// Produces a value from the request context.
pub type BinderFn<C> = Arc<dyn Fn(&mut C) -> Result<BoxedValue> + Send + Sync>;

/// Where a provider's values come from.
pub enum Source<C> {
    /// A stored value, cloned on every use.
    Static(StaticFn),
    /// A factory invoked with the request context.
    Dynamic(BinderFn<C>),
}

impl<C> Source<C> {
    /// Produces one value for the given request.
    #[inline]
    pub fn produce(&self, ctx: &mut C) -> Result<BoxedValue> {
        match self {
            Source::Static(value) => Ok(value()),
            Source::Dynamic(binder) => binder(ctx),
        }
    }
}

impl<C> Clone for Source<C> {
    fn clone(&self) -> Self {
        match self {
            Source::Static(value) => Source::Static(value.clone()),
            Source::Dynamic(binder) => Source::Dynamic(binder.clone()),
        }
    }
}

/// Identifies the route segment a path-parameter provider reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParam {
    /// Parameter name in the route template, e.g. `param0`
    pub name: String,
    /// Position of the parameter among the template's parameters
    pub index: usize,
}

/// A registered source of values of one type.
pub struct Provider<C> {
    key: TypeKey,
    scope: Scope,
    source: Source<C>,
    path_param: Option<PathParam>,
}

impl<C: 'static> Provider<C> {
    /// A static value, cloned into every target.
    ///
    /// Use `Arc<T>` for cheap sharing of services.
    pub fn value<T: Clone + Send + Sync + 'static>(value: T) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            scope: Scope::Singleton,
            source: Source::Static(Arc::new(move || Box::new(value.clone()) as BoxedValue)),
            path_param: None,
        }
    }

    /// A static value built on first use.
    ///
    /// The factory is called once; later uses clone the stored value.
    pub fn lazy<T, F>(factory: F) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let cell: OnceCell<T> = OnceCell::new();

        Self {
            key: TypeKey::of::<T>(),
            scope: Scope::Singleton,
            source: Source::Static(Arc::new(move || {
                Box::new(cell.get_or_init(&factory).clone()) as BoxedValue
            })),
            path_param: None,
        }
    }

    /// A factory invoked once per request with the request context.
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: Send + 'static,
        F: Fn(&mut C) -> T + Send + Sync + 'static,
    {
        Self {
            key: TypeKey::of::<T>(),
            scope: Scope::Request,
            source: Source::Dynamic(Arc::new(move |ctx: &mut C| {
                Ok(Box::new(factory(ctx)) as BoxedValue)
            })),
            path_param: None,
        }
    }

    /// A provider reading one route parameter.
    ///
    /// Path-parameter providers are consumed: inside one function injector
    /// each satisfies at most one parameter, so two `String` parameters
    /// receive two different segments.
    pub fn path_param(key: TypeKey, param: PathParam, binder: BinderFn<C>) -> Self {
        Self {
            key,
            scope: Scope::Request,
            source: Source::Dynamic(binder),
            path_param: Some(param),
        }
    }
}

impl<C> Provider<C> {
    /// The type this provider produces.
    #[inline]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// When values are produced.
    #[inline]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// The value source.
    #[inline]
    pub fn source(&self) -> &Source<C> {
        &self.source
    }

    /// The route parameter this provider reads, if any.
    #[inline]
    pub fn path(&self) -> Option<&PathParam> {
        self.path_param.as_ref()
    }

    /// Returns `true` if the provider may satisfy only one parameter.
    #[inline]
    pub fn is_consumable(&self) -> bool {
        self.path_param.is_some()
    }
}

impl<C> Clone for Provider<C> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            scope: self.scope,
            source: self.source.clone(),
            path_param: self.path_param.clone(),
        }
    }
}

impl<C> fmt::Debug for Provider<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .field("path_param", &self.path_param)
            .finish()
    }
}
