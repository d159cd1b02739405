//! Dependency registry: the ordered provider pool of one scope.
//!
//! [`Dependencies`] maps types to the providers that produce them. Lookup
//! is first-match in declaration order, so providers declared earlier
//! shadow later ones of the same type.
//!
//! The registry is populated during activation and treated as immutable
//! once routes are built; route-scoped registries are produced with
//! [`Clone`] and extended with path-parameter providers.

use std::fmt;

use tracing::{debug, trace};

use crate::key::TypeKey;
use crate::provider::Provider;

/// An ordered collection of providers.
///
/// # Examples
/// ```
/// use tariq_container::registry::Dependencies;
///
/// struct Request;
///
/// let mut deps: Dependencies<Request> = Dependencies::new();
/// deps.bind(String::from("primary"));
/// assert!(deps.bind_exists::<String>());
///
/// // An existing binding is never replaced by a default.
/// assert!(!deps.bind_if_not_exists(String::from("fallback")));
/// assert!(deps.bind_if_not_exists(42u64));
/// ```
pub struct Dependencies<C> {
    providers: Vec<Provider<C>>,
    /// Leading non-consumable providers folded in by [`Dependencies::prepend`]
    presets: usize,
}

impl<C> Dependencies<C> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            presets: 0,
        }
    }

    /// Registers a provider, replacing the first provider of the same type
    /// in place, or appending it if the type is new.
    ///
    /// Presets are never replaced: a provider registered after
    /// [`Dependencies::prepend`] lands behind them and stays shadowed.
    pub fn register(&mut self, provider: Provider<C>) -> &mut Self {
        let key = provider.key();

        match self.replaceable(&key) {
            Some(index) => {
                debug!(key = %key, scope = %provider.scope(), "Replaced provider");
                self.providers[index] = provider;
            }
            None => {
                debug!(key = %key, scope = %provider.scope(), "Registered provider");
                self.providers.push(provider);
            }
        }
        self
    }

    /// Registers a provider only if none exists for its type.
    ///
    /// Returns `true` if the provider was added.
    pub fn register_if_not_exists(&mut self, provider: Provider<C>) -> bool {
        if self.position(&provider.key()).is_some() {
            trace!(key = %provider.key(), "Provider already bound, keeping it");
            return false;
        }
        self.register(provider);
        true
    }

    /// Returns `true` if a provider for `key` exists.
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.position(key).is_some()
    }

    /// Returns `true` if a provider for `T` exists.
    pub fn bind_exists<T: ?Sized + 'static>(&self) -> bool {
        self.contains(&TypeKey::of::<T>())
    }

    /// Folds `presets` in ahead of every provider already registered.
    ///
    /// Used for values the caller supplied alongside a controller: they
    /// shadow engine-wide bindings and activation-hook defaults.
    pub fn prepend(&mut self, presets: Dependencies<C>) -> &mut Self {
        if presets.is_empty() {
            return self;
        }
        debug!(count = presets.len(), "Prepending preset providers");
        let at = self.consumables();
        self.presets += presets.len();
        let mut rest = self.providers.split_off(at);
        self.providers.extend(presets.providers);
        self.providers.append(&mut rest);
        self
    }

    /// Inserts a consumable path-parameter provider ahead of the existing
    /// providers, after any path parameters inserted before it.
    pub fn add_path_param(&mut self, provider: Provider<C>) -> &mut Self {
        let index = self.consumables();
        trace!(key = %provider.key(), path = ?provider.path(), "Added path parameter provider");
        self.providers.insert(index, provider);
        self
    }

    /// Finds the first provider for `key`.
    ///
    /// `consumed` marks path-parameter providers already used by earlier
    /// parameters of the same function; they are skipped. It is indexed
    /// like [`Dependencies::providers`] and may be shorter.
    pub fn find(&self, key: &TypeKey, consumed: &[bool]) -> Option<(usize, &Provider<C>)> {
        let found = self.providers.iter().enumerate().find(|(index, provider)| {
            provider.key() == *key
                && !(provider.is_consumable() && consumed.get(*index).copied().unwrap_or(false))
        });

        match found {
            Some((index, _)) => trace!(key = %key, index, "Provider found"),
            None => trace!(key = %key, "No provider found"),
        }
        found
    }

    /// Returns all providers in lookup order.
    pub fn providers(&self) -> &[Provider<C>] {
        &self.providers
    }

    /// Returns the number of providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Returns the type names of all registered providers (for suggestions).
    pub fn registered_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.key().type_name()).collect()
    }

    fn position(&self, key: &TypeKey) -> Option<usize> {
        self.providers
            .iter()
            .position(|p| p.key() == *key && !p.is_consumable())
    }

    fn replaceable(&self, key: &TypeKey) -> Option<usize> {
        self.providers
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_consumable())
            .skip(self.presets)
            .find(|(_, p)| p.key() == *key)
            .map(|(index, _)| index)
    }

    fn consumables(&self) -> usize {
        self.providers.iter().take_while(|p| p.is_consumable()).count()
    }
}

impl<C: 'static> Dependencies<C> {
    /// Binds a static value, keyed by its own type.
    ///
    /// Overwrites the effective provider for that type.
    pub fn bind<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.register(Provider::value(value))
    }

    /// Binds a per-request factory, keyed by its return type.
    pub fn bind_with<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + 'static,
        F: Fn(&mut C) -> T + Send + Sync + 'static,
    {
        self.register(Provider::factory(factory))
    }

    /// Binds a static value built on first use.
    pub fn bind_lazy<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register(Provider::lazy(factory))
    }

    /// Binds a static value only if no provider for its type exists.
    ///
    /// Returns `true` if it bound. Controllers use this in their activation
    /// hook to install defaults without overriding what the caller chose.
    pub fn bind_if_not_exists<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> bool {
        self.register_if_not_exists(Provider::value(value))
    }
}

impl<C> Default for Dependencies<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for Dependencies<C> {
    fn clone(&self) -> Self {
        Self {
            providers: self.providers.clone(),
            presets: self.presets,
        }
    }
}

impl<C> fmt::Debug for Dependencies<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.providers.iter()).finish()
    }
}
