//! Struct and function injectors.
//!
//! Both injectors resolve their targets against a [`Dependencies`] registry
//! once, when routes are built. The resulting [`Plan`] is fixed; requests
//! only extract values from the chosen providers.
//!
//! - [`StructInjector`] fills the injectable fields of a controller instance.
//! - [`FuncInjector`] fills the argument slots of a method call.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tariq_support::rendering::suggest_similar;
use tracing::trace;

use crate::error::{InjectError, NotBoundError, Result};
use crate::key::TypeKey;
use crate::provider::{BoxedValue, Provider, Source};
use crate::registry::Dependencies;
use crate::scope::Scope;

/// Stores a produced value into one field of `T`.
pub type Setter<T> = Arc<dyn Fn(&mut T, BoxedValue) -> Result<()> + Send + Sync>;

/// An injectable field of `T`.
///
/// Usually generated by `#[derive(Inject)]`.
pub struct Field<T> {
    name: &'static str,
    key: TypeKey,
    setter: Setter<T>,
}

impl<T: 'static> Field<T> {
    /// Describes a field that receives values of type `V`.
    ///
    /// # Examples
    /// ```
    /// use tariq_container::injector::Field;
    ///
    /// #[derive(Default)]
    /// struct Controller { title: String }
    ///
    /// let field = Field::new("title", |c: &mut Controller, v: String| c.title = v);
    /// assert_eq!(field.name(), "title");
    /// ```
    pub fn new<V, F>(name: &'static str, set: F) -> Self
    where
        V: 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self {
            name,
            key: TypeKey::of::<V>(),
            setter: Arc::new(move |target: &mut T, value: BoxedValue| {
                set(target, downcast::<V>(value)?);
                Ok(())
            }),
        }
    }
}

impl<T> Field<T> {
    /// The field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type of value the field receives.
    pub fn key(&self) -> TypeKey {
        self.key
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            key: self.key,
            setter: self.setter.clone(),
        }
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("key", &self.key)
            .finish()
    }
}

/// Types whose fields can be injected.
///
/// Implement with `#[derive(Inject)]`.
pub trait Injectable: Sized + 'static {
    /// Describes every injectable field, in declaration order.
    fn fields() -> Vec<Field<Self>>;
}

/// Marker key of the request-context parameter.
struct ContextParam;

/// One declared parameter of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    key: TypeKey,
    is_context: bool,
}

impl Param {
    /// A parameter receiving a value of type `T`.
    pub fn value<T: 'static>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            is_context: false,
        }
    }

    /// The request-context parameter.
    pub fn context() -> Self {
        Self {
            key: TypeKey::of::<ContextParam>(),
            is_context: true,
        }
    }

    /// The parameter's type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Returns `true` for the request-context parameter.
    pub fn is_context(&self) -> bool {
        self.is_context
    }
}

/// Where an injected value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanSource {
    /// A bound value, cloned.
    Static,
    /// A factory run for every request.
    PerRequest,
    /// A route parameter.
    PathParameter { name: String, index: usize },
    /// The live request context.
    Context,
}

impl PlanSource {
    fn of<C>(provider: &Provider<C>) -> Self {
        match (provider.path(), provider.scope()) {
            (Some(param), _) => PlanSource::PathParameter {
                name: param.name.clone(),
                index: param.index,
            },
            (None, Scope::Singleton) => PlanSource::Static,
            (None, Scope::Request) => PlanSource::PerRequest,
        }
    }
}

/// One resolved field or parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Field or parameter position
    pub position: usize,
    /// The type injected
    pub target: TypeKey,
    /// Where the value comes from
    pub source: PlanSource,
}

/// Argument slots of one method call.
///
/// The function injector fills them; the invoker drains them with
/// [`Args::take`]. Context slots stay empty.
pub struct Args {
    slots: Vec<Option<BoxedValue>>,
}

impl Args {
    /// Creates `len` empty slots.
    pub fn with_len(len: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(len).collect(),
        }
    }

    /// Fills slot `index`.
    pub fn set(&mut self, index: usize, value: BoxedValue) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(value);
        }
    }

    /// Moves the value out of slot `index`.
    pub fn take<T: 'static>(&mut self, index: usize) -> Result<T> {
        let value = self
            .slots
            .get_mut(index)
            .and_then(Option::take)
            .ok_or(InjectError::MissingArgument { index })?;
        downcast(value)
    }

    /// The number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if there are no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filled: Vec<bool> = self.slots.iter().map(Option::is_some).collect();
        f.debug_struct("Args").field("filled", &filled).finish()
    }
}

fn downcast<T: 'static>(value: BoxedValue) -> Result<T> {
    let value: Box<dyn Any + Send> = value;
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| InjectError::TypeMismatch {
            expected: TypeKey::of::<T>(),
        })
}

struct FieldEntry<T, C> {
    field: Field<T>,
    source: Source<C>,
    plan: Plan,
}

/// Fills the injectable fields of a `T`.
///
/// Fields without a provider keep whatever value the instance had.
pub struct StructInjector<T, C> {
    entries: Vec<FieldEntry<T, C>>,
}

impl<T: 'static, C: 'static> StructInjector<T, C> {
    /// Resolves every field against `deps`.
    pub fn new(fields: Vec<Field<T>>, deps: &Dependencies<C>) -> Self {
        let mut entries = Vec::new();

        for (position, field) in fields.into_iter().enumerate() {
            let Some((_, provider)) = deps.find(&field.key(), &[]) else {
                trace!(field = field.name(), key = %field.key(), "Field left unset");
                continue;
            };

            let plan = Plan {
                position,
                target: field.key(),
                source: PlanSource::of(provider),
            };
            trace!(field = field.name(), key = %field.key(), source = ?plan.source, "Field resolved");
            entries.push(FieldEntry {
                source: provider.source().clone(),
                field,
                plan,
            });
        }

        Self { entries }
    }

    /// Resolves the fields declared by [`Injectable`].
    pub fn of(deps: &Dependencies<C>) -> Self
    where
        T: Injectable,
    {
        Self::new(T::fields(), deps)
    }

    /// Returns `false` if no field resolved; injection can be skipped.
    pub fn is_valid(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Fills every resolved field of `target`.
    pub fn inject_elem(&self, target: &mut T, ctx: &mut C) -> Result<()> {
        for entry in &self.entries {
            let value = entry.source.produce(ctx)?;
            (entry.field.setter)(target, value)?;
        }
        Ok(())
    }

    /// The resolved fields, in declaration order.
    pub fn plan(&self) -> Vec<Plan> {
        self.entries.iter().map(|e| e.plan.clone()).collect()
    }
}

impl<T, C> fmt::Debug for StructInjector<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructInjector")
            .field("fields", &self.entries.iter().map(|e| e.field.name()).collect::<Vec<_>>())
            .finish()
    }
}

struct Slot<C> {
    index: usize,
    source: Source<C>,
}

/// Fills the argument slots of one method.
pub struct FuncInjector<C> {
    len: usize,
    slots: Vec<Slot<C>>,
    plan: Vec<Plan>,
}

impl<C: 'static> FuncInjector<C> {
    /// Resolves every parameter against `deps`.
    ///
    /// Context parameters are left to the caller. Each path-parameter
    /// provider satisfies at most one parameter. A parameter without a
    /// provider fails with [`InjectError::NotBound`]; `required_by` names
    /// the method in that error.
    pub fn new(params: &[Param], deps: &Dependencies<C>, required_by: &str) -> Result<Self> {
        let mut consumed = vec![false; deps.len()];
        let mut slots = Vec::new();
        let mut plan = Vec::with_capacity(params.len());

        for (index, param) in params.iter().enumerate() {
            if param.is_context() {
                plan.push(Plan {
                    position: index,
                    target: param.key(),
                    source: PlanSource::Context,
                });
                continue;
            }

            let Some((position, provider)) = deps.find(&param.key(), &consumed) else {
                let names = deps.registered_names();
                return Err(InjectError::NotBound(NotBoundError {
                    requested: param.key(),
                    required_by: Some(required_by.to_string()),
                    suggestions: suggest_similar(param.key().type_name(), &names, 3),
                }));
            };

            if provider.is_consumable() {
                consumed[position] = true;
            }

            let source = PlanSource::of(provider);
            trace!(method = required_by, index, key = %param.key(), source = ?source, "Parameter resolved");
            plan.push(Plan {
                position: index,
                target: param.key(),
                source,
            });
            slots.push(Slot {
                index,
                source: provider.source().clone(),
            });
        }

        Ok(Self {
            len: params.len(),
            slots,
            plan,
        })
    }

    /// Returns `false` if there is nothing to inject.
    pub fn is_valid(&self) -> bool {
        !self.slots.is_empty()
    }

    /// The number of declared parameters.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the method declares no parameters.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Produces every non-context argument into `args`.
    pub fn inject(&self, args: &mut Args, ctx: &mut C) -> Result<()> {
        for slot in &self.slots {
            args.set(slot.index, slot.source.produce(ctx)?);
        }
        Ok(())
    }

    /// The resolved parameters, in declaration order.
    pub fn plan(&self) -> &[Plan] {
        &self.plan
    }
}

impl<C> fmt::Debug for FuncInjector<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncInjector")
            .field("plan", &self.plan)
            .finish()
    }
}
