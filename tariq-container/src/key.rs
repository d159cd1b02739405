//! Keys matching providers to the fields and arguments that need them.
//!
//! Two keys are equal when they name the same Rust type. The type name is
//! carried along only for diagnostics.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use tariq_support::rendering::shorten_type_name;

/// The identity of a bindable type.
///
/// ```
/// use tariq_container::key::TypeKey;
///
/// let key = TypeKey::of::<Vec<u8>>();
/// assert!(key.is::<Vec<u8>>());
/// assert_eq!(key.short_name(), "Vec<u8>");
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified name, as reported by [`std::any::type_name`].
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Name with every module path stripped, for error messages.
    pub fn short_name(&self) -> String {
        shorten_type_name(self.name)
    }

    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&self.name).finish()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
