//! When a provider produces its value.
use std::fmt;

/// Lifetime of a provided value.
///
/// ```
/// use tariq_container::scope::Scope;
///
/// assert!(Scope::Singleton.is_static());
/// assert_eq!(Scope::Request.to_string(), "request");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Produced once and cloned into every target. Wrap services in `Arc`.
    Singleton,
    /// Produced per request from the live context, e.g. path values or the
    /// user a middleware authenticated. May run on many workers at once.
    Request,
}

impl Scope {
    pub fn is_static(self) -> bool {
        self == Scope::Singleton
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Singleton => "singleton",
            Scope::Request => "request",
        })
    }
}
