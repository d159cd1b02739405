//! Error types for injection.
//!
//! Missing providers are reported while routes are being built, with the
//! target that needed them and close matches from the registry.

use std::fmt;

use tariq_support::rendering::render_suggestions;

use crate::key::TypeKey;

/// Main error type for provider resolution and value injection.
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    /// No provider is bound for a required parameter.
    #[error("{}", .0)]
    NotBound(NotBoundError),

    /// A provider produced a value of a different type than its key.
    #[error("Type mismatch: expected {expected}")]
    TypeMismatch { expected: TypeKey },

    /// An argument slot was read twice or never filled.
    #[error("Argument slot {index} is empty")]
    MissingArgument { index: usize },

    /// A path segment could not be converted to the parameter's type.
    #[error("Path parameter '{name}' value {value:?} is not a valid {target}")]
    PathParam {
        name: String,
        value: String,
        target: TypeKey,
    },
}

impl InjectError {
    /// Returns `true` if the failure was caused by the client's request
    /// rather than by the server's configuration.
    pub fn is_client_error(&self) -> bool {
        matches!(self, InjectError::PathParam { .. })
    }
}

/// Error when a required parameter has no provider.
#[derive(Debug)]
pub struct NotBoundError {
    /// The type that was requested
    pub requested: TypeKey,
    /// What required it, e.g. `user::Controller.get_by` (if known)
    pub required_by: Option<String>,
    /// Bound types with similar names
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotBoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No provider bound for: {}", self.requested)?;

        if let Some(ref target) = self.required_by {
            write!(f, "\n  Required by: {target}")?;
        }

        f.write_str(&render_suggestions(&self.suggestions))?;

        write!(
            f,
            "\n  Hint: Did you forget to call .bind::<{}>() or .bind_with()?",
            self.requested.short_name()
        )
    }
}

/// Convenient Result type for injection operations.
pub type Result<T> = std::result::Result<T, InjectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_bound_error_display() {
        let err = InjectError::NotBound(NotBoundError {
            requested: TypeKey::of::<String>(),
            required_by: Some("user::Controller.get_by".to_string()),
            suggestions: vec!["alloc::string::String".to_string()],
        });

        let msg = format!("{err}");
        assert!(msg.contains("No provider bound"));
        assert!(msg.contains("user::Controller.get_by"));
        assert!(msg.contains("Did you mean"));
        assert!(msg.contains(".bind::<String>()"));
    }

    #[test]
    fn path_param_error_is_client_error() {
        let err = InjectError::PathParam {
            name: "param0".to_string(),
            value: "abc".to_string(),
            target: TypeKey::of::<i64>(),
        };

        assert!(err.is_client_error());
        assert!(format!("{err}").contains("\"abc\""));
        assert!(!InjectError::MissingArgument { index: 1 }.is_client_error());
    }
}
