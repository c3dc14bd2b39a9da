//! Mapping errors

use thiserror::Error;

use crate::types::TypeKey;

/// Errors that can occur while describing types, resolving plans, or
/// executing them.
///
/// Errors are `Clone` so that a failed plan resolution can be cached and
/// replayed to every later caller for the same type pair.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MapError {
    /// The type key was never registered
    #[error("Unknown type: {key}")]
    UnknownType {
        /// Key that was looked up
        key: TypeKey,
    },

    /// No blank instance can be created and no constructor's parameters can
    /// all be satisfied from the source
    #[error("No viable constructor to map {source_type} into {dest}")]
    NoViableConstructor {
        /// Source type
        source_type: TypeKey,
        /// Destination type
        dest: TypeKey,
    },

    /// The two kinds cannot be converted into one another
    #[error("Unsupported conversion: {from} -> {to}")]
    UnsupportedConversion {
        /// Source kind
        from: String,
        /// Destination kind
        to: String,
    },

    /// `map` was called with a null source
    #[error("Source value cannot be null")]
    NullSource,

    /// `map_into` was called with a null destination
    #[error("Destination value cannot be null")]
    NullDestination,

    /// An interface destination has no registered concrete implementation
    #[error("No concrete type registered for interface {interface}")]
    NoConcreteType {
        /// Interface type key
        interface: TypeKey,
    },

    /// A value does not fit the declared kind it is stored into or read as
    #[error("Value kind mismatch: expected {expected}, got {actual}")]
    ValueKindMismatch {
        /// Expected kind
        expected: String,
        /// Actual value kind
        actual: String,
    },

    /// The type has no field with this name
    #[error("Type {key} has no field {field}")]
    UnknownField {
        /// Type key
        key: TypeKey,
        /// Field name
        field: String,
    },

    /// A before/after hook or custom field action failed
    #[error("Hook failed: {message}")]
    Hook {
        /// Message reported by the hook
        message: String,
    },
}

impl MapError {
    /// Create a hook failure from any message
    pub fn hook(message: impl Into<String>) -> Self {
        MapError::Hook {
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(from: impl ToString, to: impl ToString) -> Self {
        MapError::UnsupportedConversion {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub(crate) fn mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        MapError::ValueKindMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Mapping result
pub type MapResult<T> = Result<T, MapError>;
