//! Concrete types for interface destinations
//!
//! An interface-typed destination is realized through a concrete type the
//! caller registers up front; no type is ever synthesized at runtime.

use rustc_hash::FxHashMap;

use crate::types::TypeKey;

/// Lookup of the concrete type that realizes an interface
pub trait ConcreteTypeResolver: Send + Sync {
    /// Concrete type for the interface, or `None` if none is registered
    fn resolve_concrete(&self, interface: &TypeKey) -> Option<TypeKey>;
}

/// Registry of interface implementations
#[derive(Debug, Default, Clone)]
pub struct InterfaceImplementations {
    implementations: FxHashMap<TypeKey, TypeKey>,
}

impl InterfaceImplementations {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the concrete type for an interface, replacing any previous one
    pub fn register(&mut self, interface: impl Into<TypeKey>, concrete: impl Into<TypeKey>) {
        self.implementations.insert(interface.into(), concrete.into());
    }

    /// Register the concrete type for an interface, builder style
    pub fn with(mut self, interface: impl Into<TypeKey>, concrete: impl Into<TypeKey>) -> Self {
        self.register(interface, concrete);
        self
    }

    /// Number of registered implementations
    pub fn len(&self) -> usize {
        self.implementations.len()
    }

    /// Check if no implementation is registered
    pub fn is_empty(&self) -> bool {
        self.implementations.is_empty()
    }
}

impl ConcreteTypeResolver for InterfaceImplementations {
    fn resolve_concrete(&self, interface: &TypeKey) -> Option<TypeKey> {
        self.implementations.get(interface).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_concrete() {
        let implementations = InterfaceImplementations::new()
            .with("IShape", "Circle")
            .with("IShape", "Square");

        assert_eq!(implementations.len(), 1);
        assert_eq!(
            implementations.resolve_concrete(&"IShape".into()),
            Some(TypeKey::new("Square"))
        );
        assert_eq!(implementations.resolve_concrete(&"INamed".into()), None);
    }
}
