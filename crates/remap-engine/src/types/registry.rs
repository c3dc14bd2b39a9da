//! Type registry
//!
//! Types are registered explicitly at configuration time as
//! [`TypeDefinition`]s. The registry turns a definition into an immutable
//! [`TypeDescriptor`] lazily, on first reference, and keeps it for the life
//! of the registry. Descriptor construction runs at most once per key even
//! when many threads ask for the same type concurrently.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use rustc_hash::FxHashSet;

use super::descriptor::{
    ConstructorDescriptor, FieldDescriptor, ParamDescriptor, TypeDescriptor, TypeRole,
};
use super::{FieldKind, TypeKey};
use crate::error::{MapError, MapResult};
use crate::object::{Object, ObjectRef};
use crate::value::Value;

/// Configuration-time declaration of a type's shape
#[derive(Debug, Clone)]
pub struct TypeDefinition {
    key: TypeKey,
    role: TypeRole,
    record: bool,
    fields: Vec<FieldDescriptor>,
    constructors: Vec<ConstructorDescriptor>,
    extends: Vec<TypeKey>,
}

impl TypeDefinition {
    fn new(key: impl Into<TypeKey>, role: TypeRole, record: bool) -> Self {
        Self {
            key: key.into(),
            role,
            record,
            fields: Vec::new(),
            constructors: Vec::new(),
            extends: Vec::new(),
        }
    }

    /// A mutable class: fields are readable and writable unless declared
    /// otherwise; blank-constructible unless only parameterized
    /// constructors are declared
    pub fn class(key: impl Into<TypeKey>) -> Self {
        Self::new(key, TypeRole::Class, false)
    }

    /// An immutable record: every field is read-only and a constructor
    /// taking all fields in declaration order is declared implicitly
    pub fn record(key: impl Into<TypeKey>) -> Self {
        Self::new(key, TypeRole::Class, true)
    }

    /// An interface: every field is readable and writable; instances are
    /// created through a registered concrete implementation
    pub fn interface(key: impl Into<TypeKey>) -> Self {
        Self::new(key, TypeRole::Interface, false)
    }

    /// Type key
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    fn push_field(mut self, name: &str, kind: FieldKind, writable: bool, default: Value) -> Self {
        self.fields.push(FieldDescriptor {
            name: Arc::from(name),
            kind,
            readable: true,
            writable,
            default,
        });
        self
    }

    /// Add a readable and writable field
    pub fn field(self, name: &str, kind: FieldKind) -> Self {
        let default = Value::default_for(&kind);
        self.push_field(name, kind, true, default)
    }

    /// Add a readable and writable field with a non-default initial value
    pub fn field_with_default(self, name: &str, kind: FieldKind, default: impl Into<Value>) -> Self {
        self.push_field(name, kind, true, default.into())
    }

    /// Add a read-only field
    pub fn readonly(self, name: &str, kind: FieldKind) -> Self {
        let default = Value::default_for(&kind);
        self.push_field(name, kind, false, default)
    }

    /// Add a field with a writer but no reader
    pub fn write_only(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.push(FieldDescriptor {
            name: Arc::from(name),
            default: Value::default_for(&kind),
            kind,
            readable: false,
            writable: true,
        });
        self
    }

    /// Declare a constructor with the given ordered parameters
    pub fn constructor(mut self, params: &[(&str, FieldKind)]) -> Self {
        self.constructors.push(ConstructorDescriptor {
            params: params
                .iter()
                .map(|(name, kind)| ParamDescriptor {
                    name: Arc::from(*name),
                    kind: kind.clone(),
                })
                .collect(),
        });
        self
    }

    /// Declare a zero-parameter constructor
    pub fn default_constructor(self) -> Self {
        self.constructor(&[])
    }

    /// Extend another interface
    pub fn extends(mut self, key: impl Into<TypeKey>) -> Self {
        self.extends.push(key.into());
        self
    }

    fn finish(mut self) -> Self {
        if self.record {
            for field in &mut self.fields {
                field.writable = false;
            }
            let primary = ConstructorDescriptor {
                params: self
                    .fields
                    .iter()
                    .map(|field| ParamDescriptor {
                        name: field.name.clone(),
                        kind: field.kind.clone(),
                    })
                    .collect(),
            };
            self.constructors.insert(0, primary);
            self.record = false;
        }
        if self.role == TypeRole::Interface {
            for field in &mut self.fields {
                field.readable = true;
                field.writable = true;
            }
        }
        self
    }
}

type DescriptorCell = Arc<OnceCell<MapResult<Arc<TypeDescriptor>>>>;

/// Registry of type definitions with a lazily populated descriptor cache
///
/// Thread-safe; intended to be populated once at startup and shared.
#[derive(Default)]
pub struct TypeRegistry {
    definitions: DashMap<TypeKey, Arc<TypeDefinition>>,
    descriptors: DashMap<TypeKey, DescriptorCell>,
}

impl TypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type definition
    ///
    /// Re-registering a key replaces the definition, but a descriptor that
    /// was already built for it stays cached.
    pub fn register(&self, definition: TypeDefinition) {
        let definition = definition.finish();
        self.definitions
            .insert(definition.key.clone(), Arc::new(definition));
    }

    /// Register a type definition, builder style
    pub fn with(self, definition: TypeDefinition) -> Self {
        self.register(definition);
        self
    }

    /// Check if a type is registered
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.definitions.contains_key(key)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Number of descriptors built so far
    pub fn described_count(&self) -> usize {
        self.descriptors
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    fn definition(&self, key: &TypeKey) -> MapResult<Arc<TypeDefinition>> {
        self.definitions
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| MapError::UnknownType { key: key.clone() })
    }

    /// Get the descriptor of a registered type, building it on first use
    pub fn describe(&self, key: &TypeKey) -> MapResult<Arc<TypeDescriptor>> {
        // unregistered keys are not cached so a later registration still works
        let definition = self.definition(key)?;
        let cell = self
            .descriptors
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .value()
            .clone();
        cell.get_or_init(|| self.build_descriptor(&definition).map(Arc::new))
            .clone()
    }

    fn build_descriptor(&self, definition: &TypeDefinition) -> MapResult<TypeDescriptor> {
        let fields = match definition.role {
            TypeRole::Class => definition.fields.clone(),
            TypeRole::Interface => self.aggregate_interface_fields(definition)?,
        };
        tracing::debug!(
            type_key = %definition.key,
            fields = fields.len(),
            constructors = definition.constructors.len(),
            "built type descriptor"
        );
        Ok(TypeDescriptor::new(
            definition.key.clone(),
            definition.role,
            fields,
            definition.constructors.clone(),
            definition.extends.clone(),
        ))
    }

    /// Own fields first, then inherited interface fields breadth-first;
    /// the first field with a given name wins
    fn aggregate_interface_fields(
        &self,
        definition: &TypeDefinition,
    ) -> MapResult<Vec<FieldDescriptor>> {
        let mut fields = definition.fields.clone();
        let mut seen_names: FxHashSet<Arc<str>> =
            fields.iter().map(|field| field.name.clone()).collect();
        let mut visited: FxHashSet<TypeKey> = FxHashSet::default();
        visited.insert(definition.key.clone());

        let mut queue: VecDeque<TypeKey> = definition.extends.iter().cloned().collect();
        while let Some(parent_key) = queue.pop_front() {
            if !visited.insert(parent_key.clone()) {
                continue;
            }
            let parent = self.definition(&parent_key)?;
            for field in &parent.fields {
                if seen_names.insert(field.name.clone()) {
                    fields.push(field.clone());
                }
            }
            queue.extend(parent.extends.iter().cloned());
        }
        Ok(fields)
    }

    /// Create a blank instance of a concrete type
    ///
    /// Every field starts at its declared default, regardless of whether
    /// the type is blank-constructible for mapping purposes.
    pub fn instantiate(&self, key: &TypeKey) -> MapResult<ObjectRef> {
        let descriptor = self.describe(key)?;
        if descriptor.is_interface() {
            return Err(MapError::NoConcreteType {
                interface: key.clone(),
            });
        }
        Ok(Object::blank(descriptor))
    }

    /// Create an instance of a concrete type with the given field values
    pub fn build<'a, I>(&self, key: &TypeKey, values: I) -> MapResult<ObjectRef>
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let object = self.instantiate(key)?;
        for (name, value) in values {
            object.set(name, value)?;
        }
        Ok(object)
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("definitions", &self.definitions.len())
            .field("descriptors", &self.descriptors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_definition() {
        let registry = TypeRegistry::new().with(
            TypeDefinition::record("PointTo")
                .field("X", FieldKind::I16)
                .field("Y", FieldKind::I16),
        );

        let desc = registry.describe(&"PointTo".into()).unwrap();
        assert!(!desc.is_blank_constructible());
        assert_eq!(desc.constructors().len(), 1);
        assert_eq!(desc.constructors()[0].arity(), 2);
        assert!(desc.fields().iter().all(|f| f.readable && !f.writable));
    }

    #[test]
    fn test_describe_is_cached() {
        let registry = TypeRegistry::new().with(TypeDefinition::class("A").field("X", FieldKind::I32));

        let first = registry.describe(&"A".into()).unwrap();
        let second = registry.describe(&"A".into()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.described_count(), 1);
    }

    #[test]
    fn test_unknown_type_not_cached() {
        let registry = TypeRegistry::new();
        let key = TypeKey::new("Late");

        assert_eq!(
            registry.describe(&key).unwrap_err(),
            MapError::UnknownType { key: key.clone() }
        );

        registry.register(TypeDefinition::class("Late").field("X", FieldKind::I32));
        assert!(registry.describe(&key).is_ok());
    }

    #[test]
    fn test_interface_aggregate_fields() {
        let registry = TypeRegistry::new()
            .with(
                TypeDefinition::interface("IBase")
                    .field("Id", FieldKind::I64)
                    .field("Name", FieldKind::I32),
            )
            .with(
                TypeDefinition::interface("INamed")
                    .field("Name", FieldKind::String)
                    .extends("IBase"),
            )
            .with(
                TypeDefinition::interface("IShape")
                    .field("Area", FieldKind::F64)
                    .extends("INamed")
                    .extends("IBase"),
            );

        let desc = registry.describe(&"IShape".into()).unwrap();
        let names: Vec<&str> = desc.fields().iter().map(|f| &*f.name).collect();
        assert_eq!(names, vec!["Area", "Name", "Id"]);
        // first occurrence wins: INamed is visited before IBase
        assert_eq!(desc.field("Name").unwrap().kind, FieldKind::String);
        assert!(desc.is_interface());
    }

    #[test]
    fn test_instantiate_interface_fails() {
        let registry = TypeRegistry::new().with(TypeDefinition::interface("I"));
        assert!(matches!(
            registry.instantiate(&"I".into()),
            Err(MapError::NoConcreteType { .. })
        ));
    }

    #[test]
    fn test_build_object() {
        let registry = TypeRegistry::new().with(
            TypeDefinition::class("P")
                .field("X", FieldKind::I32)
                .field_with_default("Name", FieldKind::String, "none"),
        );

        let obj = registry
            .build(&"P".into(), [("X", Value::I32(7))])
            .unwrap();
        assert_eq!(obj.get("X"), Some(Value::I32(7)));
        assert_eq!(obj.get("Name"), Some(Value::from("none")));
    }
}
