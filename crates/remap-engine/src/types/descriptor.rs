//! Type descriptors
//!
//! A `TypeDescriptor` is the immutable catalog of a registered type's
//! constructible shape: its ordered fields with their kinds and access
//! flags, and the constructors that can build an instance. The mapping core
//! only ever works against descriptors, never against live type metadata.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{FieldKind, TypeKey};
use crate::value::Value;

/// Whether a type can be instantiated directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRole {
    /// Concrete type with fields and constructors
    Class,
    /// Interface; realized through a registered concrete type
    Interface,
}

/// A single field of a type
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Field name
    pub name: Arc<str>,
    /// Field kind
    pub kind: FieldKind,
    /// Whether the field can be read (eligible mapping source)
    pub readable: bool,
    /// Whether the field can be written (eligible mutation destination)
    pub writable: bool,
    /// Value a blank instance starts with
    pub default: Value,
}

/// A constructor parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    /// Parameter name, matched case-sensitively against source field names
    pub name: Arc<str>,
    /// Parameter kind
    pub kind: FieldKind,
}

/// A constructor: builds an instance from an ordered argument list
///
/// Each argument is stored into the same-named field of a blank instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDescriptor {
    /// Ordered parameters
    pub params: Vec<ParamDescriptor>,
}

impl ConstructorDescriptor {
    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Immutable descriptor of a registered type
#[derive(Debug)]
pub struct TypeDescriptor {
    pub(crate) key: TypeKey,
    pub(crate) role: TypeRole,
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) field_indices: FxHashMap<Arc<str>, usize>,
    /// Ordered fewest-parameters-first
    pub(crate) constructors: Vec<ConstructorDescriptor>,
    pub(crate) extends: Vec<TypeKey>,
}

impl TypeDescriptor {
    pub(crate) fn new(
        key: TypeKey,
        role: TypeRole,
        fields: Vec<FieldDescriptor>,
        mut constructors: Vec<ConstructorDescriptor>,
        extends: Vec<TypeKey>,
    ) -> Self {
        let field_indices = fields
            .iter()
            .enumerate()
            .map(|(index, field)| (field.name.clone(), index))
            .collect();
        // stable: equal arity keeps declaration order
        constructors.sort_by_key(ConstructorDescriptor::arity);
        Self {
            key,
            role,
            fields,
            field_indices,
            constructors,
            extends,
        }
    }

    /// Type key
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Type role
    pub fn role(&self) -> TypeRole {
        self.role
    }

    /// Whether this descriptor describes an interface
    pub fn is_interface(&self) -> bool {
        self.role == TypeRole::Interface
    }

    /// Fields in declaration order
    ///
    /// For interfaces this is the aggregate set including inherited fields.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Number of fields
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Get a field index by name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_indices.get(name).copied()
    }

    /// Get a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.field_index(name).map(|index| &self.fields[index])
    }

    /// Get a readable field and its index by name
    pub fn readable_field(&self, name: &str) -> Option<(usize, &FieldDescriptor)> {
        let index = self.field_index(name)?;
        let field = &self.fields[index];
        field.readable.then_some((index, field))
    }

    /// Fields eligible as mutation destinations, with their indices
    pub fn writable_fields(&self) -> impl Iterator<Item = (usize, &FieldDescriptor)> + '_ {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, field)| field.readable && field.writable)
    }

    /// Constructor candidates, fewest parameters first
    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    /// Directly extended interfaces
    pub fn extends(&self) -> &[TypeKey] {
        &self.extends
    }

    /// Whether a blank instance can be created without arguments
    ///
    /// True when a zero-parameter constructor is declared, or when no
    /// constructor is declared and at least one field is writable.
    pub fn is_blank_constructible(&self) -> bool {
        if self.is_interface() {
            return false;
        }
        if self.constructors.is_empty() {
            return self.writable_fields().next().is_some();
        }
        self.constructors.iter().any(|ctor| ctor.params.is_empty())
    }
}
