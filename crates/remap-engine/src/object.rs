//! Object model
//!
//! Objects and lists are shared, interior-mutable containers. A mapping
//! destination can therefore be registered in the identity map and
//! referenced from a cycle while its own fields are still being populated.
//!
//! Reference cycles between objects are not reclaimed automatically;
//! call [`Object::clear`] on a member of the cycle to release it.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{MapError, MapResult};
use crate::types::{FieldKind, TypeDescriptor, TypeKey};
use crate::value::Value;

/// Shared object reference
pub type ObjectRef = Arc<Object>;

/// Shared list reference
pub type ListRef = Arc<List>;

/// Instance of a registered concrete type
pub struct Object {
    descriptor: Arc<TypeDescriptor>,
    fields: RwLock<Vec<Value>>,
}

impl Object {
    /// Create an instance with every field at its declared default
    pub(crate) fn blank(descriptor: Arc<TypeDescriptor>) -> ObjectRef {
        let fields = descriptor
            .fields()
            .iter()
            .map(|field| field.default.clone())
            .collect();
        Arc::new(Object {
            descriptor,
            fields: RwLock::new(fields),
        })
    }

    /// Type key of this instance
    pub fn type_key(&self) -> &TypeKey {
        self.descriptor.key()
    }

    /// Descriptor of this instance's type
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// Get number of fields
    pub fn field_count(&self) -> usize {
        self.descriptor.field_count()
    }

    /// Get a field value by name
    pub fn get(&self, name: &str) -> Option<Value> {
        let index = self.descriptor.field_index(name)?;
        self.get_index(index)
    }

    /// Get a field value by index
    pub fn get_index(&self, index: usize) -> Option<Value> {
        self.fields.read().get(index).cloned()
    }

    /// Set a field value by name
    ///
    /// The value must fit the field's declared kind. Writability is a
    /// mapping concern and is not enforced here.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> MapResult<()> {
        let value = value.into();
        let index = self
            .descriptor
            .field_index(name)
            .ok_or_else(|| MapError::UnknownField {
                key: self.type_key().clone(),
                field: name.to_string(),
            })?;
        let kind = &self.descriptor.fields()[index].kind;
        if !value.fits(kind) {
            return Err(MapError::mismatch(kind, value.kind_name()));
        }
        self.store(index, value);
        Ok(())
    }

    /// Store a value the executor already produced for this field's kind
    pub(crate) fn store(&self, index: usize, value: Value) {
        if let Some(slot) = self.fields.write().get_mut(index) {
            *slot = value;
        }
    }

    /// Reset every field to null
    ///
    /// Releases the references this object holds, breaking any cycle it
    /// is part of.
    pub fn clear(&self) {
        for slot in self.fields.write().iter_mut() {
            *slot = Value::Null;
        }
    }

    /// Identity of an object reference, stable while the reference lives
    pub fn identity(this: &ObjectRef) -> usize {
        Arc::as_ptr(this) as usize
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.fields.read();
        let mut s = f.debug_struct(self.type_key().as_str());
        for (field, value) in self.descriptor.fields().iter().zip(fields.iter()) {
            s.field(&field.name, value);
        }
        s.finish()
    }
}

/// Ordered collection with a declared element kind
pub struct List {
    element: FieldKind,
    items: RwLock<Vec<Value>>,
}

impl List {
    /// Create a list with the given items
    pub fn new(element: FieldKind, items: Vec<Value>) -> ListRef {
        Arc::new(List {
            element,
            items: RwLock::new(items),
        })
    }

    /// Create an empty list
    pub fn empty(element: FieldKind) -> ListRef {
        Self::new(element, Vec::new())
    }

    /// Declared element kind
    pub fn element_kind(&self) -> &FieldKind {
        &self.element
    }

    /// Get number of items
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Get an item by index
    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.read().get(index).cloned()
    }

    /// Snapshot of the items
    pub fn items(&self) -> Vec<Value> {
        self.items.read().clone()
    }

    /// Append an item, checking it against the element kind
    pub fn push(&self, value: impl Into<Value>) -> MapResult<()> {
        let value = value.into();
        if !value.fits(&self.element) {
            return Err(MapError::mismatch(&self.element, value.kind_name()));
        }
        self.items.write().push(value);
        Ok(())
    }

    /// Replace the item at `index`, or append when `index == len`
    pub(crate) fn put(&self, index: usize, value: Value) {
        let mut items = self.items.write();
        if index < items.len() {
            items[index] = value;
        } else {
            items.push(value);
        }
    }

    /// Drop every item at or after `len`
    pub(crate) fn truncate(&self, len: usize) {
        self.items.write().truncate(len);
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.read().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TypeDefinition, TypeRegistry};

    fn registry() -> TypeRegistry {
        TypeRegistry::new().with(
            TypeDefinition::class("Person")
                .field("Name", FieldKind::String)
                .field("Age", FieldKind::I32),
        )
    }

    #[test]
    fn test_object_set_and_get() {
        let obj = registry().instantiate(&"Person".into()).unwrap();
        assert_eq!(obj.field_count(), 2);
        assert_eq!(obj.get("Age"), Some(Value::I32(0)));

        obj.set("Name", "Alice").unwrap();
        obj.set("Age", 30).unwrap();
        assert_eq!(obj.get("Name"), Some(Value::from("Alice")));
        assert_eq!(obj.get_index(1), Some(Value::I32(30)));
    }

    #[test]
    fn test_object_set_checks_kind() {
        let obj = registry().instantiate(&"Person".into()).unwrap();
        let err = obj.set("Age", "thirty").unwrap_err();
        assert!(matches!(err, MapError::ValueKindMismatch { .. }));

        let err = obj.set("Email", "a@b").unwrap_err();
        assert!(matches!(err, MapError::UnknownField { .. }));
    }

    #[test]
    fn test_identity_distinguishes_equal_objects() {
        let registry = registry();
        let a = registry.instantiate(&"Person".into()).unwrap();
        let b = registry.instantiate(&"Person".into()).unwrap();
        assert_ne!(Object::identity(&a), Object::identity(&b));
        assert_eq!(Object::identity(&a), Object::identity(&a.clone()));
    }

    #[test]
    fn test_list_put_and_truncate() {
        let list = List::new(FieldKind::I32, vec![Value::I32(1), Value::I32(2)]);
        list.put(1, Value::I32(20));
        list.put(2, Value::I32(30));
        assert_eq!(list.items(), vec![Value::I32(1), Value::I32(20), Value::I32(30)]);

        list.truncate(1);
        assert_eq!(list.len(), 1);
        assert!(list.push("x").is_err());
    }
}
