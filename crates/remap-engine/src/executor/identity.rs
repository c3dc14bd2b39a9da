//! Identity map
//!
//! Per-call registry from source object identity to the destination object
//! produced for it. Keys are object addresses, not structural equality, so
//! two equal but distinct source objects map to two distinct destinations.
//!
//! Entries are also keyed by the planned destination type: one source object
//! reached through fields of different destination types yields one
//! destination per type.

use rustc_hash::FxHashMap;

use crate::object::{Object, ObjectRef};
use crate::types::TypeKey;

/// (source identity, destination type) → destination object, scoped to one
/// mapping call
#[derive(Debug, Default)]
pub struct IdentityMap {
    /// The source reference is held alongside the destination so its
    /// address cannot be reused while the map is alive
    entries: FxHashMap<(usize, TypeKey), (ObjectRef, ObjectRef)>,
}

impl IdentityMap {
    /// Create an empty identity map
    pub fn new() -> Self {
        Self::default()
    }

    /// Destination of type `dest_type` already produced for this source
    /// object
    pub fn get(&self, source: &ObjectRef, dest_type: &TypeKey) -> Option<ObjectRef> {
        self.entries
            .get(&(Object::identity(source), dest_type.clone()))
            .map(|(_, dest)| dest.clone())
    }

    /// Record the destination produced for a source object
    ///
    /// `dest_type` is the planned destination type, which for interface
    /// destinations differs from the concrete type of `dest`.
    pub fn register(&mut self, source: &ObjectRef, dest_type: &TypeKey, dest: ObjectRef) {
        self.entries
            .insert((Object::identity(source), dest_type.clone()), (source.clone(), dest));
    }

    /// Number of registered (source, destination type) entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
