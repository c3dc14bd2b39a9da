//! Type catalog
//!
//! Explicit type descriptors used in place of runtime reflection:
//! - `kind`: type keys and the semantic kinds of fields
//! - `descriptor`: immutable per-type field and constructor catalogs
//! - `registry`: configuration-time definitions and the descriptor cache

mod descriptor;
mod kind;
mod registry;

pub use descriptor::{
    ConstructorDescriptor, FieldDescriptor, ParamDescriptor, TypeDescriptor, TypeRole,
};
pub use kind::{FieldKind, NumericKind, PrimitiveKind, TypeKey};
pub use registry::{TypeDefinition, TypeRegistry};
