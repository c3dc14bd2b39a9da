//! Remap Object Mapping Engine
//!
//! This crate maps values of one registered type into another:
//! - Type catalog (explicitly registered descriptors instead of reflection)
//! - Plan resolution (field matching, constructor choice, conversion strategies)
//! - Cached plan execution with an identity map and a depth limit, so cyclic
//!   and unbounded source graphs terminate
//! - Primitive conversion table (widening, wrapping narrowing, stringification)
//!
//! ```ignore
//! let registry = TypeRegistry::new()
//!     .with(TypeDefinition::class("PointFrom").field("X", FieldKind::I32).field("Y", FieldKind::I32))
//!     .with(TypeDefinition::record("PointTo").field("X", FieldKind::I16).field("Y", FieldKind::I16));
//! let mapper = Mapper::new(registry);
//! let point = mapper.registry().build(&"PointFrom".into(), [("X", Value::I32(1)), ("Y", Value::I32(2))])?;
//! let mapped = mapper.map(&Value::Object(point), &"PointTo".into())?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod convert;
pub mod error;
pub mod executor;
pub mod object;
pub mod plan;
pub mod polymorphic;
pub mod rule;
pub mod types;
pub mod value;

mod mapper;

pub use config::{ConfigError, MapperConfig, DEFAULT_MAX_DEPTH};
pub use convert::{Conversion, ConversionSemantics, ConversionTable};
pub use error::{MapError, MapResult};
pub use executor::IdentityMap;
pub use mapper::{Mapper, MapperBuilder};
pub use object::{List, ListRef, Object, ObjectRef};
pub use plan::{FieldBinding, MappingPlan, Materialize, PlanCache, PlanResolver, Resolution, SourceField, Strategy};
pub use polymorphic::{ConcreteTypeResolver, InterfaceImplementations};
pub use rule::{FieldAction, MapHook, MappingRule, MappingRuleBuilder, RuleSource, RuleTable};
pub use types::{
    ConstructorDescriptor, FieldDescriptor, FieldKind, NumericKind, ParamDescriptor, PrimitiveKind,
    TypeDefinition, TypeDescriptor, TypeKey, TypeRegistry, TypeRole,
};
pub use value::Value;
