//! Mapping plans
//!
//! A [`MappingPlan`] is the precomputed recipe for turning an instance of one
//! registered type into an instance of another: how the destination is
//! materialized, and an ordered list of [`FieldBinding`]s, each pairing a
//! destination field with its source and a conversion [`Strategy`].
//!
//! Nested strategies name the destination type only. The plan for a nested
//! pair is looked up through the plan cache when the binding executes, keyed
//! on the runtime type of the source value, so self-referential and mutually
//! recursive type pairs resolve without eager deep construction.

mod cache;
mod resolver;

pub use cache::PlanCache;
pub use resolver::{PlanResolver, Resolution};

use std::fmt;
use std::sync::Arc;

use crate::convert::Conversion;
use crate::object::List;
use crate::rule::{FieldAction, MappingRule};
use crate::types::{ConstructorDescriptor, FieldKind, TypeKey};
use crate::value::Value;

/// How a single value is carried from source to destination
#[derive(Clone)]
pub enum Strategy {
    /// Assign the source value unchanged
    Direct,
    /// Primitive conversion through the conversion table
    Convert(Conversion),
    /// Map the source object through the plan for (runtime source type, `dest`)
    Nested(TypeKey),
    /// Map each element with the element strategy
    Collection {
        /// Destination element kind
        element: FieldKind,
        /// Strategy applied to each element; never `Custom`
        strategy: Box<Strategy>,
    },
    /// Compute the value with a rule's custom action
    ///
    /// Only ever the strategy of a whole binding.
    Custom(FieldAction),
}

impl Strategy {
    /// Short name, for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::Convert(_) => "convert",
            Strategy::Nested(_) => "nested",
            Strategy::Collection { .. } => "collection",
            Strategy::Custom(_) => "custom",
        }
    }

    /// Whether executing this strategy can create destination objects
    pub fn creates_objects(&self) -> bool {
        match self {
            Strategy::Nested(_) => true,
            Strategy::Collection { strategy, .. } => strategy.creates_objects(),
            _ => false,
        }
    }

    /// Value used for a null constructor argument bound with this strategy
    ///
    /// Collections get an empty list so the destination stays well-typed.
    pub(crate) fn null_argument(&self) -> Value {
        match self {
            Strategy::Collection { element, .. } => Value::List(List::empty(element.clone())),
            _ => Value::Null,
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Direct => f.write_str("Direct"),
            Strategy::Convert(conversion) => write!(
                f,
                "Convert({} -> {}, {})",
                conversion.from_kind(),
                conversion.to_kind(),
                conversion.semantics()
            ),
            Strategy::Nested(dest) => write!(f, "Nested({})", dest),
            Strategy::Collection { element, strategy } => {
                write!(f, "Collection({}, {:?})", element, strategy)
            }
            Strategy::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Source side of a binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceField {
    /// Field name in the source type
    pub name: Arc<str>,
    /// Field slot in the source type
    pub index: usize,
}

/// One destination field (or constructor argument) and how to fill it
#[derive(Debug, Clone)]
pub struct FieldBinding {
    pub(crate) dest_field: Arc<str>,
    pub(crate) dest_index: Option<usize>,
    pub(crate) source: Option<SourceField>,
    pub(crate) strategy: Strategy,
}

impl FieldBinding {
    /// Destination field or constructor parameter name
    pub fn dest_field(&self) -> &str {
        &self.dest_field
    }

    /// Destination slot
    ///
    /// `None` for bindings applied by name to a concrete type chosen at
    /// execution time, and for constructor parameters without a
    /// same-named field.
    pub fn dest_index(&self) -> Option<usize> {
        self.dest_index
    }

    /// Source field, absent for custom actions
    pub fn source(&self) -> Option<&SourceField> {
        self.source.as_ref()
    }

    /// Strategy
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }
}

/// How the destination instance comes into existence
#[derive(Debug, Clone)]
pub enum Materialize {
    /// Create a blank instance, then bind fields by mutation
    Blank,
    /// Build the instance from constructor arguments, then bind the
    /// remaining writable fields by mutation
    Constructor {
        /// Chosen constructor
        constructor: ConstructorDescriptor,
        /// One binding per constructor parameter, in parameter order
        arguments: Vec<FieldBinding>,
    },
    /// Instantiate the concrete type registered for the interface, then
    /// bind fields by name
    Polymorphic {
        /// Interface type key
        interface: TypeKey,
    },
}

impl Materialize {
    /// Short name, for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Materialize::Blank => "blank",
            Materialize::Constructor { .. } => "constructor",
            Materialize::Polymorphic { .. } => "polymorphic",
        }
    }
}

/// Cached recipe for mapping one type into another
#[derive(Debug, Clone)]
pub struct MappingPlan {
    pub(crate) source: TypeKey,
    pub(crate) dest: TypeKey,
    pub(crate) materialize: Materialize,
    pub(crate) bindings: Vec<FieldBinding>,
    pub(crate) rule: Option<Arc<MappingRule>>,
}

impl MappingPlan {
    /// Source type
    pub fn source(&self) -> &TypeKey {
        &self.source
    }

    /// Destination type
    pub fn dest(&self) -> &TypeKey {
        &self.dest
    }

    /// How the destination is materialized
    pub fn materialize(&self) -> &Materialize {
        &self.materialize
    }

    /// Mutation bindings in execution order
    pub fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }

    /// Get the mutation binding for a destination field
    pub fn binding(&self, dest_field: &str) -> Option<&FieldBinding> {
        self.bindings
            .iter()
            .find(|binding| &*binding.dest_field == dest_field)
    }

    /// Rule the plan was resolved with
    pub fn rule(&self) -> Option<&Arc<MappingRule>> {
        self.rule.as_ref()
    }
}
