//! Mapper facade
//!
//! [`Mapper`] is the entry point of the engine. It owns the process-wide
//! state shared by every mapping call: the type registry with its descriptor
//! cache, the rule and interface-implementation lookups, and the plan cache.
//! Both caches start empty and fill lazily; entries are never evicted.
//! Cloning a `Mapper` shares that state.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::MapperConfig;
use crate::convert::ConversionTable;
use crate::error::{MapError, MapResult};
use crate::executor::MapContext;
use crate::object::{List, ListRef, ObjectRef};
use crate::plan::{MappingPlan, PlanCache, PlanResolver, Strategy};
use crate::polymorphic::{ConcreteTypeResolver, InterfaceImplementations};
use crate::rule::{RuleSource, RuleTable};
use crate::types::{FieldKind, PrimitiveKind, TypeKey, TypeRegistry};
use crate::value::Value;

struct Shared {
    registry: Arc<TypeRegistry>,
    rules: Arc<dyn RuleSource>,
    implementations: Arc<dyn ConcreteTypeResolver>,
    config: MapperConfig,
    plans: PlanCache,
    /// Pairs resolved, nested pairs included
    resolutions: AtomicUsize,
}

/// Object mapper with shared, lazily populated caches
///
/// Thread-safe: any number of threads may map through one `Mapper` (or
/// its clones) concurrently. Each call gets its own identity map and depth
/// counter.
#[derive(Clone)]
pub struct Mapper {
    shared: Arc<Shared>,
}

/// Builder for [`Mapper`]
pub struct MapperBuilder {
    registry: Arc<TypeRegistry>,
    rules: Arc<dyn RuleSource>,
    implementations: Arc<dyn ConcreteTypeResolver>,
    config: MapperConfig,
}

impl MapperBuilder {
    /// Use a rule source (default: no rules)
    pub fn rules(mut self, rules: impl RuleSource + 'static) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    /// Use an interface implementation lookup (default: none registered)
    pub fn implementations(mut self, implementations: impl ConcreteTypeResolver + 'static) -> Self {
        self.implementations = Arc::new(implementations);
        self
    }

    /// Use a configuration (default: [`MapperConfig::default`])
    pub fn config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the mapper
    pub fn build(self) -> Mapper {
        Mapper {
            shared: Arc::new(Shared {
                registry: self.registry,
                rules: self.rules,
                implementations: self.implementations,
                config: self.config,
                plans: PlanCache::new(),
                resolutions: AtomicUsize::new(0),
            }),
        }
    }
}

impl Mapper {
    /// Start building a mapper over a type registry
    pub fn builder(registry: impl Into<Arc<TypeRegistry>>) -> MapperBuilder {
        MapperBuilder {
            registry: registry.into(),
            rules: Arc::new(RuleTable::new()),
            implementations: Arc::new(InterfaceImplementations::new()),
            config: MapperConfig::default(),
        }
    }

    /// Create a mapper with no rules, no interface implementations and the
    /// default configuration
    pub fn new(registry: impl Into<Arc<TypeRegistry>>) -> Self {
        Self::builder(registry).build()
    }

    /// Type registry
    pub fn registry(&self) -> &TypeRegistry {
        &self.shared.registry
    }

    /// Configuration
    pub fn config(&self) -> &MapperConfig {
        &self.shared.config
    }

    /// Create a blank instance of a registered concrete type
    pub fn instantiate(&self, key: &TypeKey) -> MapResult<ObjectRef> {
        self.shared.registry.instantiate(key)
    }

    /// Get the plan for mapping `source` into `dest`, resolving it on first use
    ///
    /// Resolution failures are cached: later calls for the pair fail fast
    /// with the same error. Nested pairs settled while resolving this one
    /// are cached as well.
    pub fn plan(&self, source: &TypeKey, dest: &TypeKey) -> MapResult<Arc<MappingPlan>> {
        let shared = &*self.shared;
        shared.plans.get_or_build(source, dest, || {
            let resolution = PlanResolver::new(&shared.registry, &*shared.rules)
                .with_cache(&shared.plans)
                .resolve_all(source, dest);
            shared.resolutions.fetch_add(resolution.passes, Ordering::Relaxed);
            for ((nested_source, nested_dest), plan) in resolution.nested {
                shared.plans.seed(&nested_source, &nested_dest, plan);
            }
            resolution.plan
        })
    }

    /// Number of type pairs resolved so far, nested pairs included
    pub fn plan_builds(&self) -> usize {
        self.shared.resolutions.load(Ordering::Relaxed)
    }

    pub(crate) fn resolve_concrete(&self, interface: &TypeKey) -> MapResult<TypeKey> {
        self.shared
            .implementations
            .resolve_concrete(interface)
            .ok_or_else(|| MapError::NoConcreteType {
                interface: interface.clone(),
            })
    }

    fn context_for(&self, plan: &MappingPlan) -> MapContext<'_> {
        let max_depth = plan
            .rule()
            .and_then(|rule| rule.max_depth())
            .unwrap_or(self.shared.config.default_max_depth);
        MapContext::new(self, max_depth)
    }

    /// Map a source object into a new instance of `dest`
    ///
    /// Use [`Mapper::map_collection`] for lists.
    pub fn map(&self, source: &Value, dest: &TypeKey) -> MapResult<Value> {
        let source = match source {
            Value::Null => return Err(MapError::NullSource),
            Value::Object(object) => object,
            other => return Err(MapError::unsupported(other.kind_name(), dest)),
        };
        let plan = self.plan(source.type_key(), dest)?;
        let mapped = self.context_for(&plan).execute(&plan, source, None)?;
        Ok(mapped.map_or(Value::Null, Value::Object))
    }

    /// Map a source onto an existing destination, mutating it in place
    ///
    /// Objects map onto objects and lists onto lists. Returns the
    /// destination.
    pub fn map_into(&self, source: &Value, dest: &Value) -> MapResult<Value> {
        match (source, dest) {
            (Value::Null, _) => Err(MapError::NullSource),
            (_, Value::Null) => Err(MapError::NullDestination),
            (Value::Object(source), Value::Object(dest)) => {
                let plan = self.plan(source.type_key(), dest.type_key())?;
                self.context_for(&plan)
                    .execute(&plan, source, Some(dest.clone()))?;
                Ok(Value::Object(dest.clone()))
            }
            (Value::List(_), Value::List(dest)) => self.map_collection_into(source, dest),
            (source, dest) => Err(MapError::unsupported(source.kind_name(), dest.kind_name())),
        }
    }

    /// Map each source into a new instance of `dest`, lazily and in order
    ///
    /// Every element is an independent call with its own identity map.
    pub fn map_many<'a, I>(&'a self, sources: I, dest: &'a TypeKey) -> impl Iterator<Item = MapResult<Value>> + 'a
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'a,
    {
        sources.into_iter().map(move |source| self.map(&source, dest))
    }

    /// Map a list (or null) into a new list of kind `dest`
    ///
    /// A null source yields an empty list.
    pub fn map_collection(&self, source: &Value, dest: &FieldKind) -> MapResult<Value> {
        let FieldKind::Collection(dest_element) = dest else {
            return Err(MapError::unsupported(source.kind_name(), dest));
        };
        match source {
            Value::Null => Ok(Value::List(List::empty((**dest_element).clone()))),
            Value::List(list) => self.run_collection(list, dest, None),
            other => Err(MapError::unsupported(other.kind_name(), dest)),
        }
    }

    /// Map a list (or null) onto an existing list, adjusting its length
    ///
    /// A null source empties the destination.
    pub fn map_collection_into(&self, source: &Value, dest: &ListRef) -> MapResult<Value> {
        let dest_kind = FieldKind::collection(dest.element_kind().clone());
        match source {
            Value::Null => {
                dest.truncate(0);
                Ok(Value::List(dest.clone()))
            }
            Value::List(list) => self.run_collection(list, &dest_kind, Some(dest.clone())),
            other => Err(MapError::unsupported(other.kind_name(), dest_kind)),
        }
    }

    fn run_collection(&self, source: &ListRef, dest: &FieldKind, existing: Option<ListRef>) -> MapResult<Value> {
        let source_kind = FieldKind::collection(source.element_kind().clone());
        let strategy = PlanResolver::new(&self.shared.registry, &*self.shared.rules)
            .with_cache(&self.shared.plans)
            .strategy(&source_kind, dest)?;
        let Strategy::Collection { element, strategy } = strategy else {
            return Err(MapError::unsupported(source_kind, dest));
        };
        let mut context = MapContext::new(self, self.shared.config.default_max_depth);
        let list = context.map_list(source, &element, &strategy, existing)?;
        Ok(Value::List(list))
    }

    /// Convert a primitive value to another primitive kind
    pub fn convert_primitive(&self, value: &Value, to: PrimitiveKind) -> MapResult<Value> {
        let from = match value {
            Value::Bool(_) => PrimitiveKind::Boolean,
            Value::String(_) => PrimitiveKind::String,
            other => other
                .numeric_kind()
                .map(PrimitiveKind::Numeric)
                .ok_or_else(|| MapError::unsupported(other.kind_name(), to))?,
        };
        ConversionTable::convert(from, to, value)
    }
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("registry", &self.shared.registry)
            .field("config", &self.shared.config)
            .field("plans", &self.shared.plans)
            .field("resolutions", &self.plan_builds())
            .finish()
    }
}
