//! Plan resolver
//!
//! Builds a [`MappingPlan`] for a (source, destination) type pair from the
//! two type descriptors, the conversion table and the pair's rule.
//!
//! Nested pairs are resolved for their viability verdict, and the plans
//! built along the way are handed back so the caller can cache them; the
//! executor still looks nested plans up lazily by runtime source type.
//!
//! Every pair is resolved at most once per resolution. A pair already on
//! the resolution stack is assumed viable, which makes self-referential and
//! mutually recursive shapes terminate. A verdict that rests on such an
//! assumption stays provisional until the assumed pair settles: it becomes
//! final if that pair resolves, and is discarded if it fails. Failures are
//! always final, since an assumption can only make a pair look more viable.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{FieldBinding, MappingPlan, Materialize, PlanCache, SourceField, Strategy};
use crate::convert::ConversionTable;
use crate::error::{MapError, MapResult};
use crate::rule::{MappingRule, RuleSource};
use crate::types::{FieldKind, TypeDescriptor, TypeKey, TypeRegistry};

type Pair = (TypeKey, TypeKey);

/// A plan resolved for one pair, with every nested pair settled on the way
#[derive(Debug)]
pub struct Resolution {
    /// Plan for the requested pair
    pub plan: MapResult<MappingPlan>,
    /// Nested pairs resolved while checking the requested one
    pub nested: Vec<((TypeKey, TypeKey), MapResult<MappingPlan>)>,
    /// Number of pairs resolved, the requested one included
    pub passes: usize,
}

struct Settled {
    plan: MapResult<MappingPlan>,
    /// Lowest stack slot the verdict assumed viable; `None` once final
    assumes: Option<usize>,
}

impl Settled {
    fn verdict(&self) -> MapResult<()> {
        self.plan.as_ref().map(|_| ()).map_err(Clone::clone)
    }
}

/// Per-resolution working state
#[derive(Default)]
struct ResolveState {
    stack: Vec<Pair>,
    /// Lowest stack slot each frame depends on, parallel to `stack`
    lows: Vec<usize>,
    settled: FxHashMap<Pair, Settled>,
    passes: usize,
}

impl ResolveState {
    fn depend_on(&mut self, slot: usize) {
        if let Some(low) = self.lows.last_mut() {
            *low = (*low).min(slot);
        }
    }
}

/// Resolves mapping plans against a type registry and rule source
pub struct PlanResolver<'a> {
    registry: &'a TypeRegistry,
    rules: &'a dyn RuleSource,
    cache: Option<&'a PlanCache>,
}

impl<'a> PlanResolver<'a> {
    /// Create a resolver
    pub fn new(registry: &'a TypeRegistry, rules: &'a dyn RuleSource) -> Self {
        Self {
            registry,
            rules,
            cache: None,
        }
    }

    /// Reuse verdicts already completed in `cache` instead of resolving
    /// those pairs again
    pub fn with_cache(mut self, cache: &'a PlanCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Resolve the plan for mapping `source` into `dest`
    pub fn resolve(&self, source: &TypeKey, dest: &TypeKey) -> MapResult<MappingPlan> {
        self.resolve_all(source, dest).plan
    }

    /// Resolve the plan for mapping `source` into `dest`, keeping the plans
    /// of the nested pairs settled along the way
    pub fn resolve_all(&self, source: &TypeKey, dest: &TypeKey) -> Resolution {
        let mut state = ResolveState::default();
        let pair = (source.clone(), dest.clone());
        let plan = self.settle(&pair, &mut state).plan;
        if let Ok(plan) = &plan {
            tracing::debug!(
                source = %source,
                dest = %dest,
                materialize = plan.materialize.name(),
                bindings = plan.bindings.len(),
                nested = plan.bindings.iter().filter(|b| b.strategy.creates_objects()).count(),
                custom = plan.bindings.iter().filter(|b| matches!(b.strategy, Strategy::Custom(_))).count(),
                passes = state.passes,
                "resolved mapping plan"
            );
        }

        let nested = state
            .settled
            .into_iter()
            .filter(|(_, settled)| settled.assumes.is_none())
            .map(|(pair, settled)| (pair, settled.plan))
            .collect();
        Resolution {
            plan,
            nested,
            passes: state.passes,
        }
    }

    /// Choose the strategy for carrying a value of kind `source` into a
    /// destination of kind `dest`
    pub fn strategy(&self, source: &FieldKind, dest: &FieldKind) -> MapResult<Strategy> {
        self.strategy_on(source, dest, &mut ResolveState::default())
    }

    /// Resolve one pair on top of the stack
    fn settle(&self, pair: &Pair, state: &mut ResolveState) -> Settled {
        let slot = state.stack.len();
        state.passes += 1;
        state.stack.push(pair.clone());
        state.lows.push(slot);

        let plan = self.resolve_on(&pair.0, &pair.1, state);

        state.stack.pop();
        let low = state.lows.pop().unwrap_or(slot);
        let viable = plan.is_ok();

        // verdicts that assumed this pair viable
        if viable {
            let carried = (low < slot).then_some(low);
            for settled in state.settled.values_mut() {
                if settled.assumes == Some(slot) {
                    settled.assumes = carried;
                }
            }
        } else {
            state.settled.retain(|_, settled| settled.assumes != Some(slot));
        }

        let assumes = (viable && low < slot).then_some(low);
        if let Some(low) = assumes {
            state.depend_on(low);
        }
        Settled { plan, assumes }
    }

    fn resolve_on(&self, source: &TypeKey, dest: &TypeKey, state: &mut ResolveState) -> MapResult<MappingPlan> {
        let src = self.registry.describe(source)?;
        let dst = self.registry.describe(dest)?;
        let rule = self.rules.resolve_rule(source, dest);
        let rule_ref = rule.as_deref();

        let mut bindings = self.bind_fields(&src, &dst, rule_ref, state);
        let materialize = if dst.is_interface() {
            Materialize::Polymorphic {
                interface: dest.clone(),
            }
        } else if dst.is_blank_constructible() {
            Materialize::Blank
        } else {
            let materialize = self.choose_constructor(&src, &dst, rule_ref, state)?;
            if let Materialize::Constructor { constructor, .. } = &materialize {
                bindings.retain(|binding| {
                    !constructor
                        .params
                        .iter()
                        .any(|param| param.name == binding.dest_field)
                });
            }
            materialize
        };

        Ok(MappingPlan {
            source: source.clone(),
            dest: dest.clone(),
            materialize,
            bindings,
            rule,
        })
    }

    /// Bind every writable, non-ignored destination field that has a
    /// readable source counterpart; fields that cannot be bound are dropped
    fn bind_fields(
        &self,
        src: &TypeDescriptor,
        dst: &TypeDescriptor,
        rule: Option<&MappingRule>,
        state: &mut ResolveState,
    ) -> Vec<FieldBinding> {
        let by_name = dst.is_interface();
        let mut bindings = Vec::new();

        for (index, field) in dst.writable_fields() {
            if rule.is_some_and(|rule| rule.is_ignored(&field.name)) {
                continue;
            }
            let dest_index = (!by_name).then_some(index);
            match self.bind(src, &field.name, &field.kind, dest_index, rule, state) {
                Some(Ok(binding)) => bindings.push(binding),
                Some(Err(err)) => tracing::debug!(
                    source = %src.key(),
                    dest = %dst.key(),
                    field = %field.name,
                    error = %err,
                    "dropped field binding"
                ),
                None => {}
            }
        }

        // source catalog order; custom actions last
        bindings.sort_by_key(|binding| binding.source.as_ref().map_or(usize::MAX, |s| s.index));
        bindings
    }

    /// Bind one destination field or constructor parameter
    ///
    /// Returns `None` when the source has no readable field to bind from.
    fn bind(
        &self,
        src: &TypeDescriptor,
        dest_field: &Arc<str>,
        dest_kind: &FieldKind,
        dest_index: Option<usize>,
        rule: Option<&MappingRule>,
        state: &mut ResolveState,
    ) -> Option<MapResult<FieldBinding>> {
        if let Some(action) = rule.and_then(|rule| rule.custom_action(dest_field)) {
            return Some(Ok(FieldBinding {
                dest_field: dest_field.clone(),
                dest_index,
                source: None,
                strategy: Strategy::Custom(action.clone()),
            }));
        }

        let source_name = rule
            .and_then(|rule| rule.source_field(dest_field))
            .unwrap_or(&**dest_field);
        let (index, source_field) = src.readable_field(source_name)?;

        let binding = self
            .strategy_on(&source_field.kind, dest_kind, state)
            .map(|strategy| FieldBinding {
                dest_field: dest_field.clone(),
                dest_index,
                source: Some(SourceField {
                    name: source_field.name.clone(),
                    index,
                }),
                strategy,
            });
        Some(binding)
    }

    /// Fewest-parameters-first; a candidate is rejected as soon as one of
    /// its parameters cannot be bound
    fn choose_constructor(
        &self,
        src: &TypeDescriptor,
        dst: &TypeDescriptor,
        rule: Option<&MappingRule>,
        state: &mut ResolveState,
    ) -> MapResult<Materialize> {
        'candidates: for constructor in dst.constructors() {
            let mut arguments = Vec::with_capacity(constructor.arity());
            for param in &constructor.params {
                let dest_index = dst.field_index(&param.name);
                match self.bind(src, &param.name, &param.kind, dest_index, rule, state) {
                    Some(Ok(binding)) => arguments.push(binding),
                    _ => {
                        tracing::trace!(
                            source = %src.key(),
                            dest = %dst.key(),
                            param = %param.name,
                            arity = constructor.arity(),
                            "rejected constructor candidate"
                        );
                        continue 'candidates;
                    }
                }
            }
            return Ok(Materialize::Constructor {
                constructor: constructor.clone(),
                arguments,
            });
        }

        Err(MapError::NoViableConstructor {
            source_type: src.key().clone(),
            dest: dst.key().clone(),
        })
    }

    /// Preference order: primitive conversion, nested plan, collection,
    /// direct assignment
    fn strategy_on(&self, source: &FieldKind, dest: &FieldKind, state: &mut ResolveState) -> MapResult<Strategy> {
        if let (Some(from), Some(to)) = (source.as_primitive(), dest.as_primitive()) {
            return ConversionTable::lookup(from, to)
                .map(Strategy::Convert)
                .ok_or_else(|| MapError::unsupported(source, dest));
        }
        if let (Some(source_key), Some(dest_key)) = (source.type_key(), dest.type_key()) {
            self.check_nested(source_key, dest_key, state)?;
            return Ok(Strategy::Nested(dest_key.clone()));
        }
        match (source, dest) {
            (FieldKind::Collection(source_element), FieldKind::Collection(dest_element)) => {
                let element = self.strategy_on(source_element, dest_element, state)?;
                Ok(Strategy::Collection {
                    element: (**dest_element).clone(),
                    strategy: Box::new(element),
                })
            }
            (FieldKind::DateTime, FieldKind::DateTime) => Ok(Strategy::Direct),
            _ => Err(MapError::unsupported(source, dest)),
        }
    }

    fn check_nested(&self, source: &TypeKey, dest: &TypeKey, state: &mut ResolveState) -> MapResult<()> {
        let pair = (source.clone(), dest.clone());
        if let Some(slot) = state.stack.iter().position(|open| *open == pair) {
            state.depend_on(slot);
            return Ok(());
        }
        if let Some((verdict, assumes)) = state.settled.get(&pair).map(|s| (s.verdict(), s.assumes)) {
            if let Some(low) = assumes {
                state.depend_on(low);
            }
            return verdict;
        }
        if let Some(cached) = self.cache.and_then(|cache| cache.get(source, dest)) {
            return cached.map(|_| ());
        }
        let settled = self.settle(&pair, state);
        let verdict = settled.verdict();
        state.settled.insert(pair, settled);
        verdict
    }
}
