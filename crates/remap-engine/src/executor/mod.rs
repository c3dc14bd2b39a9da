//! Plan executor
//!
//! Applies a [`MappingPlan`] to a source object, materializing or mutating
//! the destination. One [`MapContext`] lives for one top-level mapping call
//! and owns that call's identity map and depth counter; it is never shared
//! between calls.
//!
//! Depth counts objects: the top-level destination is at depth 1 and each
//! nested object one deeper. Collection elements sit at the depth of their
//! owner's children. Once the limit is reached no new nested object is
//! created; existing destination values are left in place.

mod identity;

pub use identity::IdentityMap;

use crate::error::{MapError, MapResult};
use crate::mapper::Mapper;
use crate::object::{List, ListRef, Object, ObjectRef};
use crate::plan::{FieldBinding, MappingPlan, Materialize, Strategy};
use crate::rule::MapHook;
use crate::types::{FieldKind, TypeKey};
use crate::value::Value;

/// Working state of one top-level mapping call
pub(crate) struct MapContext<'m> {
    mapper: &'m Mapper,
    identity: IdentityMap,
    depth: usize,
    max_depth: usize,
}

impl<'m> MapContext<'m> {
    pub(crate) fn new(mapper: &'m Mapper, max_depth: usize) -> Self {
        Self {
            mapper,
            identity: IdentityMap::new(),
            depth: 0,
            max_depth,
        }
    }

    fn at_depth_limit(&self) -> bool {
        self.depth >= self.max_depth
    }

    /// Execute `plan` for `source`, onto `dest` when one is supplied
    ///
    /// Returns `None` only when the depth limit stops the call before a
    /// destination exists.
    pub(crate) fn execute(
        &mut self,
        plan: &MappingPlan,
        source: &ObjectRef,
        dest: Option<ObjectRef>,
    ) -> MapResult<Option<ObjectRef>> {
        // checked even when `dest` is supplied
        if let Some(mapped) = self.identity.get(source, &plan.dest) {
            tracing::trace!(source = %plan.source, dest = %plan.dest, "identity map hit");
            return Ok(Some(mapped));
        }

        self.depth += 1;
        let result = self.execute_at_depth(plan, source, dest);
        self.depth -= 1;
        result
    }

    fn execute_at_depth(
        &mut self,
        plan: &MappingPlan,
        source: &ObjectRef,
        dest: Option<ObjectRef>,
    ) -> MapResult<Option<ObjectRef>> {
        if self.depth > self.max_depth {
            tracing::trace!(
                source = %plan.source,
                dest = %plan.dest,
                depth = self.depth,
                "depth limit reached"
            );
            return Ok(dest);
        }

        let rule = plan.rule.as_deref();
        let before = rule.and_then(|rule| rule.before_map());
        let source_value = Value::Object(source.clone());

        let dest = match (dest, &plan.materialize) {
            (Some(existing), _) => {
                self.identity.register(source, &plan.dest, existing.clone());
                run_hook(before, &source_value, &Value::Object(existing.clone()))?;
                existing
            }
            (None, Materialize::Blank) => {
                let descriptor = self.mapper.registry().describe(&plan.dest)?;
                let created = Object::blank(descriptor);
                self.identity.register(source, &plan.dest, created.clone());
                run_hook(before, &source_value, &Value::Object(created.clone()))?;
                created
            }
            (None, Materialize::Polymorphic { interface }) => {
                let concrete = self.mapper.resolve_concrete(interface)?;
                let created = self.mapper.registry().instantiate(&concrete)?;
                self.identity.register(source, &plan.dest, created.clone());
                run_hook(before, &source_value, &Value::Object(created.clone()))?;
                created
            }
            (None, Materialize::Constructor { arguments, .. }) => {
                run_hook(before, &source_value, &Value::Null)?;
                let created = self.construct(&plan.dest, arguments, source)?;
                self.identity.register(source, &plan.dest, created.clone());
                created
            }
        };

        self.apply_bindings(plan, source, &dest)?;

        let after = rule.and_then(|rule| rule.after_map());
        run_hook(after, &source_value, &Value::Object(dest.clone()))?;
        Ok(Some(dest))
    }

    /// Map every constructor argument, then build the instance
    fn construct(
        &mut self,
        dest_key: &TypeKey,
        arguments: &[FieldBinding],
        source: &ObjectRef,
    ) -> MapResult<ObjectRef> {
        let descriptor = self.mapper.registry().describe(dest_key)?;

        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            let value = match &argument.strategy {
                Strategy::Custom(action) => action(source)?,
                strategy => {
                    let input = read_source(source, argument);
                    if input.is_null() {
                        strategy.null_argument()
                    } else {
                        self.carry(strategy, &input, Value::Null)?
                            .unwrap_or_else(|| strategy.null_argument())
                    }
                }
            };
            values.push(value);
        }

        let object = Object::blank(descriptor);
        for (argument, value) in arguments.iter().zip(values) {
            let Some(slot) = argument.dest_index else {
                continue;
            };
            if matches!(argument.strategy, Strategy::Custom(_)) {
                check_fits(&object, slot, &value)?;
            }
            object.store(slot, value);
        }
        Ok(object)
    }

    /// Bind fields by mutation in plan order
    ///
    /// A null source value never overwrites the destination field.
    fn apply_bindings(&mut self, plan: &MappingPlan, source: &ObjectRef, dest: &ObjectRef) -> MapResult<()> {
        // a concrete type realizing the planned destination is bound by name
        let by_name = dest.type_key() != &plan.dest;

        for binding in &plan.bindings {
            let slot = if by_name {
                writable_slot(dest, &binding.dest_field)
            } else {
                binding.dest_index
            };
            let Some(slot) = slot else {
                continue;
            };

            let value = match &binding.strategy {
                Strategy::Custom(action) => action(source)?,
                strategy => {
                    let input = read_source(source, binding);
                    if input.is_null() {
                        continue;
                    }
                    let current = dest.get_index(slot).unwrap_or_default();
                    match self.carry(strategy, &input, current)? {
                        Some(value) => value,
                        None => continue,
                    }
                }
            };
            if value.is_null() {
                continue;
            }
            if by_name || matches!(binding.strategy, Strategy::Custom(_)) {
                check_fits(dest, slot, &value)?;
            }
            dest.store(slot, value);
        }
        Ok(())
    }

    /// Carry one non-null value through a strategy
    ///
    /// `current` is the destination's present value, reused as the target
    /// of nested and collection mappings. `None` means leave the
    /// destination unchanged.
    pub(crate) fn carry(&mut self, strategy: &Strategy, value: &Value, current: Value) -> MapResult<Option<Value>> {
        match strategy {
            Strategy::Direct => Ok(Some(value.clone())),
            Strategy::Convert(conversion) => conversion.apply(value).map(Some),
            Strategy::Nested(dest_key) => {
                let source = value
                    .as_object()
                    .ok_or_else(|| MapError::mismatch(dest_key, value.kind_name()))?;
                let existing = current.as_object().cloned();
                if existing.is_none() && self.at_depth_limit() && self.identity.get(source, dest_key).is_none() {
                    tracing::trace!(dest = %dest_key, depth = self.depth, "nested object skipped at depth limit");
                    return Ok(None);
                }
                let plan = self.mapper.plan(source.type_key(), dest_key)?;
                Ok(self.execute(&plan, source, existing)?.map(Value::Object))
            }
            Strategy::Collection { element, strategy } => {
                let source = value
                    .as_list()
                    .ok_or_else(|| MapError::mismatch(FieldKind::collection(element.clone()), value.kind_name()))?;
                let existing = current.as_list().cloned();
                if existing.is_none() && strategy.creates_objects() && self.at_depth_limit() {
                    tracing::trace!(element = %element, depth = self.depth, "collection skipped at depth limit");
                    return Ok(None);
                }
                let list = self.map_list(source, element, strategy, existing)?;
                Ok(Some(Value::List(list)))
            }
            // applied by `construct` and `apply_bindings`; the resolver never
            // nests a custom action inside a collection
            Strategy::Custom(_) => unreachable!("custom actions are not carried value by value"),
        }
    }

    /// Map a list element-wise onto `existing`, or onto a new list
    ///
    /// Existing elements are reused by index; the destination ends up with
    /// exactly as many elements as the source.
    pub(crate) fn map_list(
        &mut self,
        source: &ListRef,
        element: &FieldKind,
        strategy: &Strategy,
        existing: Option<ListRef>,
    ) -> MapResult<ListRef> {
        let dest = existing.unwrap_or_else(|| List::empty(element.clone()));
        let items = source.items();

        for (index, item) in items.iter().enumerate() {
            let prior = dest.get(index).unwrap_or_default();
            let mapped = if item.is_null() {
                Value::Null
            } else {
                self.carry(strategy, item, prior.clone())?.unwrap_or(prior)
            };
            dest.put(index, mapped);
        }
        dest.truncate(items.len());
        Ok(dest)
    }
}

fn read_source(source: &ObjectRef, binding: &FieldBinding) -> Value {
    binding
        .source
        .as_ref()
        .and_then(|field| source.get_index(field.index))
        .unwrap_or_default()
}

fn writable_slot(dest: &ObjectRef, name: &str) -> Option<usize> {
    let descriptor = dest.descriptor();
    let index = descriptor.field_index(name)?;
    descriptor.fields()[index].writable.then_some(index)
}

fn check_fits(dest: &ObjectRef, slot: usize, value: &Value) -> MapResult<()> {
    match dest.descriptor().fields().get(slot) {
        Some(field) if !value.fits(&field.kind) => Err(MapError::mismatch(&field.kind, value.kind_name())),
        _ => Ok(()),
    }
}

fn run_hook(hook: Option<&MapHook>, source: &Value, dest: &Value) -> MapResult<()> {
    match hook {
        Some(hook) => hook(source, dest),
        None => Ok(()),
    }
}
