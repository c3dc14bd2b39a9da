//! Mapping rules
//!
//! A [`MappingRule`] customizes how one source type maps into one
//! destination type: ignored destination fields, source-field overrides,
//! per-field custom actions, before/after hooks and a depth limit. Rules are
//! built at configuration time and are immutable afterwards. The mapping core
//! looks them up through a [`RuleSource`]; a missing rule means defaults.

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::MapResult;
use crate::object::ObjectRef;
use crate::types::TypeKey;
use crate::value::Value;

/// Hook invoked with `(source, destination)`
///
/// The destination is `Null` in a before-hook of a constructor-built
/// destination, which does not exist yet when the hook runs.
pub type MapHook = Arc<dyn Fn(&Value, &Value) -> MapResult<()> + Send + Sync>;

/// Per-field action computing the destination value from the source object
///
/// A `Null` result leaves the destination field unchanged.
pub type FieldAction = Arc<dyn Fn(&ObjectRef) -> MapResult<Value> + Send + Sync>;

/// Resolved customization for one (source, destination) type pair
#[derive(Default, Clone)]
pub struct MappingRule {
    ignored: FxHashSet<Arc<str>>,
    source_overrides: FxHashMap<Arc<str>, Arc<str>>,
    custom: FxHashMap<Arc<str>, FieldAction>,
    before_map: Option<MapHook>,
    after_map: Option<MapHook>,
    max_depth: Option<usize>,
}

impl MappingRule {
    /// Start building a rule
    pub fn builder() -> MappingRuleBuilder {
        MappingRuleBuilder::default()
    }

    /// Whether a destination field is ignored
    pub fn is_ignored(&self, dest_field: &str) -> bool {
        self.ignored.contains(dest_field)
    }

    /// Source field a destination field reads from, when overridden
    pub fn source_field(&self, dest_field: &str) -> Option<&str> {
        self.source_overrides.get(dest_field).map(|name| &**name)
    }

    /// Custom action for a destination field
    pub fn custom_action(&self, dest_field: &str) -> Option<&FieldAction> {
        self.custom.get(dest_field)
    }

    /// Hook run before any field is bound
    pub fn before_map(&self) -> Option<&MapHook> {
        self.before_map.as_ref()
    }

    /// Hook run after every field is bound
    pub fn after_map(&self) -> Option<&MapHook> {
        self.after_map.as_ref()
    }

    /// Depth limit for mapping calls rooted at this pair
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }
}

impl fmt::Debug for MappingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ignored: Vec<&str> = self.ignored.iter().map(|name| &**name).collect();
        ignored.sort_unstable();
        let mut custom: Vec<&str> = self.custom.keys().map(|name| &**name).collect();
        custom.sort_unstable();
        f.debug_struct("MappingRule")
            .field("ignored", &ignored)
            .field("source_overrides", &self.source_overrides)
            .field("custom", &custom)
            .field("before_map", &self.before_map.is_some())
            .field("after_map", &self.after_map.is_some())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Builder for [`MappingRule`]
#[derive(Default)]
pub struct MappingRuleBuilder {
    rule: MappingRule,
}

impl MappingRuleBuilder {
    /// Exclude a destination field from mapping
    pub fn ignore(mut self, dest_field: &str) -> Self {
        self.rule.ignored.insert(Arc::from(dest_field));
        self
    }

    /// Exclude several destination fields from mapping
    pub fn ignore_many<'a>(mut self, dest_fields: impl IntoIterator<Item = &'a str>) -> Self {
        self.rule
            .ignored
            .extend(dest_fields.into_iter().map(Arc::from));
        self
    }

    /// Read `dest_field` from `source_field` instead of the same-named field
    pub fn source_field(mut self, dest_field: &str, source_field: &str) -> Self {
        self.rule
            .source_overrides
            .insert(Arc::from(dest_field), Arc::from(source_field));
        self
    }

    /// Compute `dest_field` with a custom action instead of the default strategy
    pub fn custom<F>(mut self, dest_field: &str, action: F) -> Self
    where
        F: Fn(&ObjectRef) -> MapResult<Value> + Send + Sync + 'static,
    {
        self.rule.custom.insert(Arc::from(dest_field), Arc::new(action));
        self
    }

    /// Run a hook before any field is bound
    pub fn before_map<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value, &Value) -> MapResult<()> + Send + Sync + 'static,
    {
        self.rule.before_map = Some(Arc::new(hook));
        self
    }

    /// Run a hook after every field is bound
    pub fn after_map<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value, &Value) -> MapResult<()> + Send + Sync + 'static,
    {
        self.rule.after_map = Some(Arc::new(hook));
        self
    }

    /// Limit the nesting depth of mapping calls rooted at this pair
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.rule.max_depth = Some(depth);
        self
    }

    /// Finish the rule
    pub fn build(self) -> MappingRule {
        self.rule
    }
}

/// Lookup of the rule for a (source, destination) type pair
pub trait RuleSource: Send + Sync {
    /// Rule for the pair, or `None` to use defaults
    fn resolve_rule(&self, source: &TypeKey, dest: &TypeKey) -> Option<Arc<MappingRule>>;
}

/// Table of rules keyed by type pair
#[derive(Debug, Default, Clone)]
pub struct RuleTable {
    rules: FxHashMap<(TypeKey, TypeKey), Arc<MappingRule>>,
}

impl RuleTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rule for a pair, replacing any existing one
    pub fn insert(
        &mut self,
        source: impl Into<TypeKey>,
        dest: impl Into<TypeKey>,
        rule: MappingRule,
    ) -> Option<Arc<MappingRule>> {
        self.rules
            .insert((source.into(), dest.into()), Arc::new(rule))
    }

    /// Set the rule for a pair, builder style
    pub fn with(mut self, source: impl Into<TypeKey>, dest: impl Into<TypeKey>, rule: MappingRule) -> Self {
        self.insert(source, dest, rule);
        self
    }

    /// Combine several tables into one; for a pair present in more than
    /// one table the later table wins
    pub fn merge(tables: impl IntoIterator<Item = RuleTable>) -> Self {
        let mut merged = RuleTable::new();
        for table in tables {
            merged.rules.extend(table.rules);
        }
        merged
    }

    /// Get the rule for a pair
    pub fn get(&self, source: &TypeKey, dest: &TypeKey) -> Option<&Arc<MappingRule>> {
        self.rules.get(&(source.clone(), dest.clone()))
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RuleSource for RuleTable {
    fn resolve_rule(&self, source: &TypeKey, dest: &TypeKey) -> Option<Arc<MappingRule>> {
        self.get(source, dest).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let rule = MappingRule::builder()
            .ignore("Secret")
            .ignore_many(["A", "B"])
            .source_field("FullName", "Name")
            .max_depth(3)
            .before_map(|_, _| Ok(()))
            .build();

        assert!(rule.is_ignored("Secret"));
        assert!(rule.is_ignored("B"));
        assert!(!rule.is_ignored("Name"));
        assert_eq!(rule.source_field("FullName"), Some("Name"));
        assert_eq!(rule.source_field("Name"), None);
        assert_eq!(rule.max_depth(), Some(3));
        assert!(rule.before_map().is_some());
        assert!(rule.after_map().is_none());
    }

    #[test]
    fn test_insert_replaces() {
        let mut table = RuleTable::new();
        table.insert("A", "B", MappingRule::builder().max_depth(1).build());
        let previous = table.insert("A", "B", MappingRule::builder().max_depth(2).build());

        assert_eq!(previous.and_then(|r| r.max_depth()), Some(1));
        assert_eq!(table.len(), 1);
        let rule = table.resolve_rule(&"A".into(), &"B".into()).unwrap();
        assert_eq!(rule.max_depth(), Some(2));
    }

    #[test]
    fn test_merge_later_wins() {
        let first = RuleTable::new()
            .with("A", "B", MappingRule::builder().ignore("X").build())
            .with("C", "D", MappingRule::default());
        let second = RuleTable::new().with("A", "B", MappingRule::builder().ignore("Y").build());

        let merged = RuleTable::merge([first, second]);
        assert_eq!(merged.len(), 2);
        let rule = merged.get(&"A".into(), &"B".into()).unwrap();
        assert!(rule.is_ignored("Y"));
        assert!(!rule.is_ignored("X"));
        assert!(merged.resolve_rule(&"B".into(), &"A".into()).is_none());
    }
}
