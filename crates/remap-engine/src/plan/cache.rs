//! Plan cache
//!
//! Process-wide memo of resolved plans keyed by (source, destination) type
//! pair. Entries start empty, are filled at most once, and are never evicted:
//! the type registry is configured once at startup, so a plan never goes
//! stale. Failed resolutions are cached too, and replayed to later callers.

use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::MappingPlan;
use crate::error::MapResult;
use crate::types::TypeKey;

type PlanCell = Arc<OnceCell<MapResult<Arc<MappingPlan>>>>;

/// Thread-safe compute-once cache of mapping plans
#[derive(Default)]
pub struct PlanCache {
    /// (source, destination) → plan slot
    entries: RwLock<FxHashMap<(TypeKey, TypeKey), PlanCell>>,
    /// Number of build functions run
    builds: AtomicUsize,
}

impl PlanCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the plan for a pair, running `build` if no plan exists yet
    ///
    /// Concurrent callers for the same pair wait for a single build rather
    /// than each building independently.
    pub fn get_or_build<F>(&self, source: &TypeKey, dest: &TypeKey, build: F) -> MapResult<Arc<MappingPlan>>
    where
        F: FnOnce() -> MapResult<MappingPlan>,
    {
        let cell = self.cell(source, dest);
        cell.get_or_init(|| {
            self.builds.fetch_add(1, Ordering::Relaxed);
            build().map(Arc::new)
        })
        .clone()
    }

    fn cell(&self, source: &TypeKey, dest: &TypeKey) -> PlanCell {
        let key = (source.clone(), dest.clone());
        if let Some(cell) = self.entries.read().get(&key) {
            return cell.clone();
        }
        self.entries.write().entry(key).or_default().clone()
    }

    /// Fill the entry for a pair that has no entry yet
    ///
    /// Used for plans settled while resolving another pair. An entry that
    /// already exists, complete or still building, is left alone, so this
    /// never waits on another builder. Returns whether the plan was stored.
    pub fn seed(&self, source: &TypeKey, dest: &TypeKey, plan: MapResult<MappingPlan>) -> bool {
        let mut entries = self.entries.write();
        match entries.entry((source.clone(), dest.clone())) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(OnceCell::with_value(plan.map(Arc::new))));
                true
            }
        }
    }

    /// Get a completed entry without building
    pub fn get(&self, source: &TypeKey, dest: &TypeKey) -> Option<MapResult<Arc<MappingPlan>>> {
        let entries = self.entries.read();
        let cell = entries.get(&(source.clone(), dest.clone()))?;
        cell.get().cloned()
    }

    /// Number of completed entries, successful or failed
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    /// Check if no entry has completed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of builds run so far; seeded entries are not counted
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for PlanCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanCache")
            .field("entries", &self.len())
            .field("builds", &self.builds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;
    use crate::plan::Materialize;

    fn plan(source: &str, dest: &str) -> MappingPlan {
        MappingPlan {
            source: source.into(),
            dest: dest.into(),
            materialize: Materialize::Blank,
            bindings: Vec::new(),
            rule: None,
        }
    }

    #[test]
    fn test_builds_once() {
        let cache = PlanCache::new();
        let (a, b) = (TypeKey::new("A"), TypeKey::new("B"));

        let first = cache.get_or_build(&a, &b, || Ok(plan("A", "B"))).unwrap();
        let second = cache
            .get_or_build(&a, &b, || panic!("plan rebuilt"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.builds(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failure_is_cached() {
        let cache = PlanCache::new();
        let (a, b) = (TypeKey::new("A"), TypeKey::new("B"));
        let failure = MapError::NoViableConstructor {
            source_type: a.clone(),
            dest: b.clone(),
        };

        let err = cache.get_or_build(&a, &b, || Err(failure.clone())).unwrap_err();
        assert_eq!(err, failure);
        let err = cache.get_or_build(&a, &b, || Ok(plan("A", "B"))).unwrap_err();
        assert_eq!(err, failure);
        assert_eq!(cache.builds(), 1);
        assert!(matches!(cache.get(&a, &b), Some(Err(_))));
    }

    #[test]
    fn test_seed_fills_vacant_entries_only() {
        let cache = PlanCache::new();
        let (a, b, c) = (TypeKey::new("A"), TypeKey::new("B"), TypeKey::new("C"));

        let built = cache.get_or_build(&a, &b, || Ok(plan("A", "B"))).unwrap();
        assert!(!cache.seed(&a, &b, Ok(plan("A", "C"))));
        assert!(Arc::ptr_eq(&cache.get(&a, &b).unwrap().unwrap(), &built));

        assert!(cache.seed(&a, &c, Ok(plan("A", "C"))));
        let seeded = cache
            .get_or_build(&a, &c, || panic!("seeded plan rebuilt"))
            .unwrap();
        assert_eq!(seeded.dest(), &c);
        assert_eq!(cache.builds(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_single_flight() {
        let cache = PlanCache::new();
        let (a, b) = (TypeKey::new("A"), TypeKey::new("B"));

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let plan = cache
                        .get_or_build(&a, &b, || {
                            std::thread::sleep(std::time::Duration::from_millis(10));
                            Ok(plan("A", "B"))
                        })
                        .unwrap();
                    assert_eq!(plan.dest(), &b);
                });
            }
        });

        assert_eq!(cache.builds(), 1);
    }
}
