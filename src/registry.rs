//! The name → mapping registry.

use std::sync::Arc;

use crate::mapping::MappingShared;

#[cfg(feature = "ahash")]
type Map<K, V> = ahash::AHashMap<K, V>;
#[cfg(not(feature = "ahash"))]
type Map<K, V> = std::collections::HashMap<K, V>;

/// Registry holding every mapping's shared state.
///
/// Hybrid storage: a small Vec front (cache-friendly linear search) with a
/// HashMap fallback once the collection grows, plus an insertion-order list
/// for bulk iteration.
pub(crate) struct Registry {
    /// Fast Vec lookup for the first N registrations
    small: Vec<(Arc<str>, Arc<MappingShared>)>,
    /// HashMap fallback for remaining registrations
    large: Map<Arc<str>, Arc<MappingShared>>,
    /// Names in registration order
    insertion: Vec<Arc<str>>,
    /// Threshold for Vec vs HashMap storage
    small_threshold: usize,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            small: Vec::new(),
            large: Map::default(),
            insertion: Vec::new(),
            small_threshold: 16, // Vec wins for small collections
        }
    }

    /// Inserts or replaces the entry for `name`.
    pub(crate) fn insert(&mut self, name: Arc<str>, mapping: Arc<MappingShared>) {
        if let Some(pos) = self.small.iter().position(|(k, _)| **k == *name) {
            self.small[pos] = (name, mapping);
            return;
        }
        if self.large.contains_key(&*name) {
            self.large.insert(name, mapping);
            return;
        }
        self.insertion.push(name.clone());
        if self.small.len() < self.small_threshold {
            self.small.push((name, mapping));
        } else {
            self.large.insert(name, mapping);
        }
    }

    #[inline]
    pub(crate) fn get(&self, name: &str) -> Option<&Arc<MappingShared>> {
        for (k, mapping) in &self.small {
            if **k == *name {
                return Some(mapping);
            }
        }
        self.large.get(name)
    }

    #[inline]
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes the entry for `name`. Returns true when something was removed.
    pub(crate) fn remove(&mut self, name: &str) -> bool {
        let removed = if let Some(pos) = self.small.iter().position(|(k, _)| **k == *name) {
            self.small.remove(pos);
            true
        } else {
            self.large.remove(name).is_some()
        };
        if removed {
            self.insertion.retain(|k| **k != *name);
        }
        removed
    }

    /// Registered names in registration order.
    pub(crate) fn names(&self) -> Vec<Arc<str>> {
        self.insertion.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.insertion.len()
    }
}
