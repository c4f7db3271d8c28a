// src/state.rs

use crate::models::Tags;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The session-wide tag set.
///
/// Cloning a `TagStore` clones the handle, not the tags: every component holding
/// one sees every mutation immediately. Locks are only ever held for short,
/// synchronous sections and never across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct TagStore {
    inner: Arc<RwLock<Tags>>,
}

impl TagStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `tags` (the root fetch's initial state).
    pub fn with_tags(tags: Tags) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tags)),
        }
    }

    /// Read access for evaluation. A poisoned lock still holds valid tags, so it is recovered.
    pub fn read(&self) -> RwLockReadGuard<'_, Tags> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tags> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.read().get(name).cloned()
    }

    /// Merges `set` into the store, then removes every name in `unset`.
    /// A name present in both ends up unset.
    pub fn apply(&self, set: &BTreeMap<String, String>, unset: &[String]) {
        let mut tags = self.write();
        for (name, value) in set {
            tags.insert(name.clone(), value.clone());
        }
        for name in unset {
            tags.remove(name);
        }
    }

    /// A sorted copy of the current tags, for display.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_mutations() {
        let store = TagStore::new();
        let other = store.clone();

        let set = BTreeMap::from([("x".to_string(), "1".to_string())]);
        store.apply(&set, &[]);

        assert!(other.contains("x"));
        assert_eq!(other.get("x").as_deref(), Some("1"));
    }

    #[test]
    fn test_unset_wins_over_set_in_same_apply() {
        let store = TagStore::with_tags(Tags::from([("b".to_string(), "old".to_string())]));

        let set = BTreeMap::from([
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "new".to_string()),
        ]);
        store.apply(&set, &["a".to_string()]);

        assert!(!store.contains("a"));
        assert_eq!(store.get("b").as_deref(), Some("new"));
    }
}
