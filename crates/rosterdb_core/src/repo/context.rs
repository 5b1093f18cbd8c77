//! First-level cache of loaded records, keyed by id.

use std::cell::RefCell;
use std::collections::HashMap;

/// Identity map owned by one repository instance.
///
/// Only id lookups consult it. Predicate queries always read storage, so a
/// cached copy can disagree with query results after a bulk update that was
/// run with `CacheSync::Keep`.
#[derive(Debug)]
pub struct PersistenceContext<T> {
    entries: RefCell<HashMap<i64, T>>,
}

impl<T> Default for PersistenceContext<T> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }
}

impl<T: Clone> PersistenceContext<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i64) -> Option<T> {
        self.entries.borrow().get(&id).cloned()
    }

    pub fn put(&self, id: i64, value: T) {
        self.entries.borrow_mut().insert(id, value);
    }

    pub fn contains(&self, id: i64) -> bool {
        self.entries.borrow().contains_key(&id)
    }

    pub fn evict(&self, id: i64) {
        self.entries.borrow_mut().remove(&id);
    }

    pub fn evict_all(&self, ids: &[i64]) {
        let mut entries = self.entries.borrow_mut();
        for id in ids {
            entries.remove(id);
        }
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::PersistenceContext;

    #[test]
    fn evict_and_clear_drop_entries() {
        let context = PersistenceContext::new();
        context.put(1, "a");
        context.put(2, "b");
        context.put(3, "c");

        context.evict_all(&[1, 3, 9]);
        assert_eq!(context.get(2), Some("b"));
        assert!(!context.contains(1));
        assert_eq!(context.len(), 1);

        context.clear();
        assert!(context.is_empty());
    }
}
