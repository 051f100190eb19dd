use std::{collections::HashSet, hash::Hash};

/// Entities touched during one update, drained by whoever caches derived
/// data (the sector BVH).
pub struct ChangedSet<T: Eq + Hash> {
    changed: HashSet<T>,
}

impl<T: Eq + Hash> Default for ChangedSet<T> {
    fn default() -> Self {
        Self {
            changed: HashSet::new(),
        }
    }
}

impl<T: Eq + Hash> ChangedSet<T> {
    pub fn clear(&mut self) {
        self.changed.clear();
    }

    pub fn change(&mut self, entity: T) {
        self.changed.insert(entity);
    }

    pub fn changed(&self) -> &HashSet<T> {
        &self.changed
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}
