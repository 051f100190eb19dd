use std::ops::{Deref, DerefMut};

/// Wraps a component field and remembers whether it was borrowed mutably
/// since the last [ChangedField::clear_changed].
#[derive(Debug)]
pub struct ChangedField<T> {
    value: T,
    changed: bool,
}

impl<T> ChangedField<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            changed: false,
        }
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn clear_changed(&mut self) {
        self.changed = false;
    }
}

impl<T> Deref for ChangedField<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T> DerefMut for ChangedField<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.changed = true;
        &mut self.value
    }
}
