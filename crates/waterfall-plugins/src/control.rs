use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

struct Slot<V> {
    value: V,
    revision: u64,
}

/// Shared, revisioned value a plugin reads on every transform.
///
/// The host keeps one clone and the plugin the other. Every `set` bumps the
/// revision, which is how the plugin notices a change after the fact.
pub struct Control<V> {
    inner: Rc<RefCell<Slot<V>>>,
}

impl<V> Control<V> {
    pub fn new(value: V) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Slot { value, revision: 0 })),
        }
    }

    pub fn set(&self, value: V) {
        let mut slot = self.inner.borrow_mut();
        slot.value = value;
        slot.revision += 1;
    }

    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision
    }

    pub fn with<R>(&self, read: impl FnOnce(&V) -> R) -> R {
        read(&self.inner.borrow().value)
    }
}

impl<V: Clone> Control<V> {
    pub fn get(&self) -> V {
        self.inner.borrow().value.clone()
    }
}

impl<V> Clone for Control<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for Control<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Control")
            .field("revision", &self.revision())
            .finish_non_exhaustive()
    }
}
