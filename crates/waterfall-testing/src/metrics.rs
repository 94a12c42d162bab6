//! In-memory box metrics.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use waterfall_core::{BoxMetrics, Size};

/// Box metrics whose sizes are set by the test.
///
/// Items are observable whether or not a size has been set, so tests can
/// assert on subscriptions without mounting anything.
#[derive(Debug, Default)]
pub struct FakeMetrics {
    container: Cell<Option<Size>>,
    items: RefCell<FxHashMap<usize, Size>>,
    observed: RefCell<FxHashSet<usize>>,
    observe_calls: Cell<usize>,
}

impl FakeMetrics {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn with_container(width: f32, height: f32) -> Rc<Self> {
        let metrics = Self::new();
        metrics.set_container(Some(Size::new(width, height)));
        metrics
    }

    pub(crate) fn container_size_or_zero(&self) -> Size {
        self.container.get().unwrap_or(Size::ZERO)
    }

    pub fn set_container(&self, size: Option<Size>) {
        self.container.set(size);
    }

    pub fn set_item_size(&self, index: usize, size: Size) {
        self.items.borrow_mut().insert(index, size);
    }

    pub fn remove_item(&self, index: usize) {
        self.items.borrow_mut().remove(&index);
    }

    pub fn is_observed(&self, index: usize) -> bool {
        self.observed.borrow().contains(&index)
    }

    /// Observed indices, ascending.
    pub fn observed(&self) -> Vec<usize> {
        let mut observed: Vec<usize> = self.observed.borrow().iter().copied().collect();
        observed.sort_unstable();
        observed
    }

    /// Total `observe_item` calls so far.
    pub fn observe_calls(&self) -> usize {
        self.observe_calls.get()
    }
}

impl BoxMetrics for FakeMetrics {
    fn container_size(&self) -> Option<Size> {
        self.container.get()
    }

    fn item_size(&self, index: usize) -> Option<Size> {
        self.items.borrow().get(&index).copied()
    }

    fn observe_item(&self, index: usize) -> bool {
        self.observe_calls.set(self.observe_calls.get() + 1);
        self.observed.borrow_mut().insert(index);
        true
    }

    fn unobserve_item(&self, index: usize) {
        self.observed.borrow_mut().remove(&index);
    }
}
