//! Stand-in for a render tree: owns box sizes and measurement subscriptions.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use waterfall_core::{BoxMetrics, ScrollMetrics, Size};
use waterfall_ui::Waterfall;

#[derive(Default)]
struct Boxes {
    container: Cell<Option<Size>>,
    sizes: RefCell<FxHashMap<usize, Size>>,
    observed: RefCell<FxHashSet<usize>>,
}

impl BoxMetrics for Boxes {
    fn container_size(&self) -> Option<Size> {
        self.container.get()
    }

    fn item_size(&self, index: usize) -> Option<Size> {
        self.sizes.borrow().get(&index).copied()
    }

    fn observe_item(&self, index: usize) -> bool {
        self.observed.borrow_mut().insert(index);
        true
    }

    fn unobserve_item(&self, index: usize) {
        self.observed.borrow_mut().remove(&index);
    }
}

pub struct HeadlessHost {
    boxes: Rc<Boxes>,
}

impl HeadlessHost {
    pub fn new(container: Size) -> Self {
        let boxes = Rc::new(Boxes::default());
        boxes.container.set(Some(container));
        Self { boxes }
    }

    pub fn metrics(&self) -> Rc<dyn BoxMetrics> {
        self.boxes.clone()
    }

    pub fn resize(&self, container: Size) {
        self.boxes.container.set(Some(container));
    }

    pub fn scroll_to(&self, top: f32, content_height: f32) -> ScrollMetrics {
        let container = self.boxes.container.get().unwrap_or(Size::ZERO);
        let max_top = (content_height - container.height).max(0.0);
        ScrollMetrics {
            scroll_top: top.clamp(0.0, max_top),
            scroll_left: 0.0,
            scroll_height: content_height.max(container.height),
            scroll_width: container.width,
            client_height: container.height,
            client_width: container.width,
        }
    }

    pub fn observed_count(&self) -> usize {
        self.boxes.observed.borrow().len()
    }

    /// Lays out every observed item at its natural height and reports the
    /// ones whose size changed. Returns true when anything was reported.
    pub fn report_sizes<T: Clone + 'static>(
        &self,
        waterfall: &mut Waterfall<T>,
        natural_height: impl Fn(&T) -> f32,
    ) -> bool {
        let mut observed: Vec<usize> = self.boxes.observed.borrow().iter().copied().collect();
        observed.sort_unstable();

        let mut changed = Vec::new();
        for index in observed {
            let (Some(item), Some(position)) =
                (waterfall.items().get(index), waterfall.item_position(index))
            else {
                continue;
            };
            let size = Size::new(position.width, natural_height(item));
            let previous = self.boxes.sizes.borrow_mut().insert(index, size);
            if previous != Some(size) {
                changed.push((index, size));
            }
        }
        let reported = !changed.is_empty();
        for (index, size) in changed {
            waterfall.notify_item_resize(index, size);
        }
        reported
    }
}
