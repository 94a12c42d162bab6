//! Orders the item list with a host comparator.

use std::cmp::Ordering;
use std::rc::Rc;

use waterfall_core::ScrollToOptions;
use waterfall_plugin::{DerivedItems, Hook, Plugin};

use crate::control::Control;

pub type Comparator<T> = Rc<dyn Fn(&T, &T) -> Ordering>;

/// Handle for swapping the comparator of a registered [`SortPlugin`].
pub type SortControl<T> = Control<Option<Comparator<T>>>;

pub struct SortPlugin<T> {
    control: SortControl<T>,
    scroll_to_top: bool,
    scroll_options: ScrollToOptions,
}

impl<T: Clone + 'static> SortPlugin<T> {
    pub const NAME: &'static str = "sort";

    /// A sort plugin that leaves the list alone until a comparator is set.
    pub fn new() -> Self {
        Self {
            control: Control::new(None),
            scroll_to_top: false,
            scroll_options: ScrollToOptions::default(),
        }
    }

    pub fn by(comparator: impl Fn(&T, &T) -> Ordering + 'static) -> Self {
        let plugin = Self::new();
        let comparator: Comparator<T> = Rc::new(comparator);
        plugin.control.set(Some(comparator));
        plugin
    }

    pub fn control(&self) -> SortControl<T> {
        self.control.clone()
    }

    /// Scroll back to the top after the comparator changes.
    pub fn scroll_to_top(mut self, enabled: bool) -> Self {
        self.scroll_to_top = enabled;
        self
    }

    pub fn scroll_options(mut self, options: ScrollToOptions) -> Self {
        self.scroll_options = options;
        self
    }

    pub fn build(self) -> Plugin<T> {
        let Self {
            control,
            scroll_to_top,
            scroll_options,
        } = self;
        let mut seen = control.revision();
        let watched = control.clone();
        let mut derived = DerivedItems::new();
        Plugin::new(Self::NAME)
            .transform_props(move |props, _| {
                let Some(comparator) = control.get() else {
                    return Ok(props);
                };
                let order = sorted_order(&props.items, &*comparator);
                let items = derived.pick(&props.items, order);
                Ok(props.with_items(items))
            })
            .notify(Hook::PropsChange, move |ctx, _| {
                let revision = watched.revision();
                if revision != seen {
                    seen = revision;
                    if scroll_to_top {
                        ctx.actions.scroll_to_top(scroll_options);
                    }
                }
                Ok(())
            })
    }
}

impl<T: Clone + 'static> Default for SortPlugin<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> From<SortPlugin<T>> for Plugin<T> {
    fn from(plugin: SortPlugin<T>) -> Self {
        plugin.build()
    }
}

/// Indices of `items` in stable sorted order.
fn sorted_order<T>(items: &[T], comparator: &dyn Fn(&T, &T) -> Ordering) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| comparator(&items[a], &items[b]));
    order
}
