//! Keeps the items a host predicate accepts.

use std::rc::Rc;

use waterfall_core::ScrollToOptions;
use waterfall_plugin::{DerivedItems, Hook, Plugin};

use crate::control::Control;

/// Receives the item and its index in the list handed to the plugin.
pub type Predicate<T> = Rc<dyn Fn(&T, usize) -> bool>;

pub type FilterControl<T> = Control<Option<Predicate<T>>>;

pub struct FilterPlugin<T> {
    control: FilterControl<T>,
    scroll_to_top: bool,
    scroll_options: ScrollToOptions,
}

impl<T: Clone + 'static> FilterPlugin<T> {
    pub const NAME: &'static str = "filter";

    pub fn new() -> Self {
        Self {
            control: Control::new(None),
            scroll_to_top: false,
            scroll_options: ScrollToOptions::default(),
        }
    }

    pub fn with(predicate: impl Fn(&T, usize) -> bool + 'static) -> Self {
        let plugin = Self::new();
        let predicate: Predicate<T> = Rc::new(predicate);
        plugin.control.set(Some(predicate));
        plugin
    }

    pub fn control(&self) -> FilterControl<T> {
        self.control.clone()
    }

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
                let Some(predicate) = control.get() else {
                    return Ok(props);
                };
                let kept: Vec<usize> = props
                    .items
                    .iter()
                    .enumerate()
                    .filter(|(index, item)| predicate(*item, *index))
                    .map(|(index, _)| index)
                    .collect();
                let items = derived.pick(&props.items, kept);
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

impl<T: Clone + 'static> Default for FilterPlugin<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> From<FilterPlugin<T>> for Plugin<T> {
    fn from(plugin: FilterPlugin<T>) -> Self {
        plugin.build()
    }
}
