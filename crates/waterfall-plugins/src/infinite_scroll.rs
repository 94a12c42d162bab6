//! Asks for more items when the viewport nears the bottom.

use std::cell::Cell;
use std::rc::Rc;

use waterfall_plugin::{Hook, HookArgs, Plugin};

use crate::LOAD_EVENT;

/// Payload of [`LOAD_EVENT`](crate::LOAD_EVENT) and argument of the load callback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InfiniteScrollLoad {
    /// Remaining scroll distance when the load was triggered.
    pub distance: f32,
    /// Items in the list at that moment.
    pub item_count: usize,
}

/// Triggers a load when a reach-bottom notification arrives within
/// `threshold` pixels of the end.
///
/// No new load starts while the props report `is_loading`, or until the list
/// changes (or `is_loading` drops back to false) after the previous one.
pub struct InfiniteScrollPlugin {
    threshold: f32,
    on_load_more: Option<Box<dyn FnMut(&InfiniteScrollLoad)>>,
}

impl InfiniteScrollPlugin {
    pub const NAME: &'static str = "infinite-scroll";

    pub const DEFAULT_THRESHOLD: f32 = 100.0;

    pub fn new() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            on_load_more: None,
        }
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.max(0.0);
        self
    }

    pub fn on_load_more(mut self, callback: impl FnMut(&InfiniteScrollLoad) + 'static) -> Self {
        self.on_load_more = Some(Box::new(callback));
        self
    }

    pub fn build<T: 'static>(self) -> Plugin<T> {
        let Self {
            threshold,
            mut on_load_more,
        } = self;
        let in_flight = Rc::new(Cell::new(false));
        let cleared_by_items = Rc::clone(&in_flight);
        let cleared_by_props = Rc::clone(&in_flight);
        Plugin::new(Self::NAME)
            .notify(Hook::ReachBottom, move |ctx, args| {
                let HookArgs::ReachBottom { distance } = *args else {
                    return Ok(());
                };
                if distance > threshold {
                    return Ok(());
                }
                if ctx.flags.is_loading || in_flight.get() {
                    log::trace!("[waterfall] infinite scroll: load already in flight");
                    return Ok(());
                }
                in_flight.set(true);
                let load = InfiniteScrollLoad {
                    distance,
                    item_count: ctx.item_count(),
                };
                log::debug!(
                    "[waterfall] infinite scroll: loading more at {} items",
                    load.item_count
                );
                if let Some(callback) = on_load_more.as_mut() {
                    callback(&load);
                }
                ctx.bus.emit(LOAD_EVENT, &load);
                Ok(())
            })
            .notify(Hook::ItemsChange, move |_, _| {
                cleared_by_items.set(false);
                Ok(())
            })
            .notify(Hook::PropsChange, move |_, args| {
                if let HookArgs::PropsChange { prev, next } = args {
                    if prev.is_loading && !next.is_loading {
                        cleared_by_props.set(false);
                    }
                }
                Ok(())
            })
    }
}

impl Default for InfiniteScrollPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> From<InfiniteScrollPlugin> for Plugin<T> {
    fn from(plugin: InfiniteScrollPlugin) -> Self {
        plugin.build()
    }
}
