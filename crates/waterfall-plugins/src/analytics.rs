//! Counts item clicks in the bus data store.

use std::any::Any;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use waterfall_plugin::{Hook, Plugin};

use crate::{CLICK_COUNTS_KEY, CLICK_EVENT};

/// Stored under [`CLICK_COUNTS_KEY`](crate::CLICK_COUNTS_KEY).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClickCounts {
    pub total: u64,
    pub per_item: FxHashMap<usize, u64>,
}

impl ClickCounts {
    pub fn count(&self, index: usize) -> u64 {
        self.per_item.get(&index).copied().unwrap_or(0)
    }
}

/// Payload of [`CLICK_EVENT`](crate::CLICK_EVENT).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClickEvent {
    pub index: usize,
    pub total: u64,
}

/// Records item clicks and renders the current [`ClickCounts`] as an overlay.
#[derive(Clone, Copy, Debug)]
pub struct ClickAnalyticsPlugin {
    log: bool,
}

impl ClickAnalyticsPlugin {
    pub const NAME: &'static str = "click-analytics";

    pub fn new() -> Self {
        Self { log: true }
    }

    /// Log every click at info level.
    pub fn log(mut self, enabled: bool) -> Self {
        self.log = enabled;
        self
    }

    pub fn build<T: 'static>(self) -> Plugin<T> {
        let log_clicks = self.log;
        Plugin::new(Self::NAME)
            .notify(Hook::Mount, |ctx, _| {
                ctx.bus.set_data(CLICK_COUNTS_KEY, ClickCounts::default());
                Ok(())
            })
            .notify(Hook::ItemClick, move |ctx, args| {
                let Some(index) = args.index() else {
                    return Ok(());
                };
                let mut total = 0;
                ctx.bus.update_data(CLICK_COUNTS_KEY, |counts: &mut ClickCounts| {
                    counts.total += 1;
                    *counts.per_item.entry(index).or_default() += 1;
                    total = counts.total;
                });
                ctx.bus.emit(CLICK_EVENT, &ClickEvent { index, total });
                if log_clicks {
                    log::info!("[waterfall] click analytics: item {index}, total {total}");
                }
                Ok(())
            })
            .render(Hook::RenderOverlay, |ctx, _| {
                let counts: ClickCounts = ctx.bus.get_data(CLICK_COUNTS_KEY)?;
                let overlay: Rc<dyn Any> = Rc::new(counts);
                Some(overlay)
            })
    }
}

impl Default for ClickAnalyticsPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> From<ClickAnalyticsPlugin> for Plugin<T> {
    fn from(plugin: ClickAnalyticsPlugin) -> Self {
        plugin.build()
    }
}
