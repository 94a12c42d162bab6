//! Shows one page of the item list at a time.
//!
//! The page comes from `WaterfallProps::page_index` (1-based) and the size from
//! `WaterfallProps::page_size`, falling back to the plugin's default.

use waterfall_core::ScrollToOptions;
use waterfall_plugin::{DerivedItems, Hook, HookArgs, Plugin};

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Clone, Debug)]
pub struct PaginationPlugin {
    page_size: usize,
    scroll_to_top: bool,
    scroll_options: ScrollToOptions,
}

impl PaginationPlugin {
    pub const NAME: &'static str = "pagination";

    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            scroll_to_top: false,
            scroll_options: ScrollToOptions::default(),
        }
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn scroll_to_top(mut self, enabled: bool) -> Self {
        self.scroll_to_top = enabled;
        self
    }

    pub fn scroll_options(mut self, options: ScrollToOptions) -> Self {
        self.scroll_options = options;
        self
    }

    pub fn build<T: Clone + 'static>(self) -> Plugin<T> {
        let Self {
            page_size: default_size,
            scroll_to_top,
            scroll_options,
        } = self;
        let mut derived = DerivedItems::new();
        let plugin = Plugin::new(Self::NAME).transform_props(move |props, _| {
            let page = props.page_index.max(1);
            let size = props.page_size.unwrap_or(default_size).max(1);
            let start = (page - 1).saturating_mul(size).min(props.items.len());
            let end = start.saturating_add(size).min(props.items.len());
            let items = derived.pick(&props.items, (start..end).collect());
            Ok(props.with_items(items))
        });
        if !scroll_to_top {
            return plugin;
        }
        plugin.notify(Hook::PropsChange, move |ctx, args| {
            if let HookArgs::PropsChange { prev, next } = args {
                if prev.page_index.max(1) != next.page_index.max(1) {
                    ctx.actions.scroll_to_top(scroll_options);
                }
            }
            Ok(())
        })
    }
}

impl Default for PaginationPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> From<PaginationPlugin> for Plugin<T> {
    fn from(plugin: PaginationPlugin) -> Self {
        plugin.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, transform};
    use waterfall_plugin::{Command, PluginManager, WaterfallProps};

    fn numbers(count: usize) -> WaterfallProps<usize> {
        WaterfallProps::new((0..count).collect::<Vec<_>>())
    }

    #[test]
    fn test_default_page_size() {
        let sliced = transform(PaginationPlugin::new().build(), numbers(45), None);
        assert_eq!(sliced.items.len(), DEFAULT_PAGE_SIZE);
        assert_eq!(sliced.items[0], 0);
    }

    #[test]
    fn test_pages_are_one_based() {
        let mut props = numbers(45);
        props.page_index = 3;
        props.page_size = Some(10);
        let sliced = transform(PaginationPlugin::new().build(), props, None);
        assert_eq!(&*sliced.items, &[20, 21, 22, 23, 24, 25, 26, 27, 28, 29]);

        let mut zero = numbers(5);
        zero.page_index = 0;
        let first = transform(PaginationPlugin::new().page_size(2).build(), zero, None);
        assert_eq!(&*first.items, &[0, 1]);
    }

    #[test]
    fn test_last_and_past_last_page() {
        let mut props = numbers(45);
        props.page_index = 5;
        props.page_size = Some(10);
        let last = transform(PaginationPlugin::new().build(), props.clone(), None);
        assert_eq!(&*last.items, &[40, 41, 42, 43, 44]);

        props.page_index = 9;
        let past = transform(PaginationPlugin::new().build(), props, None);
        assert!(past.items.is_empty());
    }

    #[test]
    fn test_single_page_keeps_identity() {
        let props = numbers(5);
        let result = transform(PaginationPlugin::new().build(), props.clone(), None);
        assert!(result.same_items(&props));
    }

    #[test]
    fn test_same_page_keeps_identity() {
        let ctx = context(numbers(0));
        let mut manager = PluginManager::new();
        manager.register(PaginationPlugin::new().page_size(10).build(), &ctx);
        let env = waterfall_plugin::TransformEnv::default();
        let mut props = numbers(30);
        props.page_index = 2;

        let first = manager.transform_props(props.clone(), &env);
        props.has_more = true;
        let second = manager.transform_props(props.clone(), &env);
        assert!(second.same_items(&first));

        props.page_index = 3;
        let third = manager.transform_props(props, &env);
        assert_eq!(third.items[0], 20);
        assert!(!third.same_items(&first));
    }

    #[test]
    fn test_page_change_scrolls_to_top() {
        let ctx = context(numbers(0));
        let mut manager = PluginManager::new();
        manager.register(PaginationPlugin::new().scroll_to_top(true).build(), &ctx);
        let prev = numbers(50);
        let mut next = prev.clone();
        next.page_index = 2;
        manager.notify(
            Hook::PropsChange,
            &ctx,
            &HookArgs::PropsChange { prev: &prev, next: &next },
        );
        assert_eq!(
            ctx.actions.take_commands(),
            vec![Command::ScrollToTop(ScrollToOptions::default())]
        );
    }
}
