//! Case-insensitive substring search driven by `WaterfallProps::search_query`.

use waterfall_core::ScrollToOptions;
use waterfall_plugin::{DerivedItems, Hook, HookArgs, Plugin};

type Field<T> = Box<dyn Fn(&T) -> String>;

pub struct SearchPlugin<T> {
    fields: Vec<Field<T>>,
    scroll_to_top: bool,
    scroll_options: ScrollToOptions,
}

impl<T: Clone + 'static> SearchPlugin<T> {
    pub const NAME: &'static str = "search";

    /// Searches the text `field` extracts from each item.
    pub fn new(field: impl Fn(&T) -> String + 'static) -> Self {
        Self {
            fields: vec![Box::new(field)],
            scroll_to_top: false,
            scroll_options: ScrollToOptions::default(),
        }
    }

    /// Adds another searchable field. An item matches if any field does.
    pub fn field(mut self, field: impl Fn(&T) -> String + 'static) -> Self {
        self.fields.push(Box::new(field));
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

    pub fn build(self) -> Plugin<T> {
        let Self {
            fields,
            scroll_to_top,
            scroll_options,
        } = self;
        let mut derived = DerivedItems::new();
        let plugin = Plugin::new(Self::NAME).transform_props(move |props, _| {
            let query = props
                .search_query
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_lowercase();
            if query.is_empty() {
                return Ok(props);
            }
            let kept: Vec<usize> = props
                .items
                .iter()
                .enumerate()
                .filter(|(_, item)| {
                    fields
                        .iter()
                        .any(|field| field(*item).to_lowercase().contains(&query))
                })
                .map(|(index, _)| index)
                .collect();
            log::trace!(
                "[waterfall] search `{query}` kept {} of {} items",
                kept.len(),
                props.items.len()
            );
            let items = derived.pick(&props.items, kept);
            Ok(props.with_items(items))
        });
        if !scroll_to_top {
            return plugin;
        }
        plugin.notify(Hook::PropsChange, move |ctx, args| {
            if let HookArgs::PropsChange { prev, next } = args {
                if prev.search_query != next.search_query {
                    ctx.actions.scroll_to_top(scroll_options);
                }
            }
            Ok(())
        })
    }
}

impl<T: Clone + 'static> From<SearchPlugin<T>> for Plugin<T> {
    fn from(plugin: SearchPlugin<T>) -> Self {
        plugin.build()
    }
}
