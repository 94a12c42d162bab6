//! Imperative surface exposed to the host, and the interaction entry points.

use std::any::Any;
use std::future::Future;
use std::rc::Rc;

use waterfall_core::{
    ColumnHeights, ItemPosition, LayoutState, PositionMap, ScrollRequest, ScrollToOptions, Size,
    ViewportState, WaterfallError,
};
use waterfall_plugin::{Hook, HookArgs, HookClass, HookValue, Plugin};

use super::Waterfall;

impl<T: Clone + 'static> Waterfall<T> {
    /// Requests a layout pass on the next pump.
    pub fn relayout(&mut self) {
        self.request_pass();
    }

    /// Queues a scroll that brings `index` into view.
    pub fn scroll_to_item(
        &mut self,
        index: usize,
        options: ScrollToOptions,
    ) -> Result<(), WaterfallError> {
        let position = self
            .positions
            .get(index)
            .filter(|_| index < self.props.items.len())
            .ok_or(WaterfallError::UnknownItem(index))?;
        let viewport = self.tracker.state();
        let top = options.target_for(position, viewport.client_height, viewport.scroll_top);
        self.push_scroll(top, options);
        Ok(())
    }

    pub fn scroll_to_top(&mut self, options: ScrollToOptions) {
        self.push_scroll(options.offset, options);
    }

    pub fn scroll_to_bottom(&mut self, options: ScrollToOptions) {
        let viewport = self.tracker.state();
        let top = self.layout.total_height - viewport.client_height + options.offset;
        self.push_scroll(top, options);
    }

    /// Scrolls the host should perform, oldest first.
    pub fn take_scroll_requests(&mut self) -> Vec<ScrollRequest> {
        std::mem::take(&mut self.scroll_requests)
    }

    pub fn item_position(&self, index: usize) -> Option<ItemPosition> {
        self.positions.get(index).copied()
    }

    pub fn all_item_positions(&self) -> Rc<PositionMap> {
        Rc::clone(&self.positions)
    }

    pub fn column_heights(&self) -> ColumnHeights {
        self.layout.column_heights.clone()
    }

    pub fn layout_info(&self) -> Rc<LayoutState> {
        Rc::clone(&self.layout)
    }

    pub fn viewport_info(&self) -> ViewportState {
        self.tracker.state()
    }

    /// Current rendered size of the item at `index`.
    pub fn measure_item(
        &self,
        index: usize,
    ) -> impl Future<Output = Result<Size, WaterfallError>> + 'static {
        self.actions.measure_item(index)
    }

    /// Asks the host to re-render without a new layout.
    pub fn force_update(&mut self) {
        self.version += 1;
    }

    pub fn render_version(&self) -> u64 {
        self.version
    }

    pub fn item_click(&mut self, index: usize) -> Result<(), WaterfallError> {
        let items = Rc::clone(&self.props.items);
        let item = items.get(index).ok_or(WaterfallError::UnknownItem(index))?;
        let ctx = self.context();
        self.manager
            .notify(Hook::ItemClick, &ctx, &HookArgs::ItemClick { index, item });
        self.flush();
        Ok(())
    }

    pub fn drag_start(&mut self, index: usize) {
        self.dispatch_item(Hook::DragStart, index);
    }

    pub fn drag(&mut self, index: usize) {
        self.dispatch_item(Hook::Drag, index);
    }

    pub fn drag_end(&mut self, index: usize) {
        self.dispatch_item(Hook::DragEnd, index);
    }

    pub fn drop_item(&mut self, from: usize, to: usize) {
        let ctx = self.context();
        self.manager
            .notify(Hook::Drop, &ctx, &HookArgs::Drop { from, to });
        self.flush();
    }

    /// Adds or removes `index` from the selection.
    pub fn select_item(&mut self, index: usize, selected: bool) {
        let changed = match (self.selection.binary_search(&index), selected) {
            (Err(slot), true) => {
                self.selection.insert(slot, index);
                true
            }
            (Ok(slot), false) => {
                self.selection.remove(slot);
                true
            }
            _ => false,
        };
        let ctx = self.context();
        self.manager
            .notify(Hook::ItemSelect, &ctx, &HookArgs::ItemSelect { index, selected });
        if changed {
            let selection = self.selection.clone();
            let ctx = self.context();
            self.manager.notify(
                Hook::SelectionChange,
                &ctx,
                &HookArgs::SelectionChange {
                    selected: &selection,
                },
            );
        }
        self.flush();
    }

    /// Selected indices, ascending.
    pub fn selected_items(&self) -> &[usize] {
        &self.selection
    }

    /// Asks the `load_more` hook for the next page and appends what it returns.
    /// Returns true when items were appended.
    pub fn load_more(&mut self) -> bool {
        let page = self.load_page + 1;
        let ctx = self.context();
        let value = self
            .manager
            .dispatch_override(Hook::LoadMore, &ctx, &HookArgs::LoadMore { page });
        let appended = match value {
            Some(HookValue::Items(more)) => {
                let mut items: Vec<T> = self.source.items.to_vec();
                items.extend(more);
                self.load_page = page;
                self.set_items(items);
                true
            }
            Some(other) => {
                log::warn!("[waterfall] load_more returned {other:?}");
                false
            }
            None => false,
        };
        self.flush();
        appended
    }

    /// Asks the `refresh` hook for a replacement list. Returns true when the
    /// list was replaced.
    pub fn refresh(&mut self) -> bool {
        let ctx = self.context();
        let value = self
            .manager
            .dispatch_override(Hook::Refresh, &ctx, &HookArgs::None);
        let replaced = match value {
            Some(HookValue::Items(items)) => {
                self.load_page = 1;
                self.set_items(items);
                true
            }
            Some(other) => {
                log::warn!("[waterfall] refresh returned {other:?}");
                false
            }
            None => false,
        };
        self.flush();
        replaced
    }

    /// Reports that the host failed to load the content of `index`.
    pub fn report_item_load_error(&mut self, index: usize, message: &str) {
        let ctx = self.context();
        self.manager.notify(
            Hook::ItemLoadError,
            &ctx,
            &HookArgs::ItemLoadError { index, message },
        );
        self.flush();
    }

    /// Collects the values of a render hook that takes no arguments.
    pub fn render_layer(&mut self, hook: Hook) -> Vec<Rc<dyn Any>> {
        if hook.class() != HookClass::Render {
            log::warn!("[waterfall] {hook} is not a render hook");
            return Vec::new();
        }
        self.collect(hook, &HookArgs::None)
    }

    pub fn render_item_wrapper(&mut self, index: usize) -> Vec<Rc<dyn Any>> {
        self.collect(Hook::RenderItemWrapper, &HookArgs::Item { index })
    }

    pub fn render_error(&mut self, error: &WaterfallError) -> Vec<Rc<dyn Any>> {
        self.collect(Hook::RenderError, &HookArgs::Error(error))
    }

    pub fn register_plugin(&mut self, plugin: Plugin<T>) {
        let ctx = self.context();
        self.manager.register(plugin, &ctx);
        self.plugins_changed();
    }

    pub fn register_plugins(&mut self, plugins: impl IntoIterator<Item = Plugin<T>>) {
        let ctx = self.context();
        self.manager.register_all(plugins, &ctx);
        self.plugins_changed();
    }

    pub fn unregister_plugin(&mut self, name: &str) -> bool {
        let removed = self.manager.unregister(name);
        if removed {
            self.plugins_changed();
        }
        removed
    }

    pub fn enable_plugin(&mut self, name: &str) -> bool {
        let found = self.manager.enable(name);
        if found {
            self.plugins_changed();
        }
        found
    }

    pub fn disable_plugin(&mut self, name: &str) -> bool {
        let found = self.manager.disable(name);
        if found {
            self.plugins_changed();
        }
        found
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.manager.names()
    }

    pub fn is_plugin_enabled(&self, name: &str) -> bool {
        self.manager.is_enabled(name)
    }

    fn collect(&mut self, hook: Hook, args: &HookArgs<'_, T>) -> Vec<Rc<dyn Any>> {
        let ctx = self.context();
        let rendered = self.manager.collect(hook, &ctx, args);
        self.flush();
        rendered
    }

    fn dispatch_item(&mut self, hook: Hook, index: usize) {
        let ctx = self.context();
        self.manager.notify(hook, &ctx, &HookArgs::Item { index });
        self.flush();
    }

    fn push_scroll(&mut self, top: f32, options: ScrollToOptions) {
        self.scroll_requests.push(ScrollRequest {
            top: top.max(0.0),
            behavior: options.behavior,
        });
    }

    /// The transform chain may have changed; re-derive from the host props.
    fn plugins_changed(&mut self) {
        if self.mounted {
            let source = self.source.clone();
            self.set_props(source);
        } else {
            self.flush();
        }
    }
}
