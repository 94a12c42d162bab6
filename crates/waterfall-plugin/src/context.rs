//! Read-mostly snapshot handed to plugin handlers.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::future::{self, Future};
use std::ops::Range;
use std::rc::Rc;

use waterfall_core::{
    BoxMetrics, ItemPosition, LayoutState, PositionMap, ScrollToOptions, Size, ViewportState,
    WaterfallError,
};

use crate::bus::PluginBus;
use crate::props::WaterfallProps;

/// Deferred request from a plugin to its composition.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Relayout,
    ScrollToItem(usize, ScrollToOptions),
    ScrollToTop(ScrollToOptions),
    ScrollToBottom(ScrollToOptions),
    ForceUpdate,
}

/// Queue of actions plugins request while a dispatch is in progress.
///
/// The composition drains the queue once the dispatch has returned, so plugins
/// never re-enter it.
#[derive(Clone, Default)]
pub struct PluginActions {
    queue: Rc<RefCell<VecDeque<Command>>>,
    metrics: Option<Rc<dyn BoxMetrics>>,
}

impl PluginActions {
    pub fn new(metrics: Option<Rc<dyn BoxMetrics>>) -> Self {
        Self {
            queue: Rc::default(),
            metrics,
        }
    }

    pub fn relayout(&self) {
        self.push(Command::Relayout);
    }

    pub fn scroll_to_item(&self, index: usize, options: ScrollToOptions) {
        self.push(Command::ScrollToItem(index, options));
    }

    pub fn scroll_to_top(&self, options: ScrollToOptions) {
        self.push(Command::ScrollToTop(options));
    }

    pub fn scroll_to_bottom(&self, options: ScrollToOptions) {
        self.push(Command::ScrollToBottom(options));
    }

    pub fn force_update(&self) {
        self.push(Command::ForceUpdate);
    }

    /// Current rendered size of the item at `index`.
    pub fn measure_item(
        &self,
        index: usize,
    ) -> impl Future<Output = Result<Size, WaterfallError>> + 'static {
        let size = self
            .metrics
            .as_ref()
            .and_then(|metrics| metrics.item_size(index))
            .ok_or(WaterfallError::UnknownItem(index));
        future::ready(size)
    }

    pub fn take_commands(&self) -> Vec<Command> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn has_commands(&self) -> bool {
        !self.queue.borrow().is_empty()
    }

    fn push(&self, command: Command) {
        self.queue.borrow_mut().push_back(command);
    }
}

impl fmt::Debug for PluginActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginActions")
            .field("queued", &self.queue.borrow().len())
            .finish()
    }
}

/// Lifecycle flags of the composition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContextFlags {
    pub is_layouting: bool,
    pub is_scrolling: bool,
    pub is_loading: bool,
    pub has_more: bool,
}

/// Snapshot assembled for every dispatch.
pub struct PluginContext<T> {
    pub props: Rc<WaterfallProps<T>>,
    pub layout: Rc<LayoutState>,
    pub positions: Rc<PositionMap>,
    pub viewport: ViewportState,
    pub visible_items: Rc<[usize]>,
    pub visible_range: Option<Range<usize>>,
    pub flags: ContextFlags,
    pub bus: PluginBus,
    pub actions: PluginActions,
}

impl<T> PluginContext<T> {
    /// Context with no layout yet, for code that runs before a composition exists.
    pub fn detached(props: WaterfallProps<T>, bus: PluginBus) -> Self {
        let flags = ContextFlags {
            is_loading: props.is_loading,
            has_more: props.has_more,
            ..ContextFlags::default()
        };
        Self {
            props: Rc::new(props),
            layout: Rc::default(),
            positions: Rc::default(),
            viewport: ViewportState::default(),
            visible_items: Rc::from(Vec::new()),
            visible_range: None,
            flags,
            bus,
            actions: PluginActions::default(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.props.items
    }

    pub fn item_count(&self) -> usize {
        self.props.items.len()
    }

    pub fn item_position(&self, index: usize) -> Option<ItemPosition> {
        self.positions.get(index).copied()
    }
}

impl<T> Clone for PluginContext<T> {
    fn clone(&self) -> Self {
        Self {
            props: Rc::clone(&self.props),
            layout: Rc::clone(&self.layout),
            positions: Rc::clone(&self.positions),
            viewport: self.viewport,
            visible_items: Rc::clone(&self.visible_items),
            visible_range: self.visible_range.clone(),
            flags: self.flags,
            bus: self.bus.clone(),
            actions: self.actions.clone(),
        }
    }
}

impl<T> fmt::Debug for PluginContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("items", &self.props.items.len())
            .field("layout", &self.layout)
            .field("viewport", &self.viewport)
            .field("visible_range", &self.visible_range)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
