//! The composition shell.
//!
//! [`Waterfall`] owns the committed layout, the viewport tracker, the
//! virtualization overlay and the plugin pipeline, and drives them from host
//! notifications. All work is cooperative: notifications record state and
//! schedule timers, and [`Waterfall::pump`] advances whatever is due.

mod pass;
mod surface;

use std::ops::Range;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Waker};

use rustc_hash::{FxHashMap, FxHashSet};
use waterfall_core::{
    BoxMetrics, Clock, DeferredTask, ItemVisibility, LayoutState, PositionMap, ScrollMetrics,
    ScrollRequest, Size, SkipReason, SystemClock, WaterfallError,
};
use waterfall_foundation::{placeholder_height, MeasureOutcome, ViewportTracker, VirtualizationOverlay};
use waterfall_plugin::{
    Command, ContextFlags, DerivedItems, Hook, HookArgs, HookValue, PendingVeto,
    PerformanceMetrics, PluginActions, PluginBus, PluginContext, PluginManager, TransformEnv, VetoOutcome,
    WaterfallProps,
};

use crate::phase::{LayoutPhase, PassState};
use crate::render::{Frame, ItemRenderer, Positioned};
use crate::signal::PumpSignal;

/// Bus event emitted after every committed layout, with the new `LayoutState`.
pub const LAYOUT_COMPLETE_EVENT: &str = "layout:complete";

/// An items change waiting on an asynchronous `before_items_change` veto.
struct PendingItemsChange<T> {
    veto: PendingVeto,
    source: WaterfallProps<T>,
    derived: WaterfallProps<T>,
}

/// Where a props update came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PropsOrigin {
    /// `set_props` / `set_items` and data hooks.
    Host,
    /// Re-run of the transform chain after the environment changed. The list
    /// keeps its identity as long as its length is unchanged.
    Environment,
}

pub struct Waterfall<T: 'static> {
    manager: PluginManager<T>,
    bus: PluginBus,
    actions: PluginActions,
    metrics: Rc<dyn BoxMetrics>,
    clock: Rc<dyn Clock>,
    /// Props as supplied by the host.
    source: WaterfallProps<T>,
    /// Props after transforms and item hooks; what layout reads.
    props: Rc<WaterfallProps<T>>,
    filtered: DerivedItems<T>,
    sorted: DerivedItems<T>,
    layout: Rc<LayoutState>,
    positions: Rc<PositionMap>,
    tracker: ViewportTracker,
    overlay: VirtualizationOverlay,
    debounce: DeferredTask,
    pass: PassState,
    /// A pass was requested while another was in flight.
    rerequest: bool,
    pending_items: Option<PendingItemsChange<T>>,
    scroll_requests: Vec<ScrollRequest>,
    rendered: Vec<usize>,
    visibility: FxHashMap<usize, ItemVisibility>,
    visible: Rc<[usize]>,
    selection: Vec<usize>,
    performance: PerformanceMetrics,
    load_page: usize,
    version: u64,
    signal: Arc<PumpSignal>,
    waker: Waker,
    mounted: bool,
}

impl<T: Clone + 'static> Waterfall<T> {
    pub fn new(props: WaterfallProps<T>, metrics: Rc<dyn BoxMetrics>) -> Self {
        let signal = Arc::new(PumpSignal::default());
        let waker = signal.waker();
        let tracker = ViewportTracker::new(props.viewport.clone());
        let overlay = VirtualizationOverlay::new(props.virtualization.clone().unwrap_or_default());
        Self {
            manager: PluginManager::new(),
            bus: PluginBus::new(),
            actions: PluginActions::new(Some(Rc::clone(&metrics))),
            metrics,
            clock: Rc::new(SystemClock::new()),
            props: Rc::new(props.clone()),
            source: props,
            filtered: DerivedItems::new(),
            sorted: DerivedItems::new(),
            layout: Rc::default(),
            positions: Rc::default(),
            tracker,
            overlay,
            debounce: DeferredTask::new(),
            pass: PassState::Idle,
            rerequest: false,
            pending_items: None,
            scroll_requests: Vec::new(),
            rendered: Vec::new(),
            visibility: FxHashMap::default(),
            visible: Rc::from(Vec::new()),
            selection: Vec::new(),
            performance: PerformanceMetrics::default(),
            load_page: 1,
            version: 0,
            signal,
            waker,
            mounted: false,
        }
    }

    /// Replaces the time source. Hosts with their own frame clock and tests
    /// pass a [`waterfall_core::ManualClock`].
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn bus(&self) -> &PluginBus {
        &self.bus
    }

    /// Props after transforms and item hooks.
    pub fn props(&self) -> &WaterfallProps<T> {
        &self.props
    }

    /// Props as last supplied by the host.
    pub fn source_props(&self) -> &WaterfallProps<T> {
        &self.source
    }

    pub fn items(&self) -> &[T] {
        &self.props.items
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn phase(&self) -> LayoutPhase {
        self.pass.phase()
    }

    /// Committed layout passes since construction.
    pub fn layout_count(&self) -> u64 {
        self.performance.layout_count
    }

    pub fn performance(&self) -> PerformanceMetrics {
        self.performance
    }

    /// True when an items change is waiting on an asynchronous veto.
    pub fn has_pending_items_change(&self) -> bool {
        self.pending_items.is_some()
    }

    /// Earliest timer deadline, if any timer is armed.
    pub fn next_deadline(&self) -> Option<std::time::Duration> {
        [
            self.debounce.deadline(),
            self.tracker.next_deadline(),
            self.overlay.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// True when a polled future has signalled progress since the last call.
    pub fn take_wake(&self) -> bool {
        self.signal.take()
    }

    /// Mounts the composition: derives props, dispatches `mount` and requests
    /// the first layout pass without waiting for the debounce.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        if let Some(size) = self.metrics.container_size() {
            self.tracker.on_resize(size);
        }
        let source = self.source.clone();
        let derived = self.derive(&source);
        self.props = Rc::new(derived);
        self.apply_configs();
        log::debug!("[waterfall] mounted with {} items", self.props.items.len());

        let ctx = self.context();
        self.manager.notify(Hook::Mount, &ctx, &HookArgs::None);
        self.request_pass();
        self.flush();
    }

    /// Tears the composition down: dispatches `unmount`, releases measurement
    /// subscriptions and unregisters every plugin.
    pub fn destroy(&mut self) {
        if !self.mounted {
            return;
        }
        let ctx = self.context();
        self.manager.notify(Hook::Unmount, &ctx, &HookArgs::None);
        self.overlay.release(&*self.metrics);
        self.debounce.cancel();
        self.pending_items = None;
        self.pass = PassState::Idle;
        self.rerequest = false;
        self.rendered.clear();
        self.visibility.clear();
        self.forward_failures();
        self.manager.clear();
        self.bus.clear();
        self.mounted = false;
        let mut cx = Context::from_waker(&self.waker);
        self.manager.poll_teardowns(&mut cx);
        log::debug!("[waterfall] destroyed");
    }

    /// Replaces the host props.
    ///
    /// The transform chain and item hooks run first. When the resulting item
    /// list differs, `before_items_change` may veto (possibly asynchronously)
    /// before anything is committed.
    pub fn set_props(&mut self, props: WaterfallProps<T>) {
        if let Some(superseded) = self.pending_items.take() {
            log::debug!(
                "[waterfall] items change awaiting `{}` superseded",
                superseded.veto.plugin()
            );
        }
        let derived = self.derive(&props);
        if !self.mounted || derived.same_items(&self.props) {
            self.commit_props(props, derived, PropsOrigin::Host);
            self.flush();
            return;
        }

        let ctx = self.context();
        let args = HookArgs::ItemsChange {
            old: &self.props.items,
            new: &derived.items,
        };
        match self.manager.dispatch_veto(Hook::BeforeItemsChange, &ctx, &args) {
            VetoOutcome::Allowed => self.commit_props(props, derived, PropsOrigin::Host),
            VetoOutcome::Vetoed { plugin } => WaterfallError::VetoAbort { plugin }.report(),
            VetoOutcome::Pending(veto) => {
                self.pending_items = Some(PendingItemsChange {
                    veto,
                    source: props,
                    derived,
                });
            }
        }
        self.flush();
    }

    /// Replaces the item list, keeping every other prop.
    pub fn set_items(&mut self, items: impl Into<Rc<[T]>>) {
        let props = self.source.clone().with_items(items);
        self.set_props(props);
    }

    /// The scroll container changed size. Re-runs transforms against the new
    /// size and debounces a layout pass.
    pub fn notify_container_resize(&mut self) {
        let Some(size) = self.metrics.container_size() else {
            WaterfallError::PreconditionNotMet(SkipReason::NoContainerMetrics).report();
            return;
        };
        self.tracker.on_resize(size);
        if !self.mounted {
            return;
        }
        let ctx = self.context();
        self.manager.notify(Hook::Resize, &ctx, &HookArgs::Resize(size));

        let source = self.source.clone();
        let derived = self.derive(&source);
        self.commit_props(source, derived, PropsOrigin::Environment);
        self.flush();
    }

    /// New scroll metrics from the host's scroll container.
    pub fn notify_scroll(&mut self, metrics: ScrollMetrics) {
        let now = self.clock.now();
        let update = self.tracker.on_scroll(metrics, now);
        if !self.mounted {
            return;
        }
        let ctx = self.context();
        if update.started {
            self.manager.notify(Hook::ScrollStart, &ctx, &HookArgs::None);
        }
        self.manager.notify(
            Hook::Scroll,
            &ctx,
            &HookArgs::Scroll {
                top: metrics.scroll_top,
                left: metrics.scroll_left,
            },
        );
        if let Some(distance) = update.reached_bottom {
            self.manager
                .notify(Hook::ReachBottom, &ctx, &HookArgs::ReachBottom { distance });
        }
        if update.reached_top {
            self.manager.notify(Hook::ReachTop, &ctx, &HookArgs::None);
        }
        self.refresh_visibility();
        self.flush();
    }

    /// Size-change notification for a subscribed item.
    pub fn notify_item_resize(&mut self, index: usize, size: Size) {
        if !self.mounted {
            return;
        }
        let ctx = self.context();
        self.manager
            .notify(Hook::ItemResize, &ctx, &HookArgs::ItemResize { index, size });
        if self.props.virtualization.is_some() {
            let now = self.clock.now();
            match self
                .overlay
                .on_item_resize(&*self.metrics, index, size.height, now)
            {
                MeasureOutcome::Changed { previous, height } => log::trace!(
                    "[waterfall] item {index} height {previous:?} -> {height}, recompute scheduled"
                ),
                MeasureOutcome::Settled => {
                    log::trace!("[waterfall] item {index} settled, unsubscribed")
                }
                MeasureOutcome::Unchanged { .. } | MeasureOutcome::Ignored => {}
            }
        }
        self.flush();
    }

    /// Advances every due timer and suspended operation. Returns true when
    /// anything progressed.
    pub fn pump(&mut self) -> bool {
        let now = self.clock.now();
        let waker = self.waker.clone();
        let mut cx = Context::from_waker(&waker);
        let mut progressed = self.manager.poll_teardowns(&mut cx);
        if !self.mounted {
            return progressed;
        }

        if self.tracker.poll(now) {
            let ctx = self.context();
            self.manager.notify(Hook::ScrollEnd, &ctx, &HookArgs::None);
            self.refresh_visibility();
            progressed = true;
        }
        if self.overlay.poll(now) {
            log::debug!("[waterfall] measured heights changed, recomputing layout");
            self.request_pass();
            progressed = true;
        }
        if self.debounce.take_due(now) {
            self.request_pass();
            progressed = true;
        }
        progressed |= self.resume_items_change(&mut cx);
        progressed |= self.step_pass(&mut cx);
        self.flush();
        progressed
    }

    /// Current frame: the rendered subset with positions.
    ///
    /// Emits `item_mount` / `item_unmount` for changes in the rendered set and
    /// keeps measurement subscriptions in line with it.
    pub fn frame(&mut self) -> Frame {
        let count = self.props.items.len();
        let has_layout = !self.positions.is_empty();
        if self.metrics.container_size().is_none() || (count > 0 && !has_layout) {
            self.update_rendered(Vec::new());
            self.flush();
            return Frame {
                items: Vec::new(),
                total_height: placeholder_height(
                    count,
                    self.props.columns,
                    self.props.estimate(),
                    self.props.effective_row_gap(),
                ),
                placeholder: true,
                version: self.version,
            };
        }

        let rendered = self.rendered_indices();
        self.update_rendered(rendered.clone());
        let items = rendered
            .into_iter()
            .filter_map(|index| {
                self.positions.get(index).map(|position| Positioned {
                    index,
                    position: *position,
                    content: (),
                })
            })
            .collect();
        self.flush();
        Frame {
            items,
            total_height: self.layout.total_height,
            placeholder: false,
            version: self.version,
        }
    }

    /// [`Waterfall::frame`] with every rendered item passed through `renderer`.
    pub fn render_with<O, R>(&mut self, renderer: &mut R) -> Frame<O>
    where
        R: ItemRenderer<T, O>,
    {
        let frame = self.frame();
        let items = Rc::clone(&self.props.items);
        frame.map(|index| renderer.render(&items[index], index))
    }

    /// Snapshot handed to plugin handlers.
    pub fn context(&self) -> PluginContext<T> {
        PluginContext {
            props: Rc::clone(&self.props),
            layout: Rc::clone(&self.layout),
            positions: Rc::clone(&self.positions),
            viewport: self.tracker.state(),
            visible_items: Rc::clone(&self.visible),
            visible_range: self.rendered_range(),
            flags: ContextFlags {
                is_layouting: self.pass.phase().is_in_flight(),
                is_scrolling: self.tracker.is_scrolling(),
                is_loading: self.props.is_loading,
                has_more: self.props.has_more,
            },
            bus: self.bus.clone(),
            actions: self.actions.clone(),
        }
    }

    /// Transform chain, then the per-item filter/search hooks and the sort hook.
    fn derive(&mut self, source: &WaterfallProps<T>) -> WaterfallProps<T> {
        let env = TransformEnv {
            container: self.metrics.container_size(),
        };
        let derived = self.manager.transform_props(source.clone(), &env);
        let derived = self.filter_items(derived);
        self.sort_items(derived)
    }

    fn filter_items(&mut self, props: WaterfallProps<T>) -> WaterfallProps<T> {
        let query = props.search_query.clone().filter(|q| !q.is_empty());
        let filter = self.manager.handles(Hook::FilterItem);
        let search = query.is_some() && self.manager.handles(Hook::SearchItem);
        if !filter && !search {
            return props;
        }

        let ctx = self.context();
        let mut kept = Vec::with_capacity(props.items.len());
        let items = Rc::clone(&props.items);
        for (index, item) in items.iter().enumerate() {
            if filter
                && !self
                    .manager
                    .check(Hook::FilterItem, &ctx, &HookArgs::FilterItem { index, item })
            {
                continue;
            }
            if let (true, Some(query)) = (search, query.as_deref()) {
                let args = HookArgs::SearchItem { index, item, query };
                if !self.manager.check(Hook::SearchItem, &ctx, &args) {
                    continue;
                }
            }
            kept.push(index);
        }
        let items = self.filtered.pick(&items, kept);
        props.with_items(items)
    }

    fn sort_items(&mut self, props: WaterfallProps<T>) -> WaterfallProps<T> {
        if !self.manager.handles(Hook::SortItems) {
            return props;
        }
        let ctx = self.context();
        let args = HookArgs::SortItems {
            items: &props.items,
        };
        let order = match self.manager.dispatch_override(Hook::SortItems, &ctx, &args) {
            Some(HookValue::Order(order)) => order,
            Some(other) => {
                log::warn!("[waterfall] sort_items returned {other:?}, expected an order");
                return props;
            }
            None => return props,
        };
        if !is_permutation(&order, props.items.len()) {
            log::warn!(
                "[waterfall] sort_items order of {} entries is not a permutation of {} items",
                order.len(),
                props.items.len()
            );
            return props;
        }
        let items = self.sorted.pick(&props.items, order);
        props.with_items(items)
    }

    fn commit_props(
        &mut self,
        source: WaterfallProps<T>,
        derived: WaterfallProps<T>,
        origin: PropsOrigin,
    ) {
        let previous = std::mem::replace(&mut self.props, Rc::new(derived));
        self.source = source;
        let replaced = !self.props.same_items(&previous)
            && (origin == PropsOrigin::Host || self.props.items.len() != previous.items.len());
        self.apply_configs();
        if !self.mounted {
            return;
        }

        if replaced {
            self.reset_list_state();
        }
        let ctx = self.context();
        if replaced {
            self.manager.notify(
                Hook::ItemsChange,
                &ctx,
                &HookArgs::ItemsChange {
                    old: &previous.items,
                    new: &self.props.items,
                },
            );
        }
        self.manager.notify(
            Hook::PropsChange,
            &ctx,
            &HookArgs::PropsChange {
                prev: &previous,
                next: &self.props,
            },
        );
        self.schedule_pass();
    }

    fn apply_configs(&mut self) {
        self.tracker.set_config(self.props.viewport.clone());
        if let Some(config) = &self.props.virtualization {
            self.overlay.set_config(config.clone(), &*self.metrics);
        }
    }

    /// New list identity: indices now name different items.
    fn reset_list_state(&mut self) {
        let ctx = self.context();
        for index in std::mem::take(&mut self.rendered) {
            self.manager
                .notify(Hook::ItemUnmount, &ctx, &HookArgs::Item { index });
        }
        self.visibility.clear();
        self.visible = Rc::from(Vec::new());
        self.selection.clear();
        self.overlay.replace_list(&*self.metrics);
    }

    fn resume_items_change(&mut self, cx: &mut Context<'_>) -> bool {
        let Some(PendingItemsChange {
            veto,
            source,
            derived,
        }) = self.pending_items.take()
        else {
            return false;
        };
        let ctx = self.context();
        let args = HookArgs::ItemsChange {
            old: &self.props.items,
            new: &derived.items,
        };
        match self.manager.resume_veto(veto, &ctx, &args, cx) {
            VetoOutcome::Pending(veto) => {
                self.pending_items = Some(PendingItemsChange {
                    veto,
                    source,
                    derived,
                });
                false
            }
            VetoOutcome::Allowed => {
                self.commit_props(source, derived, PropsOrigin::Host);
                true
            }
            VetoOutcome::Vetoed { plugin } => {
                WaterfallError::VetoAbort { plugin }.report();
                true
            }
        }
    }

    fn rendered_indices(&mut self) -> Vec<usize> {
        let count = self.props.items.len().min(self.positions.len());
        if self.manager.handles(Hook::CalculateVisibleRange) {
            let ctx = self.context();
            match self
                .manager
                .dispatch_override(Hook::CalculateVisibleRange, &ctx, &HookArgs::None)
            {
                Some(HookValue::VisibleRange(range)) => {
                    return (range.start.min(count)..range.end.min(count)).collect();
                }
                Some(other) => {
                    log::warn!("[waterfall] calculate_visible_range returned {other:?}")
                }
                None => {}
            }
        }
        let viewport = self.tracker.state();
        match &self.props.virtualization {
            Some(_) => self
                .overlay
                .window(&self.positions, &viewport)
                .into_iter()
                .filter(|&index| index < count)
                .collect(),
            None => (0..count).collect(),
        }
    }

    fn update_rendered(&mut self, next: Vec<usize>) {
        if next != self.rendered {
            let ctx = self.context();
            let previous: FxHashSet<usize> = self.rendered.iter().copied().collect();
            let current: FxHashSet<usize> = next.iter().copied().collect();
            for &index in self.rendered.iter().filter(|i| !current.contains(*i)) {
                self.manager
                    .notify(Hook::ItemUnmount, &ctx, &HookArgs::Item { index });
            }
            for &index in next.iter().filter(|i| !previous.contains(*i)) {
                self.manager
                    .notify(Hook::ItemMount, &ctx, &HookArgs::Item { index });
            }
            self.rendered = next;
        }
        if self.props.virtualization.is_some() {
            self.overlay
                .sync_subscriptions(&self.rendered, &*self.metrics);
        }
    }

    fn rendered_range(&self) -> Option<Range<usize>> {
        let first = *self.rendered.iter().min()?;
        let last = *self.rendered.iter().max()?;
        Some(first..last + 1)
    }

    /// Recomputes per-item visibility against the viewport (no overscan) and
    /// dispatches enter/leave/change hooks for the differences.
    fn refresh_visibility(&mut self) {
        let viewport = self.tracker.state();
        let count = self.props.items.len();
        let mut candidates: Vec<usize> = if viewport.client_height > 0.0 {
            waterfall_foundation::windowed_indices(&self.positions, &viewport, 0.0)
                .into_iter()
                .filter(|&index| index < count)
                .collect()
        } else {
            Vec::new()
        };
        candidates.extend(self.visibility.keys().copied());
        candidates.sort_unstable();
        candidates.dedup();

        let ctx = self.context();
        let mut next = FxHashMap::default();
        for index in candidates {
            let now = self
                .positions
                .get(index)
                .filter(|_| index < count)
                .map(|position| ItemVisibility::compute(index, position, &viewport))
                .unwrap_or(ItemVisibility {
                    index,
                    ..Default::default()
                });
            let before = self.visibility.get(&index).copied();
            let was_visible = before.is_some_and(|v| v.is_visible);
            let args = HookArgs::Visibility(now);
            if now.is_visible && !was_visible {
                self.manager.notify(Hook::ItemEnterViewport, &ctx, &args);
                self.manager.notify(Hook::ItemVisibilityChange, &ctx, &args);
            } else if !now.is_visible && was_visible {
                self.manager.notify(Hook::ItemLeaveViewport, &ctx, &args);
                self.manager.notify(Hook::ItemVisibilityChange, &ctx, &args);
            } else if before.is_some_and(|v| (v.visible_ratio - now.visible_ratio).abs() > 0.01) {
                self.manager.notify(Hook::ItemVisibilityChange, &ctx, &args);
            }
            if now.is_visible {
                next.insert(index, now);
            }
        }
        let mut visible: Vec<usize> = next.keys().copied().collect();
        visible.sort_unstable();
        self.visible = Rc::from(visible);
        self.visibility = next;
    }

    /// Applies actions plugins queued and forwards caught plugin errors.
    fn flush(&mut self) {
        for command in self.actions.take_commands() {
            match command {
                Command::Relayout => self.request_pass(),
                Command::ScrollToItem(index, options) => {
                    if let Err(error) = self.scroll_to_item(index, options) {
                        error.report();
                    }
                }
                Command::ScrollToTop(options) => self.scroll_to_top(options),
                Command::ScrollToBottom(options) => self.scroll_to_bottom(options),
                Command::ForceUpdate => self.force_update(),
            }
        }
        self.forward_failures();
    }

    fn forward_failures(&mut self) {
        let failures = self.manager.take_failures();
        if failures.is_empty() {
            return;
        }
        let ctx = self.context();
        for failure in failures {
            self.manager.report_error(&ctx, &failure.to_error());
        }
    }
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &index in order {
        match seen.get_mut(index) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}

impl<T: 'static> std::fmt::Debug for Waterfall<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waterfall")
            .field("items", &self.props.items.len())
            .field("pass", &self.pass)
            .field("layout", &self.layout)
            .field("viewport", &self.tracker.state())
            .field("rendered", &self.rendered.len())
            .field("plugins", &self.manager)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/composition_tests.rs"]
mod tests;
