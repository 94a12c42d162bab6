//! Layout pass: request, veto, compute, commit.

use std::rc::Rc;
use std::task::Context;
use std::time::Duration;

use waterfall_core::{Size, SkipReason, WaterfallError};
use waterfall_layout::{
    measure_masonry, ColumnAssigner, LayoutOutcome, MasonryLayout, PlacementQuery, ShortestColumn,
};
use waterfall_plugin::{Hook, HookArgs, HookValue, VetoOutcome};

use super::{Waterfall, LAYOUT_COMPLETE_EVENT};
use crate::phase::PassState;

impl<T: Clone + 'static> Waterfall<T> {
    /// Requests a pass on the next pump, bypassing the debounce. A request
    /// while a pass is in flight is coalesced.
    pub(super) fn request_pass(&mut self) {
        match self.pass {
            PassState::Idle | PassState::Committed => self.pass = PassState::Requested,
            PassState::Requested => {}
            PassState::AwaitingVeto(_) | PassState::Computing => {
                log::debug!("[waterfall] layout requested while in flight; coalescing");
                self.rerequest = true;
            }
        }
    }

    /// Debounced request: replaces any pending timer.
    pub(super) fn schedule_pass(&mut self) {
        let now = self.clock.now();
        self.debounce.schedule(now, self.props.debounce);
    }

    /// Advances the state machine by one step. Returns true on progress.
    pub(super) fn step_pass(&mut self, cx: &mut Context<'_>) -> bool {
        match std::mem::take(&mut self.pass) {
            PassState::Idle => false,
            PassState::Requested => {
                self.begin_pass();
                true
            }
            PassState::AwaitingVeto(pending) => {
                let ctx = self.context();
                match self
                    .manager
                    .resume_veto(pending, &ctx, &HookArgs::None, cx)
                {
                    VetoOutcome::Pending(pending) => {
                        self.pass = PassState::AwaitingVeto(pending);
                        false
                    }
                    VetoOutcome::Allowed => {
                        self.compute_pass();
                        true
                    }
                    VetoOutcome::Vetoed { plugin } => {
                        self.abort_pass(WaterfallError::VetoAbort { plugin });
                        true
                    }
                }
            }
            PassState::Computing | PassState::Committed => {
                self.finish_pass();
                true
            }
        }
    }

    fn begin_pass(&mut self) {
        if self.props.items.is_empty() {
            self.abort_pass(WaterfallError::PreconditionNotMet(SkipReason::NoItems));
            return;
        }
        if self.metrics.container_size().is_none() {
            self.abort_pass(WaterfallError::PreconditionNotMet(
                SkipReason::NoContainerMetrics,
            ));
            return;
        }

        let ctx = self.context();
        match self
            .manager
            .dispatch_veto(Hook::BeforeLayout, &ctx, &HookArgs::None)
        {
            VetoOutcome::Allowed => self.compute_pass(),
            VetoOutcome::Vetoed { plugin } => {
                self.abort_pass(WaterfallError::VetoAbort { plugin })
            }
            VetoOutcome::Pending(pending) => {
                log::debug!(
                    "[waterfall] layout awaiting asynchronous veto from `{}`",
                    pending.plugin()
                );
                self.pass = PassState::AwaitingVeto(pending);
            }
        }
    }

    fn compute_pass(&mut self) {
        // Metrics may have gone away while a veto was suspended.
        let Some(container) = self.metrics.container_size() else {
            self.abort_pass(WaterfallError::PreconditionNotMet(
                SkipReason::NoContainerMetrics,
            ));
            return;
        };
        self.pass = PassState::Computing;
        let started = self.clock.now();

        let ctx = self.context();
        self.manager.notify(Hook::Layout, &ctx, &HookArgs::None);

        let mut config = self.props.layout_config();
        match self
            .manager
            .dispatch_override(Hook::CalculateColumns, &ctx, &HookArgs::None)
        {
            Some(HookValue::Columns(columns)) => config.columns = columns,
            Some(other) => log::warn!("[waterfall] calculate_columns returned {other:?}"),
            None => {}
        }
        if config.columns == 0 {
            WaterfallError::InvalidConfiguration("column count of zero clamped to one".into())
                .report();
        }
        let columns = config.effective_columns();
        let width_args = HookArgs::ColumnWidth {
            container_width: container.width,
            columns,
        };
        match self
            .manager
            .dispatch_override(Hook::CalculateColumnWidth, &ctx, &width_args)
        {
            Some(HookValue::ColumnWidth(width)) => config.column_width = Some(width),
            Some(other) => log::warn!("[waterfall] calculate_column_width returned {other:?}"),
            None => {}
        }

        let virtualized = self.props.virtualization.is_some();
        if virtualized && self.layout.columns != 0 && self.layout.columns != columns {
            log::debug!(
                "[waterfall] column count {} -> {}, dropping cached assignments",
                self.layout.columns,
                columns
            );
            self.overlay.assigner().clear();
        }

        let heights = self.item_heights();
        let explicit = self.manager.handles(Hook::CalculateItemPosition);
        let manager = &mut self.manager;
        let place = |query: &PlacementQuery<'_>| {
            if !explicit {
                return None;
            }
            let args = HookArgs::ItemPosition {
                index: query.index,
                height: query.height,
                column_width: query.column_width,
                column_heights: query.column_heights,
            };
            match manager.dispatch_override(Hook::CalculateItemPosition, &ctx, &args) {
                Some(HookValue::Position(position)) => Some(position),
                Some(other) => {
                    log::warn!("[waterfall] calculate_item_position returned {other:?}");
                    None
                }
                None => None,
            }
        };
        let mut shortest = ShortestColumn;
        let assigner: &mut dyn ColumnAssigner = if virtualized {
            self.overlay.assigner()
        } else {
            &mut shortest
        };
        let outcome = measure_masonry(
            heights.len(),
            container,
            &config,
            |index| heights.get(index).copied().flatten(),
            assigner,
            place,
        );

        match outcome {
            LayoutOutcome::Computed(layout) => self.commit_layout(layout, container, started),
            LayoutOutcome::Skipped(reason) => {
                self.abort_pass(WaterfallError::PreconditionNotMet(reason));
            }
        }
    }

    /// Known height per item: measured by the overlay, then the host
    /// callback, then current box metrics. `None` falls back to the estimate.
    fn item_heights(&self) -> Vec<Option<f32>> {
        let callback = self.props.item_height.as_ref();
        self.props
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.overlay
                    .measured_height(index)
                    .filter(|_| self.props.virtualization.is_some())
                    .or_else(|| callback.map(|height_of| height_of(item, index)))
                    .or_else(|| self.metrics.item_size(index).map(|size| size.height))
            })
            .collect()
    }

    fn commit_layout(&mut self, layout: MasonryLayout, container: Size, started: Duration) {
        let MasonryLayout { state, positions } = layout;
        log::debug!(
            "[waterfall] layout committed: {} items, {} columns, total height {} (container {}x{})",
            positions.len(),
            state.columns,
            state.total_height,
            container.width,
            container.height
        );
        self.tracker.set_content_height(state.total_height);
        self.layout = Rc::new(state);
        self.positions = Rc::new(positions);
        self.pass = PassState::Committed;

        self.performance.layout_count += 1;
        self.performance.last_layout_duration = self.clock.now().saturating_sub(started);
        self.performance.item_count = self.props.items.len();
        self.refresh_visibility();
        self.performance.visible_item_count = self.visible.len();
        self.performance.rendered_item_count = self.rendered.len();

        let ctx = self.context();
        self.manager
            .notify(Hook::LayoutComplete, &ctx, &HookArgs::None);
        let performance = self.performance;
        self.manager.notify(
            Hook::PerformanceMetric,
            &ctx,
            &HookArgs::Performance(&performance),
        );
        self.bus.emit(LAYOUT_COMPLETE_EVENT, &*self.layout);
        self.finish_pass();
    }

    fn abort_pass(&mut self, reason: WaterfallError) {
        reason.report();
        self.finish_pass();
    }

    fn finish_pass(&mut self) {
        self.pass = PassState::Idle;
        if std::mem::take(&mut self.rerequest) {
            log::debug!("[waterfall] re-requesting coalesced layout");
            self.schedule_pass();
        }
    }
}
