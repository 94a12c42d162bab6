use std::rc::Rc;
use std::time::Duration;

use waterfall_core::{ManualClock, ScrollMetrics, Size};
use waterfall_plugin::WaterfallProps;
use waterfall_ui::{Frame, Waterfall};

use crate::metrics::FakeMetrics;

/// Headless harness for driving a [`Waterfall`] in tests.
///
/// `WaterfallTestRule` owns a [`ManualClock`] and a [`FakeMetrics`] and
/// wraps the composition with helpers that advance time and pump until
/// nothing is left to do, so tests read as a sequence of host events.
pub struct WaterfallTestRule<T: 'static> {
    waterfall: Waterfall<T>,
    metrics: Rc<FakeMetrics>,
    clock: ManualClock,
}

impl<T: Clone + 'static> WaterfallTestRule<T> {
    /// Create a rule whose container has not been measured yet.
    pub fn new(props: WaterfallProps<T>) -> Self {
        Self::with_metrics(props, FakeMetrics::new())
    }

    /// Create a rule with a measured container of `width` x `height`.
    pub fn with_container(props: WaterfallProps<T>, width: f32, height: f32) -> Self {
        Self::with_metrics(props, FakeMetrics::with_container(width, height))
    }

    pub fn with_metrics(props: WaterfallProps<T>, metrics: Rc<FakeMetrics>) -> Self {
        let clock = ManualClock::new();
        let waterfall = Waterfall::new(props, metrics.clone()).with_clock(Rc::new(clock.clone()));
        Self {
            waterfall,
            metrics,
            clock,
        }
    }

    /// Mount the composition and run its first layout pass.
    pub fn mount(&mut self) {
        self.waterfall.mount();
        self.pump_until_idle();
    }

    pub fn waterfall(&mut self) -> &mut Waterfall<T> {
        &mut self.waterfall
    }

    pub fn metrics(&self) -> &Rc<FakeMetrics> {
        &self.metrics
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn now(&self) -> Duration {
        waterfall_core::Clock::now(&self.clock)
    }

    /// Pump until a call makes no progress. Returns the number of steps that
    /// progressed.
    pub fn pump_until_idle(&mut self) -> usize {
        let mut steps = 0;
        loop {
            if steps >= 100 {
                panic!("pump_until_idle looped too many times!");
            }
            if !self.waterfall.pump() {
                break;
            }
            steps += 1;
        }
        steps
    }

    /// Move the clock forward and process whatever became due.
    pub fn advance_time(&mut self, by: Duration) {
        self.clock.advance(by);
        self.pump_until_idle();
    }

    pub fn advance_millis(&mut self, millis: u64) {
        self.advance_time(Duration::from_millis(millis));
    }

    /// Jump from deadline to deadline until no timer is pending.
    ///
    /// Suspended vetoes do not have deadlines; they stay suspended.
    pub fn advance_until_settled(&mut self) {
        self.pump_until_idle();
        let mut jumps = 0;
        while let Some(deadline) = self.waterfall.next_deadline() {
            jumps += 1;
            if jumps > 100 {
                panic!("advance_until_settled never settled");
            }
            if deadline > self.now() {
                self.clock.set(deadline);
            }
            self.pump_until_idle();
        }
    }

    /// Resize the container and notify the composition.
    pub fn resize_container(&mut self, width: f32, height: f32) {
        self.metrics.set_container(Some(Size::new(width, height)));
        self.waterfall.notify_container_resize();
    }

    /// Scroll to `top` inside the measured container, against the committed
    /// content height.
    pub fn scroll_to(&mut self, top: f32) {
        let container = self.metrics.container_size_or_zero();
        let content = self.waterfall.layout_info().total_height;
        self.waterfall.notify_scroll(ScrollMetrics {
            scroll_top: top,
            scroll_left: 0.0,
            scroll_height: content.max(container.height),
            scroll_width: container.width,
            client_height: container.height,
            client_width: container.width,
        });
    }

    /// Report a new rendered height for `index`.
    pub fn resize_item(&mut self, index: usize, height: f32) {
        let width = self
            .waterfall
            .item_position(index)
            .map_or(0.0, |position| position.width);
        let size = Size::new(width, height);
        self.metrics.set_item_size(index, size);
        self.waterfall.notify_item_resize(index, size);
    }

    pub fn frame(&mut self) -> Frame {
        self.waterfall.frame()
    }

    /// Indices rendered in the current frame.
    pub fn rendered(&mut self) -> Vec<usize> {
        self.waterfall.frame().indices()
    }
}

/// Convenience helper for tests that only need temporary access to a mounted
/// `WaterfallTestRule`.
pub fn run_test_waterfall<T, R>(
    props: WaterfallProps<T>,
    container: Size,
    f: impl FnOnce(&mut WaterfallTestRule<T>) -> R,
) -> R
where
    T: Clone + 'static,
{
    let mut rule = WaterfallTestRule::with_container(props, container.width, container.height);
    rule.mount();
    f(&mut rule)
}

#[cfg(test)]
#[path = "tests/testing_tests.rs"]
mod tests;
