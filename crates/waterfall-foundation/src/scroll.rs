//! Viewport / scroll tracking.
//!
//! Folds raw scroll notifications into a [`ViewportState`], derives direction,
//! and detects scroll start, scroll end (after a quiet period) and the
//! reach-top / reach-bottom edges.

use std::time::Duration;

use waterfall_core::{DeferredTask, ScrollDirection, ScrollMetrics, Size, ViewportState};

/// Distance from the bottom, in pixels, below which reach-bottom is reported.
pub const DEFAULT_REACH_BOTTOM_THRESHOLD: f32 = 100.0;

/// Quiet period after the last scroll event before scrolling is considered over.
pub const DEFAULT_SCROLL_END_DELAY: Duration = Duration::from_millis(150);

#[derive(Clone, Debug, PartialEq)]
pub struct ViewportConfig {
    pub reach_bottom_threshold: f32,
    pub scroll_end_delay: Duration,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            reach_bottom_threshold: DEFAULT_REACH_BOTTOM_THRESHOLD,
            scroll_end_delay: DEFAULT_SCROLL_END_DELAY,
        }
    }
}

/// What a single scroll notification changed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollUpdate {
    /// True when this event moved the viewport out of the idle state.
    pub started: bool,
    pub direction: Option<ScrollDirection>,
    /// Remaining distance when inside the reach-bottom threshold.
    pub reached_bottom: Option<f32>,
    pub reached_top: bool,
}

#[derive(Debug, Default)]
pub struct ViewportTracker {
    config: ViewportConfig,
    state: ViewportState,
    scroll_end: DeferredTask,
}

impl ViewportTracker {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            config,
            state: ViewportState::default(),
            scroll_end: DeferredTask::new(),
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ViewportConfig) {
        self.config = config;
    }

    pub fn is_scrolling(&self) -> bool {
        self.state.is_scrolling
    }

    /// Records new scroll metrics observed at `now`.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics, now: Duration) -> ScrollUpdate {
        let previous = self.state;
        let direction = if metrics.scroll_top > previous.scroll_top {
            Some(ScrollDirection::Down)
        } else if metrics.scroll_top < previous.scroll_top {
            Some(ScrollDirection::Up)
        } else if metrics.scroll_left > previous.scroll_left {
            Some(ScrollDirection::Right)
        } else if metrics.scroll_left < previous.scroll_left {
            Some(ScrollDirection::Left)
        } else {
            previous.direction
        };

        self.state = ViewportState {
            scroll_top: metrics.scroll_top,
            scroll_left: metrics.scroll_left,
            scroll_height: metrics.scroll_height,
            scroll_width: metrics.scroll_width,
            client_height: metrics.client_height,
            client_width: metrics.client_width,
            is_scrolling: true,
            direction,
        };
        self.scroll_end.schedule(now, self.config.scroll_end_delay);

        let distance = self.state.distance_to_bottom();
        let reached_bottom = (self.state.scroll_height > 0.0
            && distance < self.config.reach_bottom_threshold)
            .then_some(distance.max(0.0));
        let reached_top = metrics.scroll_top <= 0.0
            && previous.scroll_top > 0.0
            && direction == Some(ScrollDirection::Up);

        ScrollUpdate {
            started: !previous.is_scrolling,
            direction,
            reached_bottom,
            reached_top,
        }
    }

    /// Records a new client size for the scroll container.
    pub fn on_resize(&mut self, size: Size) {
        self.state.client_width = size.width;
        self.state.client_height = size.height;
    }

    /// Updates the scrollable content height after a layout commit.
    pub fn set_content_height(&mut self, height: f32) {
        self.state.scroll_height = height.max(self.state.client_height);
    }

    /// Fires the scroll-end timer. Returns true when scrolling just ended.
    pub fn poll(&mut self, now: Duration) -> bool {
        if self.scroll_end.take_due(now) && self.state.is_scrolling {
            self.state.is_scrolling = false;
            return true;
        }
        false
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.scroll_end.deadline()
    }
}
