//! Virtualization overlay.
//!
//! Decides which items are rendered for the current viewport, keeps column
//! assignments stable across recomputations of the same list, and tracks height
//! drift of rendered items.

mod column_cache;
mod measurement;
mod window;

pub use column_cache::StableColumnCache;
pub use measurement::{MeasureOutcome, MeasurementTracker};
pub use window::{placeholder_height, window_bounds, windowed_indices};

use std::time::Duration;

use waterfall_core::{BoxMetrics, PositionMap, ViewportState, DEFAULT_ESTIMATED_ITEM_HEIGHT};

/// Extra pixels rendered above and below the viewport.
pub const DEFAULT_OVERSCAN_PX: f32 = 300.0;

/// Height changes at or below this many pixels are treated as noise.
pub const DEFAULT_NOISE_THRESHOLD: f32 = 0.5;

/// Consecutive quiet notifications after which an item is unsubscribed.
pub const DEFAULT_STABILITY_LIMIT: u8 = 2;

/// Window in which height changes are coalesced into one recompute.
pub const DEFAULT_BATCH_WINDOW: Duration = Duration::from_millis(50);

#[derive(Clone, Debug, PartialEq)]
pub struct VirtualConfig {
    pub overscan_px: f32,
    /// Observe rendered items and feed measured heights back into layout.
    pub dynamic_heights: bool,
    pub estimate_item_height: f32,
    pub noise_threshold: f32,
    pub stability_limit: u8,
    pub batch_window: Duration,
}

impl Default for VirtualConfig {
    fn default() -> Self {
        Self {
            overscan_px: DEFAULT_OVERSCAN_PX,
            dynamic_heights: true,
            estimate_item_height: DEFAULT_ESTIMATED_ITEM_HEIGHT,
            noise_threshold: DEFAULT_NOISE_THRESHOLD,
            stability_limit: DEFAULT_STABILITY_LIMIT,
            batch_window: DEFAULT_BATCH_WINDOW,
        }
    }
}

impl VirtualConfig {
    pub fn with_overscan(mut self, overscan_px: f32) -> Self {
        self.overscan_px = overscan_px;
        self
    }

    pub fn with_dynamic_heights(mut self, enabled: bool) -> Self {
        self.dynamic_heights = enabled;
        self
    }
}

/// Windowing, stable columns and the measurement loop for one composition.
#[derive(Debug, Default)]
pub struct VirtualizationOverlay {
    config: VirtualConfig,
    columns: StableColumnCache,
    measurements: MeasurementTracker,
    /// Bumped every time the list identity changes.
    generation: u64,
}

impl VirtualizationOverlay {
    pub fn new(config: VirtualConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &VirtualConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: VirtualConfig, metrics: &dyn BoxMetrics) {
        if self.config.dynamic_heights && !config.dynamic_heights {
            self.measurements.reset(metrics);
        }
        self.config = config;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn column_cache(&self) -> &StableColumnCache {
        &self.columns
    }

    /// Column assigner to hand to the layout engine.
    pub fn assigner(&mut self) -> &mut StableColumnCache {
        &mut self.columns
    }

    pub fn measurements(&self) -> &MeasurementTracker {
        &self.measurements
    }

    /// Measured height of `index`, when dynamic heights are enabled.
    pub fn measured_height(&self, index: usize) -> Option<f32> {
        if self.config.dynamic_heights {
            self.measurements.height(index)
        } else {
            None
        }
    }

    /// Items to render for `viewport`.
    pub fn window(&self, positions: &PositionMap, viewport: &ViewportState) -> Vec<usize> {
        windowed_indices(positions, viewport, self.config.overscan_px)
    }

    /// Estimated content height before the container has been measured.
    pub fn placeholder_height(&self, count: usize, columns: usize, gap: f32) -> f32 {
        placeholder_height(count, columns, self.config.estimate_item_height, gap)
    }

    /// Feeds a size-change notification for a rendered item.
    pub fn on_item_resize(
        &mut self,
        metrics: &dyn BoxMetrics,
        index: usize,
        height: f32,
        now: Duration,
    ) -> MeasureOutcome {
        if !self.config.dynamic_heights {
            return MeasureOutcome::Ignored;
        }
        self.measurements
            .record(&self.config, metrics, index, height, now)
    }

    /// Returns true when coalesced height changes are due for a recompute.
    pub fn poll(&mut self, now: Duration) -> bool {
        self.measurements.poll(now)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.measurements.next_deadline()
    }

    /// Keeps observation subscriptions in line with the rendered set.
    pub fn sync_subscriptions(&mut self, rendered: &[usize], metrics: &dyn BoxMetrics) {
        if self.config.dynamic_heights {
            self.measurements.sync(rendered, metrics);
        }
    }

    /// Starts a new list identity: assignments, heights and subscriptions are dropped.
    pub fn replace_list(&mut self, metrics: &dyn BoxMetrics) {
        self.columns.clear();
        self.measurements.reset(metrics);
        self.generation += 1;
        log::debug!("virtualization overlay reset for list generation {}", self.generation);
    }

    /// Releases every subscription. Called on teardown.
    pub fn release(&mut self, metrics: &dyn BoxMetrics) {
        self.measurements.reset(metrics);
        self.columns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use waterfall_core::{LayoutState, Size};
    use waterfall_layout::{measure_masonry, LayoutConfig, PlacementQuery};

    struct CountingMetrics {
        observed: Cell<usize>,
    }

    impl BoxMetrics for CountingMetrics {
        fn container_size(&self) -> Option<Size> {
            Some(Size::new(320.0, 400.0))
        }
        fn item_size(&self, _index: usize) -> Option<Size> {
            None
        }
        fn observe_item(&self, _index: usize) -> bool {
            self.observed.set(self.observed.get() + 1);
            true
        }
        fn unobserve_item(&self, _index: usize) {}
    }

    fn run(overlay: &mut VirtualizationOverlay, heights: &[f32]) -> (LayoutState, PositionMap) {
        let config = LayoutConfig::new(3).with_gap(10.0);
        let layout = measure_masonry(
            heights.len(),
            Size::new(320.0, 400.0),
            &config,
            |i| overlay_height(heights, i),
            overlay.assigner(),
            |_: &PlacementQuery<'_>| None,
        )
        .computed()
        .unwrap();
        (layout.state, layout.positions)
    }

    fn overlay_height(heights: &[f32], index: usize) -> Option<f32> {
        heights.get(index).copied()
    }

    #[test]
    fn test_height_drift_keeps_columns() {
        let mut overlay = VirtualizationOverlay::default();
        let mut heights = vec![100.0, 200.0, 150.0, 300.0, 100.0, 250.0];
        let (_, first) = run(&mut overlay, &heights);

        // Item 0 grows a lot; greedy placement would now move item 3.
        heights[0] = 900.0;
        let (_, second) = run(&mut overlay, &heights);

        for index in 0..heights.len() {
            assert_eq!(
                first.get(index).unwrap().column,
                second.get(index).unwrap().column,
                "item {index} changed column"
            );
        }
    }

    #[test]
    fn test_replace_list_forgets_assignments() {
        let metrics = CountingMetrics {
            observed: Cell::new(0),
        };
        let mut overlay = VirtualizationOverlay::default();
        run(&mut overlay, &[100.0, 100.0, 100.0, 100.0]);
        assert_eq!(overlay.column_cache().len(), 4);

        overlay.replace_list(&metrics);
        assert!(overlay.column_cache().is_empty());
        assert_eq!(overlay.generation(), 1);
    }

    #[test]
    fn test_static_heights_skip_subscriptions() {
        let metrics = CountingMetrics {
            observed: Cell::new(0),
        };
        let mut overlay =
            VirtualizationOverlay::new(VirtualConfig::default().with_dynamic_heights(false));
        overlay.sync_subscriptions(&[0, 1, 2], &metrics);
        assert_eq!(metrics.observed.get(), 0);
        assert_eq!(
            overlay.on_item_resize(&metrics, 0, 50.0, Duration::ZERO),
            MeasureOutcome::Ignored
        );
    }
}
