//! Dynamic height re-measurement loop.
//!
//! Rendered items are observed through the box-metrics collaborator. Each
//! size-change notification is compared with the last recorded height; real
//! changes are recorded and coalesced into one recompute per batch window,
//! while repeated sub-threshold notifications settle the item and release its
//! subscription.

use std::time::Duration;

use rustc_hash::{FxHashMap, FxHashSet};
use waterfall_core::{BoxMetrics, DeferredTask, WaterfallError};

use super::VirtualConfig;

/// Result of feeding one size-change notification into the tracker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MeasureOutcome {
    /// The height moved past the noise threshold and a recompute is scheduled.
    Changed { previous: Option<f32>, height: f32 },
    /// Sub-threshold change; `stable_count` consecutive quiet notifications so far.
    Unchanged { stable_count: u8 },
    /// The item reached the stability limit and was unsubscribed.
    Settled,
    /// The item is not subscribed; the notification was dropped.
    Ignored,
}

#[derive(Debug, Default)]
pub struct MeasurementTracker {
    heights: FxHashMap<usize, f32>,
    stable_counts: FxHashMap<usize, u8>,
    subscribed: FxHashSet<usize>,
    /// Settled while still rendered; not re-subscribed until it leaves the window.
    settled: FxHashSet<usize>,
    batch: DeferredTask,
}

impl MeasurementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded height of `index`.
    pub fn height(&self, index: usize) -> Option<f32> {
        self.heights.get(&index).copied()
    }

    pub fn measured_count(&self) -> usize {
        self.heights.len()
    }

    pub fn is_subscribed(&self, index: usize) -> bool {
        self.subscribed.contains(&index)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscribed.len()
    }

    pub fn has_pending_batch(&self) -> bool {
        self.batch.is_pending()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.batch.deadline()
    }

    /// Handles a size-change notification for `index` observed at `now`.
    pub fn record(
        &mut self,
        config: &VirtualConfig,
        metrics: &dyn BoxMetrics,
        index: usize,
        height: f32,
        now: Duration,
    ) -> MeasureOutcome {
        if !self.subscribed.contains(&index) {
            return MeasureOutcome::Ignored;
        }

        let previous = self.heights.get(&index).copied();
        let delta = (height - previous.unwrap_or(0.0)).abs();
        if height > 0.0 && delta > config.noise_threshold {
            self.heights.insert(index, height);
            self.stable_counts.insert(index, 0);
            self.batch.schedule(now, config.batch_window);
            return MeasureOutcome::Changed { previous, height };
        }

        WaterfallError::MeasurementNoise { index, delta }.report();
        let count = self.stable_counts.entry(index).or_insert(0);
        *count = count.saturating_add(1);
        if *count >= config.stability_limit {
            metrics.unobserve_item(index);
            self.subscribed.remove(&index);
            self.settled.insert(index);
            return MeasureOutcome::Settled;
        }
        MeasureOutcome::Unchanged {
            stable_count: *count,
        }
    }

    /// Fires the batch timer. Returns true when a recompute is due.
    pub fn poll(&mut self, now: Duration) -> bool {
        self.batch.take_due(now)
    }

    /// Brings subscriptions in line with the rendered set.
    ///
    /// Newly rendered items are observed; items that left the window are
    /// unobserved and may be observed again when they come back.
    pub fn sync(&mut self, rendered: &[usize], metrics: &dyn BoxMetrics) {
        let rendered_set: FxHashSet<usize> = rendered.iter().copied().collect();

        let departed: Vec<usize> = self
            .subscribed
            .iter()
            .copied()
            .filter(|index| !rendered_set.contains(index))
            .collect();
        for index in departed {
            metrics.unobserve_item(index);
            self.subscribed.remove(&index);
        }
        self.settled.retain(|index| rendered_set.contains(index));

        for &index in rendered {
            if self.subscribed.contains(&index) || self.settled.contains(&index) {
                continue;
            }
            if metrics.observe_item(index) {
                self.subscribed.insert(index);
            }
        }
    }

    /// Releases every subscription and forgets every recorded height.
    pub fn reset(&mut self, metrics: &dyn BoxMetrics) {
        for index in self.subscribed.drain() {
            metrics.unobserve_item(index);
        }
        self.heights.clear();
        self.stable_counts.clear();
        self.settled.clear();
        self.batch.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use waterfall_core::Size;

    #[derive(Default)]
    struct RecordingMetrics {
        observed: RefCell<Vec<usize>>,
        released: RefCell<Vec<usize>>,
    }

    impl BoxMetrics for RecordingMetrics {
        fn container_size(&self) -> Option<Size> {
            Some(Size::new(300.0, 400.0))
        }

        fn item_size(&self, _index: usize) -> Option<Size> {
            None
        }

        fn observe_item(&self, index: usize) -> bool {
            self.observed.borrow_mut().push(index);
            true
        }

        fn unobserve_item(&self, index: usize) {
            self.released.borrow_mut().push(index);
        }
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_change_records_and_schedules_batch() {
        let config = VirtualConfig::default();
        let metrics = RecordingMetrics::default();
        let mut tracker = MeasurementTracker::new();
        tracker.sync(&[0, 1], &metrics);

        let outcome = tracker.record(&config, &metrics, 0, 120.0, ms(0));
        assert_eq!(
            outcome,
            MeasureOutcome::Changed {
                previous: None,
                height: 120.0
            }
        );
        tracker.record(&config, &metrics, 1, 80.0, ms(30));
        // Second change pushed the deadline to 80ms.
        assert!(!tracker.poll(ms(50)));
        assert!(tracker.poll(ms(80)));
        assert!(!tracker.poll(ms(200)));
    }

    #[test]
    fn test_noise_settles_after_stability_limit() {
        let config = VirtualConfig::default();
        let metrics = RecordingMetrics::default();
        let mut tracker = MeasurementTracker::new();
        tracker.sync(&[4], &metrics);
        tracker.record(&config, &metrics, 4, 100.0, ms(0));

        assert_eq!(
            tracker.record(&config, &metrics, 4, 100.3, ms(1)),
            MeasureOutcome::Unchanged { stable_count: 1 }
        );
        assert_eq!(
            tracker.record(&config, &metrics, 4, 100.0, ms(2)),
            MeasureOutcome::Settled
        );
        assert_eq!(*metrics.released.borrow(), vec![4]);
        assert!(!tracker.is_subscribed(4));
        assert_eq!(tracker.height(4), Some(100.0));

        // Still rendered: not observed again.
        tracker.sync(&[4], &metrics);
        assert_eq!(*metrics.observed.borrow(), vec![4]);
        assert_eq!(
            tracker.record(&config, &metrics, 4, 300.0, ms(3)),
            MeasureOutcome::Ignored
        );
    }

    #[test]
    fn test_real_change_resets_stability() {
        let config = VirtualConfig::default();
        let metrics = RecordingMetrics::default();
        let mut tracker = MeasurementTracker::new();
        tracker.sync(&[2], &metrics);
        tracker.record(&config, &metrics, 2, 100.0, ms(0));
        tracker.record(&config, &metrics, 2, 100.0, ms(1));
        tracker.record(&config, &metrics, 2, 140.0, ms(2));
        assert_eq!(
            tracker.record(&config, &metrics, 2, 140.0, ms(3)),
            MeasureOutcome::Unchanged { stable_count: 1 }
        );
    }

    #[test]
    fn test_sync_releases_departed_items() {
        let metrics = RecordingMetrics::default();
        let mut tracker = MeasurementTracker::new();
        tracker.sync(&[0, 1, 2], &metrics);
        tracker.sync(&[2, 3], &metrics);
        let mut released = metrics.released.borrow().clone();
        released.sort_unstable();
        assert_eq!(released, vec![0, 1]);
        assert!(tracker.is_subscribed(3));
        assert_eq!(tracker.subscription_count(), 2);
    }

    #[test]
    fn test_reset() {
        let config = VirtualConfig::default();
        let metrics = RecordingMetrics::default();
        let mut tracker = MeasurementTracker::new();
        tracker.sync(&[0, 5], &metrics);
        tracker.record(&config, &metrics, 0, 50.0, ms(0));
        tracker.record(&config, &metrics, 5, 60.0, ms(0));
        assert_eq!(tracker.height(5), Some(60.0));

        tracker.reset(&metrics);
        assert_eq!(tracker.measured_count(), 0);
        assert_eq!(tracker.subscription_count(), 0);
        assert!(!tracker.has_pending_batch());
    }
}
