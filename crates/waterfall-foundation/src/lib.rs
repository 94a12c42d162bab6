//! Viewport tracking and windowed rendering for masonry layouts.

pub mod scroll;
pub mod virtualization;

pub use scroll::{ScrollUpdate, ViewportConfig, ViewportTracker};
pub use virtualization::{
    placeholder_height, window_bounds, windowed_indices, MeasureOutcome, MeasurementTracker,
    StableColumnCache, VirtualConfig, VirtualizationOverlay,
};
