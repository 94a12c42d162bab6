//! Core types shared by every Waterfall crate.
//!
//! This crate holds the plain data the layout pipeline passes around
//! (positions, layout and viewport snapshots), the timing primitives used for
//! debouncing, the box-metrics collaborator trait and the error taxonomy.

pub mod deferred;
pub mod error;
pub mod geometry;
pub mod metrics;
pub mod platform;
pub mod scroll;
pub mod viewport;

pub use deferred::DeferredTask;
pub use error::{SkipReason, WaterfallError};
pub use geometry::{ColumnHeights, ItemPosition, LayoutState, Padding, PositionMap, Size};
pub use metrics::BoxMetrics;
pub use platform::{Clock, ManualClock, SystemClock};
pub use scroll::{ScrollBehavior, ScrollBlock, ScrollRequest, ScrollToOptions};
pub use viewport::{ItemVisibility, ScrollDirection, ScrollMetrics, ViewportState};

/// Default number of columns.
pub const DEFAULT_COLUMNS: usize = 3;

/// Default gap between columns and rows, in pixels.
pub const DEFAULT_GAP: f32 = 16.0;

/// Default estimated height for items without a known measurement.
pub const DEFAULT_ESTIMATED_ITEM_HEIGHT: f32 = 200.0;
