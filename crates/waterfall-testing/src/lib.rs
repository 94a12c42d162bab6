//! Testing utilities and harness for Waterfall

pub mod metrics;
pub mod testing;

pub use metrics::FakeMetrics;
pub use testing::*;

pub mod prelude {
    pub use crate::metrics::FakeMetrics;
    pub use crate::testing::*;
    pub use waterfall_core::{ManualClock, ScrollMetrics, Size};
}
