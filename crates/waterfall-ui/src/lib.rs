//! Composition shell for Waterfall.
//!
//! Binds the masonry engine, the viewport tracker, the virtualization overlay
//! and the plugin pipeline to a host render tree. The host reports container
//! size, scroll and item size changes, calls [`Waterfall::pump`] from its event
//! loop, and renders [`Frame`]s.

mod composition;
mod phase;
mod render;
mod signal;

pub use composition::{Waterfall, LAYOUT_COMPLETE_EVENT};
pub use phase::LayoutPhase;
pub use render::{Frame, ItemRenderer, Positioned};

pub mod prelude {
    pub use crate::{Frame, LayoutPhase, Positioned, Waterfall};
    pub use waterfall_core::{
        BoxMetrics, Clock, ItemPosition, ManualClock, Padding, ScrollBehavior, ScrollBlock,
        ScrollMetrics, ScrollRequest, ScrollToOptions, Size, SystemClock, WaterfallError,
    };
    pub use waterfall_foundation::{ViewportConfig, VirtualConfig};
    pub use waterfall_plugin::{
        Hook, HookArgs, HookValue, Plugin, PluginBus, PluginContext, PluginError, TransformEnv,
        WaterfallProps,
    };
}
