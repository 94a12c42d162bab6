//! Extension pipeline for Waterfall: plugins, hooks, the shared bus and the
//! props a composition is configured with.

pub mod bus;
pub mod context;
pub mod derived;
pub mod error;
pub mod hook;
pub mod manager;
pub mod plugin;
pub mod props;

pub use bus::{PluginBus, Subscription, SubscriptionId};
pub use context::{Command, ContextFlags, PluginActions, PluginContext};
pub use derived::DerivedItems;
pub use error::PluginError;
pub use hook::{Hook, HookArgs, HookClass, HookValue, PerformanceMetrics, VetoFuture};
pub use manager::{PendingVeto, PluginFailure, PluginManager, VetoOutcome};
pub use plugin::{HookHandler, HookResult, Plugin, TeardownFuture, TransformFn};
pub use props::{ItemHeightFn, TransformEnv, WaterfallProps, DEFAULT_LAYOUT_DEBOUNCE};

pub mod prelude {
    pub use crate::{
        Hook, HookArgs, HookValue, Plugin, PluginBus, PluginContext, PluginError, TransformEnv,
        WaterfallProps,
    };
    pub use waterfall_core::{ItemPosition, ScrollToOptions, Size, WaterfallError};
}
