//! Built-in plugins.
//!
//! Each plugin is a small builder that turns into a [`Plugin<T>`]:
//!
//! ```ignore
//! let sort = SortPlugin::by(|a: &Photo, b: &Photo| a.taken.cmp(&b.taken));
//! let control = sort.control();
//! waterfall.register_plugins([
//!     sort.scroll_to_top(true).into(),
//!     PaginationPlugin::new().page_size(40).into(),
//! ]);
//! ```
//!
//! Plugins that own a replaceable function (sort, filter) expose a
//! [`Control`] handle. After changing it, hand the composition its props
//! again so the transform chain re-runs.

mod analytics;
mod columns;
mod control;
mod debounce;
mod filter;
mod fixed_height;
mod gap;
mod infinite_scroll;
mod pagination;
mod pin;
mod search;
mod sort;

pub use analytics::{ClickAnalyticsPlugin, ClickCounts, ClickEvent};
pub use columns::{AutoColumnPlugin, Breakpoint, ResponsiveColumnsPlugin};
pub use control::Control;
pub use debounce::DebounceLayoutPlugin;
pub use filter::{FilterControl, FilterPlugin, Predicate};
pub use fixed_height::FixedHeightPlugin;
pub use gap::{GapBreakpoints, GapOverride, GapPlugin};
pub use infinite_scroll::{InfiniteScrollLoad, InfiniteScrollPlugin};
pub use pagination::{PaginationPlugin, DEFAULT_PAGE_SIZE};
pub use pin::PinItemPlugin;
pub use search::SearchPlugin;
pub use sort::{Comparator, SortControl, SortPlugin};

/// Bus data key holding [`ClickCounts`].
pub const CLICK_COUNTS_KEY: &str = "click-analytics:counts";

/// Bus event carrying a [`ClickEvent`] for every item click.
pub const CLICK_EVENT: &str = "click-analytics:click";

/// Bus event carrying an [`InfiniteScrollLoad`] when more items are wanted.
pub const LOAD_EVENT: &str = "infinite-scroll:load";
