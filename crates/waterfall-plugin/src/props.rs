//! Host-facing configuration of a waterfall composition.
//!
//! Props flow through every plugin's `transform_props` before anything else
//! reads them, so plugins can rewrite columns, gaps or the item list itself.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use waterfall_core::{Padding, Size, DEFAULT_COLUMNS, DEFAULT_ESTIMATED_ITEM_HEIGHT, DEFAULT_GAP};
use waterfall_foundation::{VirtualConfig, ViewportConfig};
use waterfall_layout::LayoutConfig;

/// Default debounce window for item-list and container-size changes.
pub const DEFAULT_LAYOUT_DEBOUNCE: Duration = Duration::from_millis(150);

/// Host-supplied height of an item, when known up front.
pub type ItemHeightFn<T> = Rc<dyn Fn(&T, usize) -> f32>;

pub struct WaterfallProps<T> {
    pub items: Rc<[T]>,
    pub columns: usize,
    pub gap: f32,
    /// Overrides `gap` horizontally.
    pub column_gap: Option<f32>,
    /// Overrides `gap` vertically.
    pub row_gap: Option<f32>,
    pub padding: Padding,
    pub estimated_item_height: f32,
    pub item_height: Option<ItemHeightFn<T>>,
    /// Debounce window for list replacement and container resizes.
    pub debounce: Duration,
    pub viewport: ViewportConfig,
    /// `None` renders every item and skips the measurement loop.
    pub virtualization: Option<VirtualConfig>,
    pub search_query: Option<String>,
    /// 1-based page for pagination plugins.
    pub page_index: usize,
    pub page_size: Option<usize>,
    pub is_loading: bool,
    pub has_more: bool,
}

impl<T> WaterfallProps<T> {
    pub fn new(items: impl Into<Rc<[T]>>) -> Self {
        Self {
            items: items.into(),
            columns: DEFAULT_COLUMNS,
            gap: DEFAULT_GAP,
            column_gap: None,
            row_gap: None,
            padding: Padding::default(),
            estimated_item_height: DEFAULT_ESTIMATED_ITEM_HEIGHT,
            item_height: None,
            debounce: DEFAULT_LAYOUT_DEBOUNCE,
            viewport: ViewportConfig::default(),
            virtualization: Some(VirtualConfig::default()),
            search_query: None,
            page_index: 1,
            page_size: None,
            is_loading: false,
            has_more: false,
        }
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    pub fn gap(mut self, gap: f32) -> Self {
        self.gap = gap;
        self
    }

    pub fn padding(mut self, padding: impl Into<Padding>) -> Self {
        self.padding = padding.into();
        self
    }

    pub fn item_height(mut self, height: impl Fn(&T, usize) -> f32 + 'static) -> Self {
        self.item_height = Some(Rc::new(height));
        self
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn virtualization(mut self, config: Option<VirtualConfig>) -> Self {
        self.virtualization = config;
        self
    }

    pub fn with_items(mut self, items: impl Into<Rc<[T]>>) -> Self {
        self.items = items.into();
        self
    }

    pub fn effective_column_gap(&self) -> f32 {
        self.column_gap.unwrap_or(self.gap)
    }

    pub fn effective_row_gap(&self) -> f32 {
        self.row_gap.unwrap_or(self.gap)
    }

    /// Estimate used for items without any known height.
    pub fn estimate(&self) -> f32 {
        match &self.virtualization {
            Some(config) => config.estimate_item_height,
            None => self.estimated_item_height,
        }
    }

    /// Engine configuration derived from these props.
    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            columns: self.columns,
            column_gap: self.effective_column_gap(),
            row_gap: self.effective_row_gap(),
            padding: self.padding,
            estimated_item_height: self.estimate(),
            column_width: None,
        }
    }

    /// True when both props share the same item list allocation.
    pub fn same_items(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }
}

impl<T> Clone for WaterfallProps<T> {
    fn clone(&self) -> Self {
        Self {
            items: Rc::clone(&self.items),
            columns: self.columns,
            gap: self.gap,
            column_gap: self.column_gap,
            row_gap: self.row_gap,
            padding: self.padding,
            estimated_item_height: self.estimated_item_height,
            item_height: self.item_height.clone(),
            debounce: self.debounce,
            viewport: self.viewport.clone(),
            virtualization: self.virtualization.clone(),
            search_query: self.search_query.clone(),
            page_index: self.page_index,
            page_size: self.page_size,
            is_loading: self.is_loading,
            has_more: self.has_more,
        }
    }
}

impl<T> Default for WaterfallProps<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> fmt::Debug for WaterfallProps<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaterfallProps")
            .field("items", &self.items.len())
            .field("columns", &self.columns)
            .field("gap", &self.gap)
            .field("column_gap", &self.column_gap)
            .field("row_gap", &self.row_gap)
            .field("padding", &self.padding)
            .field("debounce", &self.debounce)
            .field("virtualization", &self.virtualization)
            .field("search_query", &self.search_query)
            .field("page_index", &self.page_index)
            .finish_non_exhaustive()
    }
}

/// Environment visible to `transform_props`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransformEnv {
    /// Container size, once the box-metrics collaborator has reported one.
    pub container: Option<Size>,
}

impl TransformEnv {
    pub fn container_width(&self) -> Option<f32> {
        self.container.map(|size| size.width)
    }
}
