//! Masonry layout engine.
//!
//! Places a list of variable-height items into equal-width columns, always
//! appending to the currently shortest column. The engine is a pure function of
//! its inputs; callers own the committed result.

mod assign;
mod measure;

pub use assign::{ColumnAssigner, ShortestColumn};
pub use measure::{layout_masonry, measure_masonry, LayoutOutcome, MasonryLayout, PlacementQuery};

use waterfall_core::{Padding, DEFAULT_COLUMNS, DEFAULT_ESTIMATED_ITEM_HEIGHT, DEFAULT_GAP};

/// Configuration for a masonry layout pass.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Number of columns. Zero is treated as one.
    pub columns: usize,

    /// Horizontal gap between columns.
    pub column_gap: f32,

    /// Vertical gap appended after every item in a column.
    pub row_gap: f32,

    pub padding: Padding,

    /// Height used for items whose height is not known yet.
    pub estimated_item_height: f32,

    /// Fixed column width that replaces the computed one.
    pub column_width: Option<f32>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            column_gap: DEFAULT_GAP,
            row_gap: DEFAULT_GAP,
            padding: Padding::default(),
            estimated_item_height: DEFAULT_ESTIMATED_ITEM_HEIGHT,
            column_width: None,
        }
    }
}

impl LayoutConfig {
    pub fn new(columns: usize) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    /// Sets column and row gap to the same value.
    pub fn with_gap(mut self, gap: f32) -> Self {
        self.column_gap = gap;
        self.row_gap = gap;
        self
    }

    pub fn with_padding(mut self, padding: impl Into<Padding>) -> Self {
        self.padding = padding.into();
        self
    }

    /// Column count clamped to at least one.
    pub fn effective_columns(&self) -> usize {
        self.columns.max(1)
    }

    /// Width of a single column for a container of `container_width`.
    ///
    /// `(container_width - horizontal padding - column_gap * (columns - 1)) / columns`,
    /// unless a fixed width is configured. May be zero or negative.
    pub fn column_width_for(&self, container_width: f32) -> f32 {
        if let Some(width) = self.column_width {
            return width;
        }
        let columns = self.effective_columns() as f32;
        let available =
            container_width - self.padding.horizontal() - self.column_gap * (columns - 1.0);
        available / columns
    }

    /// Horizontal offset of `column`.
    pub fn column_x(&self, column: usize, column_width: f32) -> f32 {
        self.padding.left + column as f32 * (column_width + self.column_gap)
    }
}
