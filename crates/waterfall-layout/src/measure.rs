//! Core placement algorithm.

use smallvec::smallvec;
use waterfall_core::{ColumnHeights, ItemPosition, LayoutState, PositionMap, Size, SkipReason};

use crate::assign::{ColumnAssigner, ShortestColumn};
use crate::LayoutConfig;

/// A committed-ready layout: the shared state plus every item's position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MasonryLayout {
    pub state: LayoutState,
    pub positions: PositionMap,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LayoutOutcome {
    Computed(MasonryLayout),
    /// Nothing was computed; the caller keeps its previous layout.
    Skipped(SkipReason),
}

impl LayoutOutcome {
    pub fn computed(self) -> Option<MasonryLayout> {
        match self {
            LayoutOutcome::Computed(layout) => Some(layout),
            LayoutOutcome::Skipped(_) => None,
        }
    }
}

/// What an explicit placement override gets to see for one item.
#[derive(Clone, Copy, Debug)]
pub struct PlacementQuery<'a> {
    pub index: usize,
    pub height: f32,
    pub columns: usize,
    pub column_width: f32,
    pub column_heights: &'a [f32],
}

/// Lays out `item_count` items with the greedy shortest-column strategy and no
/// placement overrides.
pub fn layout_masonry<H>(
    item_count: usize,
    container: Size,
    config: &LayoutConfig,
    height_of: H,
) -> LayoutOutcome
where
    H: FnMut(usize) -> Option<f32>,
{
    measure_masonry(
        item_count,
        container,
        config,
        height_of,
        &mut ShortestColumn,
        |_: &PlacementQuery<'_>| None,
    )
}

/// Measures and places every item.
///
/// # Arguments
/// * `item_count` - Number of items in the list
/// * `container` - Container size; only the width affects placement
/// * `config` - Columns, gaps, padding and the height estimate
/// * `height_of` - Known height of an item, `None` to use the estimate
/// * `assigner` - Column choice for items without an explicit placement
/// * `place` - Explicit placement override, `None` to use the assigner
///
/// Returns [`LayoutOutcome::Skipped`] without side effects when there are no
/// items or no room for a column.
pub fn measure_masonry<H, A, P>(
    item_count: usize,
    container: Size,
    config: &LayoutConfig,
    mut height_of: H,
    assigner: &mut A,
    mut place: P,
) -> LayoutOutcome
where
    H: FnMut(usize) -> Option<f32>,
    A: ColumnAssigner + ?Sized,
    P: FnMut(&PlacementQuery<'_>) -> Option<ItemPosition>,
{
    if item_count == 0 {
        return LayoutOutcome::Skipped(SkipReason::NoItems);
    }

    let columns = config.effective_columns();
    let column_width = config.column_width_for(container.width);
    if column_width.is_nan() || column_width <= 0.0 {
        log::debug!(
            "masonry layout deferred: column width {column_width} for container width {}",
            container.width
        );
        return LayoutOutcome::Skipped(SkipReason::NonPositiveColumnWidth);
    }

    let mut column_heights: ColumnHeights = smallvec![config.padding.top; columns];
    let mut positions = PositionMap::with_capacity(item_count);

    for index in 0..item_count {
        let height = height_of(index)
            .filter(|h| h.is_finite() && *h >= 0.0)
            .unwrap_or(config.estimated_item_height);

        let query = PlacementQuery {
            index,
            height,
            columns,
            column_width,
            column_heights: &column_heights,
        };
        let position = match place(&query) {
            Some(mut explicit) => {
                explicit.column = explicit.column.min(columns - 1);
                let floor = explicit.bottom() + config.row_gap;
                let slot = &mut column_heights[explicit.column];
                if floor > *slot {
                    *slot = floor;
                }
                explicit
            }
            None => {
                let column = assigner.assign(index, &column_heights).min(columns - 1);
                let y = column_heights[column];
                column_heights[column] = y + height + config.row_gap;
                ItemPosition {
                    x: config.column_x(column, column_width),
                    y,
                    width: column_width,
                    height,
                    column,
                    row: index / columns,
                }
            }
        };
        positions.push(position);
    }

    let tallest = column_heights.iter().copied().fold(0.0, f32::max);
    let state = LayoutState {
        columns,
        column_width,
        gap: config.column_gap,
        column_heights,
        total_height: tallest + config.padding.bottom,
        container_width: container.width,
        container_height: container.height,
    };
    LayoutOutcome::Computed(MasonryLayout { state, positions })
}
