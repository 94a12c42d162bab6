//! Viewport snapshots and per-item visibility.

use crate::geometry::ItemPosition;

/// Direction of the most recent scroll movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Raw scroll metrics reported by the host's scroll container.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f32,
    pub scroll_left: f32,
    pub scroll_height: f32,
    pub scroll_width: f32,
    pub client_height: f32,
    pub client_width: f32,
}

/// Snapshot of the scroll container. Replaced wholesale on every scroll event.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportState {
    pub scroll_top: f32,
    pub scroll_left: f32,
    pub scroll_height: f32,
    pub scroll_width: f32,
    pub client_height: f32,
    pub client_width: f32,
    pub is_scrolling: bool,
    pub direction: Option<ScrollDirection>,
}

impl ViewportState {
    /// Bottom edge (exclusive) of the visible area.
    pub fn visible_bottom(&self) -> f32 {
        self.scroll_top + self.client_height
    }

    /// Remaining scrollable distance below the visible area.
    pub fn distance_to_bottom(&self) -> f32 {
        self.scroll_height - self.visible_bottom()
    }

    pub fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: self.scroll_top,
            scroll_left: self.scroll_left,
            scroll_height: self.scroll_height,
            scroll_width: self.scroll_width,
            client_height: self.client_height,
            client_width: self.client_width,
        }
    }
}

/// How much of an item is inside the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ItemVisibility {
    pub index: usize,
    pub is_visible: bool,
    /// Visible fraction of the item's height in `[0, 1]`.
    pub visible_ratio: f32,
    pub is_above_viewport: bool,
    pub is_below_viewport: bool,
}

impl ItemVisibility {
    /// Computes visibility of `position` against the viewport (no overscan).
    pub fn compute(index: usize, position: &ItemPosition, viewport: &ViewportState) -> Self {
        let top = viewport.scroll_top;
        let bottom = viewport.visible_bottom();
        let item_bottom = position.bottom();
        let is_above_viewport = item_bottom <= top;
        let is_below_viewport = position.y >= bottom;
        let is_visible = !is_above_viewport && !is_below_viewport;
        let visible_ratio = if is_visible && position.height > 0.0 {
            let visible = item_bottom.min(bottom) - position.y.max(top);
            (visible / position.height).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            index,
            is_visible,
            visible_ratio,
            is_above_viewport,
            is_below_viewport,
        }
    }
}
