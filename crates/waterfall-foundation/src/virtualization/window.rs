//! Windowing against the viewport.

use waterfall_core::{PositionMap, ViewportState};

/// Rendered band `[scroll_top - overscan, scroll_top + client_height + overscan)`.
pub fn window_bounds(viewport: &ViewportState, overscan: f32) -> (f32, f32) {
    let overscan = overscan.max(0.0);
    (
        viewport.scroll_top - overscan,
        viewport.visible_bottom() + overscan,
    )
}

/// Indices whose `[y, y + height)` intersects the band, in index order.
pub fn windowed_indices(positions: &PositionMap, viewport: &ViewportState, overscan: f32) -> Vec<usize> {
    let (top, bottom) = window_bounds(viewport, overscan);
    positions
        .iter()
        .filter(|(_, position)| position.intersects(top, bottom))
        .map(|(index, _)| index)
        .collect()
}

/// Total height reserved before any container metrics exist:
/// `ceil(count / columns) * (estimate + gap)`.
pub fn placeholder_height(count: usize, columns: usize, estimate: f32, gap: f32) -> f32 {
    let columns = columns.max(1);
    let rows = count.div_ceil(columns);
    rows as f32 * (estimate + gap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use waterfall_core::ItemPosition;

    fn item(y: f32, height: f32) -> ItemPosition {
        ItemPosition {
            y,
            height,
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_overscan_edges() {
        let positions: PositionMap = vec![
            item(300.0, 200.0), // ends exactly at scroll top
            item(890.0, 60.0),  // [890, 950) crosses the bottom edge
            item(900.0, 50.0),  // [900, 950) starts at the bottom edge
            item(499.0, 1.0),   // [499, 500)
            item(499.0, 2.0),   // [499, 501)
        ]
        .into_iter()
        .collect();
        let viewport = ViewportState {
            scroll_top: 500.0,
            client_height: 400.0,
            ..Default::default()
        };
        assert_eq!(windowed_indices(&positions, &viewport, 0.0), vec![1, 4]);
    }

    #[test]
    fn test_overscan_extends_band() {
        let positions: PositionMap = vec![item(0.0, 100.0), item(1150.0, 100.0)]
            .into_iter()
            .collect();
        let viewport = ViewportState {
            scroll_top: 500.0,
            client_height: 400.0,
            ..Default::default()
        };
        assert_eq!(window_bounds(&viewport, 300.0), (200.0, 1200.0));
        assert_eq!(windowed_indices(&positions, &viewport, 300.0), vec![1]);
    }

    #[test]
    fn test_placeholder_height() {
        // ceil(10 / 3) = 4 rows of 216
        assert_eq!(placeholder_height(10, 3, 200.0, 16.0), 864.0);
        assert_eq!(placeholder_height(0, 3, 200.0, 16.0), 0.0);
        assert_eq!(placeholder_height(5, 0, 100.0, 0.0), 500.0);
    }
}
