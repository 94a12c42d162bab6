//! Geometry primitives produced by the layout engine.

use smallvec::SmallVec;

/// Per-column running heights. Most layouts use a handful of columns.
pub type ColumnHeights = SmallVec<[f32; 8]>;

/// Width and height of a box in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Inner padding of the masonry container.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Padding {
    /// Same padding on every side.
    pub fn uniform(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

impl From<f32> for Padding {
    fn from(value: f32) -> Self {
        Padding::uniform(value)
    }
}

/// Placement of a single item inside the container.
///
/// `row` is the nominal row `index / columns`; it is informational and does
/// not imply alignment across columns.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ItemPosition {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub column: usize,
    pub row: usize,
}

impl ItemPosition {
    /// Bottom edge (exclusive) of the item.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Returns true when `[y, y + height)` intersects `[top, bottom)`.
    pub fn intersects(&self, top: f32, bottom: f32) -> bool {
        self.bottom() > top && self.y < bottom
    }
}

/// Result of the most recent committed layout pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutState {
    pub columns: usize,
    pub column_width: f32,
    pub gap: f32,
    pub column_heights: ColumnHeights,
    /// Always `>= max(column_heights)`.
    pub total_height: f32,
    pub container_width: f32,
    pub container_height: f32,
}

impl LayoutState {
    /// Height of the tallest column, or zero before the first layout.
    pub fn tallest_column(&self) -> f32 {
        self.column_heights.iter().copied().fold(0.0, f32::max)
    }

    /// Index of the shortest column. Ties resolve to the lowest index.
    pub fn shortest_column(&self) -> Option<usize> {
        shortest_column(&self.column_heights)
    }
}

/// Index of the shortest entry. Ties resolve to the lowest index.
pub fn shortest_column(heights: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &height) in heights.iter().enumerate() {
        match best {
            Some((_, current)) if height >= current => {}
            _ => best = Some((index, height)),
        }
    }
    best.map(|(index, _)| index)
}

/// Positions of every item in the current list, indexed by item index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionMap {
    positions: Vec<ItemPosition>,
}

impl PositionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, position: ItemPosition) {
        self.positions.push(position);
    }

    pub fn get(&self, index: usize) -> Option<&ItemPosition> {
        self.positions.get(index)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Iterates `(index, position)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ItemPosition)> {
        self.positions.iter().enumerate()
    }

    pub fn as_slice(&self) -> &[ItemPosition] {
        &self.positions
    }
}

impl FromIterator<ItemPosition> for PositionMap {
    fn from_iter<I: IntoIterator<Item = ItemPosition>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}
