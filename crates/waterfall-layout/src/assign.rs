use waterfall_core::geometry::shortest_column;

/// Chooses the column for the next item.
pub trait ColumnAssigner {
    /// Returns the column for `index` given the running `column_heights`.
    /// Out-of-range results are clamped by the engine.
    fn assign(&mut self, index: usize, column_heights: &[f32]) -> usize;
}

/// Greedy assignment to the shortest column, lowest index on ties.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShortestColumn;

impl ColumnAssigner for ShortestColumn {
    fn assign(&mut self, _index: usize, column_heights: &[f32]) -> usize {
        shortest_column(column_heights).unwrap_or(0)
    }
}

impl<F> ColumnAssigner for F
where
    F: FnMut(usize, &[f32]) -> usize,
{
    fn assign(&mut self, index: usize, column_heights: &[f32]) -> usize {
        self(index, column_heights)
    }
}
