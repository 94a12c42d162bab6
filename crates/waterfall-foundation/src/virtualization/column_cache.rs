use waterfall_core::geometry::shortest_column;
use waterfall_layout::ColumnAssigner;

/// Write-once `index -> column` assignments for one list identity.
///
/// The first pass that sees an index assigns it to the shortest column and
/// records it; later passes reuse the recorded column so that height drift
/// never moves an item sideways. A recorded column that no longer exists
/// (the column count shrank) is reassigned.
#[derive(Clone, Debug, Default)]
pub struct StableColumnCache {
    assignments: Vec<Option<usize>>,
}

impl StableColumnCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<usize> {
        self.assignments.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.assignments.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every assignment. Called when the list identity changes.
    pub fn clear(&mut self) {
        self.assignments.clear();
    }
}

impl ColumnAssigner for StableColumnCache {
    fn assign(&mut self, index: usize, column_heights: &[f32]) -> usize {
        if let Some(column) = self.get(index) {
            if column < column_heights.len() {
                return column;
            }
        }
        let column = shortest_column(column_heights).unwrap_or(0);
        if self.assignments.len() <= index {
            self.assignments.resize(index + 1, None);
        }
        self.assignments[index] = Some(column);
        column
    }
}
