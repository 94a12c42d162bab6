//! Frames handed to the render collaborator.

use waterfall_core::ItemPosition;

/// Maps an item to its visual content. The composition only wraps the result
/// with the computed position.
pub trait ItemRenderer<T, O> {
    fn render(&mut self, item: &T, index: usize) -> O;
}

impl<T, O, F> ItemRenderer<T, O> for F
where
    F: FnMut(&T, usize) -> O,
{
    fn render(&mut self, item: &T, index: usize) -> O {
        self(item, index)
    }
}

/// Rendered content placed at its layout position.
#[derive(Clone, Debug, PartialEq)]
pub struct Positioned<O> {
    pub index: usize,
    pub position: ItemPosition,
    pub content: O,
}

/// One frame of the composition.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame<O = ()> {
    /// Rendered subset in index order.
    pub items: Vec<Positioned<O>>,
    /// Height of the scrollable content.
    pub total_height: f32,
    /// True when no layout could be committed yet and `total_height` is an
    /// estimate with no items placed.
    pub placeholder: bool,
    /// Bumped by `force_update`.
    pub version: u64,
}

impl<O> Frame<O> {
    pub fn indices(&self) -> Vec<usize> {
        self.items.iter().map(|item| item.index).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn map<P>(self, mut content: impl FnMut(usize) -> P) -> Frame<P> {
        Frame {
            items: self
                .items
                .into_iter()
                .map(|item| Positioned {
                    index: item.index,
                    position: item.position,
                    content: content(item.index),
                })
                .collect(),
            total_height: self.total_height,
            placeholder: self.placeholder,
            version: self.version,
        }
    }
}
