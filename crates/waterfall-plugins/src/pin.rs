//! Pins chosen items to the top of one column.
//!
//! Pinned items stack in index order. An item laid out before a pinned index
//! keeps its slot, so the pinned item starts below whatever already fills the
//! column.

use std::cell::Cell;
use std::rc::Rc;

use rustc_hash::FxHashSet;
use waterfall_core::ItemPosition;
use waterfall_plugin::{Hook, HookArgs, Plugin};

#[derive(Clone, Debug)]
pub struct PinItemPlugin {
    pinned: FxHashSet<usize>,
    column: usize,
}

impl PinItemPlugin {
    pub const NAME: &'static str = "pin-item";

    pub fn new(pinned: impl IntoIterator<Item = usize>) -> Self {
        Self {
            pinned: pinned.into_iter().collect(),
            column: 0,
        }
    }

    /// Column the pinned items stack in. Clamped to the last column.
    pub fn column(mut self, column: usize) -> Self {
        self.column = column;
        self
    }

    pub fn build<T: 'static>(self) -> Plugin<T> {
        let Self { pinned, column } = self;
        // Bottom of the pinned stack within the current pass.
        let offset = Rc::new(Cell::new(0.0f32));
        let reset = Rc::clone(&offset);
        Plugin::new(Self::NAME)
            .veto(Hook::BeforeLayout, move |_, _| {
                reset.set(0.0);
                Ok(true)
            })
            .calculate_item_position(move |ctx, args| {
                let HookArgs::ItemPosition {
                    index,
                    height,
                    column_width,
                    column_heights,
                } = *args
                else {
                    return None;
                };
                if !pinned.contains(&index) {
                    return None;
                }
                let props = &ctx.props;
                let column = column.min(column_heights.len().saturating_sub(1));
                let y = column_heights[column].max(props.padding.top + offset.get());
                offset.set(y - props.padding.top + height + props.effective_row_gap());
                Some(ItemPosition {
                    x: props.padding.left
                        + column as f32 * (column_width + props.effective_column_gap()),
                    y,
                    width: column_width,
                    height,
                    column,
                    row: 0,
                })
            })
    }
}

impl<T: 'static> From<PinItemPlugin> for Plugin<T> {
    fn from(plugin: PinItemPlugin) -> Self {
        plugin.build()
    }
}
