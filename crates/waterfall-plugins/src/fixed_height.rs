use std::rc::Rc;

use waterfall_plugin::{Hook, ItemHeightFn, Plugin};

/// Gives every item the same height, turning the masonry into a grid.
#[derive(Clone, Copy, Debug)]
pub struct FixedHeightPlugin {
    height: f32,
}

impl FixedHeightPlugin {
    pub const NAME: &'static str = "fixed-height";

    pub fn new(height: f32) -> Self {
        Self { height }
    }

    pub fn build<T: 'static>(self) -> Plugin<T> {
        let height = self.height;
        Plugin::new(Self::NAME)
            .transform_props(move |mut props, _| {
                let fixed: ItemHeightFn<T> = Rc::new(move |_: &T, _: usize| height);
                props.item_height = Some(fixed);
                Ok(props)
            })
            .notify(Hook::Resize, |ctx, _| {
                ctx.actions.relayout();
                Ok(())
            })
    }
}

impl<T: 'static> From<FixedHeightPlugin> for Plugin<T> {
    fn from(plugin: FixedHeightPlugin) -> Self {
        plugin.build()
    }
}
