//! Programmatic scroll requests.

use crate::geometry::ItemPosition;

/// Animation hint passed through to the host scroll container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollBehavior {
    #[default]
    Auto,
    Smooth,
    Instant,
}

/// Where the target item should land inside the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollBlock {
    #[default]
    Start,
    Center,
    End,
    Nearest,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollToOptions {
    pub behavior: ScrollBehavior,
    pub block: ScrollBlock,
    /// Extra offset added to the computed scroll top.
    pub offset: f32,
}

impl ScrollToOptions {
    pub fn smooth() -> Self {
        Self {
            behavior: ScrollBehavior::Smooth,
            ..Default::default()
        }
    }

    pub fn with_block(mut self, block: ScrollBlock) -> Self {
        self.block = block;
        self
    }

    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    /// Scroll top that brings `position` into view inside a viewport of
    /// `client_height`, never negative.
    ///
    /// `Nearest` keeps the current offset when the item is already fully
    /// visible, otherwise aligns the nearer edge.
    pub fn target_for(
        &self,
        position: &ItemPosition,
        client_height: f32,
        current_top: f32,
    ) -> f32 {
        let base = position.y + self.offset;
        let top = match self.block {
            ScrollBlock::Start => base,
            ScrollBlock::Center => base - (client_height / 2.0 - position.height / 2.0),
            ScrollBlock::End => base - (client_height - position.height),
            ScrollBlock::Nearest => {
                if position.y >= current_top && position.bottom() <= current_top + client_height {
                    current_top
                } else if position.y < current_top {
                    base
                } else {
                    base - (client_height - position.height)
                }
            }
        };
        top.max(0.0)
    }
}

/// A scroll the host should perform on the container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollRequest {
    pub top: f32,
    pub behavior: ScrollBehavior,
}
