//! Column and row gaps, optionally varying with the container width.

use waterfall_plugin::{Hook, Plugin};

/// Gap values that replace the configured ones when set.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GapOverride {
    pub column_gap: Option<f32>,
    pub row_gap: Option<f32>,
}

impl GapOverride {
    pub fn new(column_gap: f32, row_gap: f32) -> Self {
        Self {
            column_gap: Some(column_gap),
            row_gap: Some(row_gap),
        }
    }
}

/// Width classes: `sm` from 0, `md` from 768, `lg` from 992, `xl` from 1200.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GapBreakpoints {
    pub sm: Option<GapOverride>,
    pub md: Option<GapOverride>,
    pub lg: Option<GapOverride>,
    pub xl: Option<GapOverride>,
}

impl GapBreakpoints {
    pub const MD: f32 = 768.0;
    pub const LG: f32 = 992.0;
    pub const XL: f32 = 1200.0;

    /// Override for `width`: the widest class reached that is configured,
    /// falling back to `sm`.
    pub fn pick(&self, width: f32) -> Option<GapOverride> {
        let classes = [(Self::XL, self.xl), (Self::LG, self.lg), (Self::MD, self.md)];
        classes
            .into_iter()
            .find_map(|(min, gap)| gap.filter(|_| width >= min))
            .or(self.sm)
    }
}

#[derive(Clone, Debug, Default)]
pub struct GapPlugin {
    base: GapOverride,
    responsive: GapBreakpoints,
}

impl GapPlugin {
    pub const NAME: &'static str = "gap";

    pub fn new(column_gap: f32, row_gap: f32) -> Self {
        Self {
            base: GapOverride::new(column_gap, row_gap),
            responsive: GapBreakpoints::default(),
        }
    }

    pub fn column_gap(mut self, gap: f32) -> Self {
        self.base.column_gap = Some(gap);
        self
    }

    pub fn row_gap(mut self, gap: f32) -> Self {
        self.base.row_gap = Some(gap);
        self
    }

    pub fn responsive(mut self, breakpoints: GapBreakpoints) -> Self {
        self.responsive = breakpoints;
        self
    }

    pub fn build<T: 'static>(self) -> Plugin<T> {
        Plugin::new(Self::NAME)
            .transform_props(move |mut props, env| {
                let responsive = env
                    .container_width()
                    .and_then(|width| self.responsive.pick(width))
                    .unwrap_or_default();
                if let Some(gap) = responsive.column_gap.or(self.base.column_gap) {
                    props.column_gap = Some(gap);
                }
                if let Some(gap) = responsive.row_gap.or(self.base.row_gap) {
                    props.row_gap = Some(gap);
                }
                Ok(props)
            })
            .notify(Hook::Resize, |ctx, _| {
                ctx.actions.relayout();
                Ok(())
            })
    }
}

impl<T: 'static> From<GapPlugin> for Plugin<T> {
    fn from(plugin: GapPlugin) -> Self {
        plugin.build()
    }
}
