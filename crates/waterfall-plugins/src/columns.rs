//! Column count derived from the container width.

use waterfall_plugin::{Hook, Plugin};

/// Minimum container width at which `columns` applies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Breakpoint {
    pub width: f32,
    pub columns: usize,
}

impl Breakpoint {
    pub fn new(width: f32, columns: usize) -> Self {
        Self { width, columns }
    }
}

/// Picks the column count of the widest breakpoint the container reaches.
///
/// Below every breakpoint, or before the container has been measured, the
/// host's `columns` prop stands.
#[derive(Clone, Debug)]
pub struct ResponsiveColumnsPlugin {
    breakpoints: Vec<Breakpoint>,
}

impl ResponsiveColumnsPlugin {
    pub const NAME: &'static str = "responsive-columns";

    pub fn new(breakpoints: impl IntoIterator<Item = Breakpoint>) -> Self {
        let mut breakpoints: Vec<Breakpoint> = breakpoints.into_iter().collect();
        breakpoints.sort_by(|a, b| a.width.total_cmp(&b.width));
        Self { breakpoints }
    }

    pub fn columns_for(&self, width: f32) -> Option<usize> {
        self.breakpoints
            .iter()
            .rev()
            .find(|breakpoint| width >= breakpoint.width)
            .map(|breakpoint| breakpoint.columns)
    }

    pub fn build<T: 'static>(self) -> Plugin<T> {
        Plugin::new(Self::NAME)
            .transform_props(move |mut props, env| {
                if let Some(columns) = env.container_width().and_then(|w| self.columns_for(w)) {
                    props.columns = columns;
                }
                Ok(props)
            })
            .notify(Hook::Resize, |ctx, _| {
                ctx.actions.relayout();
                Ok(())
            })
    }
}

impl<T: 'static> From<ResponsiveColumnsPlugin> for Plugin<T> {
    fn from(plugin: ResponsiveColumnsPlugin) -> Self {
        plugin.build()
    }
}

/// Fits as many columns of at least `min_column_width` as the container allows:
/// `floor((available + gap) / (min_column_width + gap))`, where `available` is
/// the container width less horizontal padding.
#[derive(Clone, Debug)]
pub struct AutoColumnPlugin {
    min_column_width: f32,
    min_columns: usize,
    max_columns: Option<usize>,
}

impl AutoColumnPlugin {
    pub const NAME: &'static str = "auto-column";

    pub fn new(min_column_width: f32) -> Self {
        Self {
            min_column_width,
            min_columns: 1,
            max_columns: None,
        }
    }

    pub fn min_columns(mut self, min_columns: usize) -> Self {
        self.min_columns = min_columns;
        self
    }

    pub fn max_columns(mut self, max_columns: usize) -> Self {
        self.max_columns = Some(max_columns);
        self
    }

    pub fn columns_for(&self, width: f32, horizontal_padding: f32, gap: f32) -> usize {
        let available = (width - horizontal_padding).max(0.0);
        let fit = ((available + gap) / (self.min_column_width + gap)).floor();
        let base = if fit.is_finite() && fit >= 1.0 {
            fit as usize
        } else {
            1
        };
        let floor = self.min_columns.max(1);
        let ceiling = self.max_columns.unwrap_or(usize::MAX).max(floor);
        base.clamp(floor, ceiling)
    }

    pub fn build<T: 'static>(self) -> Plugin<T> {
        Plugin::new(Self::NAME)
            .transform_props(move |mut props, env| {
                if let Some(width) = env.container_width() {
                    props.columns = self.columns_for(
                        width,
                        props.padding.horizontal(),
                        props.effective_column_gap(),
                    );
                }
                Ok(props)
            })
            .notify(Hook::Resize, |ctx, _| {
                ctx.actions.relayout();
                Ok(())
            })
    }
}

impl<T: 'static> From<AutoColumnPlugin> for Plugin<T> {
    fn from(plugin: AutoColumnPlugin) -> Self {
        plugin.build()
    }
}
