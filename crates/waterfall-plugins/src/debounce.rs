use std::time::Duration;

use waterfall_plugin::Plugin;

/// Replaces the layout debounce window.
#[derive(Clone, Copy, Debug)]
pub struct DebounceLayoutPlugin {
    delay: Duration,
}

impl DebounceLayoutPlugin {
    pub const NAME: &'static str = "debounce-layout";

    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn build<T: 'static>(self) -> Plugin<T> {
        let delay = self.delay;
        Plugin::new(Self::NAME).transform_props(move |mut props, _| {
            props.debounce = delay;
            Ok(props)
        })
    }
}

impl<T: 'static> From<DebounceLayoutPlugin> for Plugin<T> {
    fn from(plugin: DebounceLayoutPlugin) -> Self {
        plugin.build()
    }
}
