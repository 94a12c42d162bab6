use thiserror::Error;

/// Why a layout pass did not run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The item list is empty.
    NoItems,
    /// The box-metrics collaborator has not reported a container size yet.
    NoContainerMetrics,
    /// Padding and gaps leave no room for a column.
    NonPositiveColumnWidth,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::NoItems => "no items",
            SkipReason::NoContainerMetrics => "container metrics unavailable",
            SkipReason::NonPositiveColumnWidth => "column width is not positive",
        };
        f.write_str(text)
    }
}

/// Failure kinds of the layout pipeline.
///
/// None of these escape to the host as hard failures: the pipeline logs them
/// at the level returned by [`WaterfallError::log_level`] and keeps the last
/// committed state visible.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WaterfallError {
    #[error("precondition not met: {0}")]
    PreconditionNotMet(SkipReason),

    #[error("layout vetoed by plugin `{plugin}`")]
    VetoAbort { plugin: String },

    #[error("plugin `{plugin}` failed in {hook}: {message}")]
    Extension {
        plugin: String,
        hook: &'static str,
        message: String,
    },

    #[error("height change of {delta}px for item {index} is below the noise threshold")]
    MeasurementNoise { index: usize, delta: f32 },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("item {0} is out of range")]
    UnknownItem(usize),
}

impl WaterfallError {
    /// Level at which the pipeline reports this error.
    pub fn log_level(&self) -> log::Level {
        match self {
            WaterfallError::Extension { .. } => log::Level::Warn,
            WaterfallError::MeasurementNoise { .. } => log::Level::Trace,
            _ => log::Level::Debug,
        }
    }

    /// Logs the error at its own level.
    pub fn report(&self) {
        log::log!(self.log_level(), "{self}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_extension_errors_warn() {
        let ext = WaterfallError::Extension {
            plugin: "sort".into(),
            hook: "transform_props",
            message: "boom".into(),
        };
        assert_eq!(ext.log_level(), log::Level::Warn);
        assert_eq!(
            WaterfallError::PreconditionNotMet(SkipReason::NoItems).log_level(),
            log::Level::Debug
        );
        assert_eq!(
            ext.to_string(),
            "plugin `sort` failed in transform_props: boom"
        );
    }
}
