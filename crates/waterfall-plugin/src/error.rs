use thiserror::Error;

/// Error returned by a plugin handler, initializer or teardown.
///
/// Plugin errors never cross the dispatch boundary: the manager logs them,
/// records them for the error extension point and moves on.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PluginError {
    #[error("{0}")]
    Message(String),

    #[error("hook returned a value of the wrong kind")]
    UnexpectedValue,

    #[error("missing dependency `{0}`")]
    MissingDependency(String),
}

impl PluginError {
    pub fn msg(message: impl Into<String>) -> Self {
        PluginError::Message(message.into())
    }
}

impl From<&str> for PluginError {
    fn from(message: &str) -> Self {
        PluginError::Message(message.to_owned())
    }
}

impl From<String> for PluginError {
    fn from(message: String) -> Self {
        PluginError::Message(message)
    }
}
