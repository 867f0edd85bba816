use thiserror::Error;

/// Errors shared by every domsync crate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// A caller handed the engine something it can never render, such as an
    /// update without any way to address the element client-side.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl CommonError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

impl From<String> for CommonError {
    fn from(s: String) -> Self {
        CommonError::Generic(s)
    }
}

impl From<&str> for CommonError {
    fn from(s: &str) -> Self {
        CommonError::Generic(s.to_string())
    }
}
