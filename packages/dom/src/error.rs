use domsync_common::CommonError;
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that abort a synchronization pass
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Cannot update an element without an id or an addressing expression")]
    Unaddressable,

    #[error("Markup can only be rendered for created elements, got an update of '{id}'")]
    MarkupForUpdate { id: String },

    #[error("Script batches address existing elements, got a created '{kind}' root")]
    CreatedRoot { kind: String },

    #[error(transparent)]
    Common(#[from] CommonError),
}

impl From<String> for RenderError {
    fn from(s: String) -> Self {
        RenderError::Common(CommonError::Generic(s))
    }
}

impl From<&str> for RenderError {
    fn from(s: &str) -> Self {
        RenderError::Common(CommonError::Generic(s.to_string()))
    }
}
