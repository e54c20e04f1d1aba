use thiserror::Error;

use crate::events::ValidationError;

/// Failure of a session operation.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The event was rejected before touching the store.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.0)
    }
}
