use thiserror::Error;

use crate::persist::PersistError;

/// Errors raised while building a container, before any intent can run.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Invalid container configuration: {message}")]
    Configuration { message: String },

    #[error(transparent)]
    Persist(#[from] PersistError),
}
