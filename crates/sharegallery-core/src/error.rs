use thiserror::Error;

use crate::remote::RemoteError;
use crate::resize::ResizeError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Resize error: {0}")]
    Resize(#[from] ResizeError),

    #[error("Thumbnail storage error: {0}")]
    StorageIo(#[from] std::io::Error),
}

impl Error {
    /// True when the identifier is absent from the index
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
