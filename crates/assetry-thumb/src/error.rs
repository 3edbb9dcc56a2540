use assetry_store::StoreError;
use assetry_types::{AssignedName, MediaType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThumbError {
    #[error("cannot render a thumbnail of {0} content")]
    UnsupportedMediaType(MediaType),

    #[error("source blob not found: {0}")]
    SourceNotFound(AssignedName),

    #[error("thumbnail derivation failed: {0}")]
    Derivation(String),
}

impl From<StoreError> for ThumbError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(name) => Self::SourceNotFound(name),
            other => Self::Derivation(format!("reading source: {other}")),
        }
    }
}

pub type ThumbResult<T> = Result<T, ThumbError>;
