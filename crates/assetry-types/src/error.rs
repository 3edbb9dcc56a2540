use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid assigned name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("invalid media type: {0:?}")]
    InvalidMediaType(String),
}
