use assetry_types::AssignedName;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested blob does not exist.
    #[error("blob not found: {0}")]
    NotFound(AssignedName),

    /// The content crossed the configured size ceiling.
    #[error("content exceeds the {limit}-byte limit")]
    SizeExceeded { limit: u64 },

    /// Reading the caller's content stream failed (client disconnect,
    /// malformed transfer encoding, ...). Nothing was stored.
    #[error("failed reading upload content: {0}")]
    ContentRead(#[source] std::io::Error),

    /// Could not find an unused name after repeated attempts.
    #[error("no free blob name after {attempts} attempts")]
    NameExhausted { attempts: usize },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
