use assetry_store::StoreError;
use assetry_thumb::ThumbError;
use assetry_types::MediaType;
use thiserror::Error;

/// Errors surfaced by the asset pipelines.
///
/// `MissingField`, `SizeExceeded`, `UnsupportedMediaType`, `NotFound` and
/// `UploadInterrupted` are the caller's doing and may be shown verbatim.
/// `StorageFailure` and `DerivationFailure` are server-side faults.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("field `{0}` is missing from the upload")]
    MissingField(String),

    #[error("file exceeds the {limit}-byte upload limit")]
    SizeExceeded { limit: u64 },

    #[error("cannot get thumbnail of {0} content")]
    UnsupportedMediaType(MediaType),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upload stream interrupted: {0}")]
    UploadInterrupted(#[source] std::io::Error),

    #[error("storage failure: {0}")]
    StorageFailure(#[source] StoreError),

    #[error("thumbnail derivation failed: {0}")]
    DerivationFailure(String),
}

impl AssetError {
    /// Whether the error is attributable to the request rather than the
    /// server.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::StorageFailure(_) | Self::DerivationFailure(_)
        )
    }
}

impl From<StoreError> for AssetError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(name) => Self::NotFound(format!("blob {name}")),
            StoreError::SizeExceeded { limit } => Self::SizeExceeded { limit },
            StoreError::ContentRead(io) => Self::UploadInterrupted(io),
            other => Self::StorageFailure(other),
        }
    }
}

impl From<ThumbError> for AssetError {
    fn from(e: ThumbError) -> Self {
        match e {
            ThumbError::UnsupportedMediaType(mt) => Self::UnsupportedMediaType(mt),
            ThumbError::SourceNotFound(name) => Self::NotFound(format!("blob {name}")),
            ThumbError::Derivation(msg) => Self::DerivationFailure(msg),
        }
    }
}

pub type AssetResult<T> = Result<T, AssetError>;

#[cfg(test)]
mod tests {
    use super::*;
    use assetry_types::AssignedName;

    #[test]
    fn store_errors_map_to_taxonomy() {
        let name = AssignedName::generate();
        assert!(matches!(
            AssetError::from(StoreError::NotFound(name)),
            AssetError::NotFound(_)
        ));
        assert!(matches!(
            AssetError::from(StoreError::SizeExceeded { limit: 3 }),
            AssetError::SizeExceeded { limit: 3 }
        ));
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let e = AssetError::from(StoreError::Io(io));
        assert!(matches!(e, AssetError::StorageFailure(_)));
        assert!(!e.is_client_error());
    }

    #[test]
    fn thumb_errors_map_to_taxonomy() {
        let mt = MediaType::new("text/plain").unwrap();
        let e = AssetError::from(ThumbError::UnsupportedMediaType(mt));
        assert!(e.is_client_error());
        assert_eq!(e.to_string(), "cannot get thumbnail of text/plain content");
        assert!(matches!(
            AssetError::from(ThumbError::Derivation("bad".into())),
            AssetError::DerivationFailure(_)
        ));
    }
}
