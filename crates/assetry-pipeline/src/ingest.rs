use tracing::{debug, info};

use crate::config::FILE_FIELD_NAME;
use crate::error::{AssetError, AssetResult};
use crate::service::AssetService;
use crate::upload::{IngestedAsset, IngestionMode, UploadRequest};

impl AssetService {
    /// Validate an upload and store its content as a new blob.
    ///
    /// In [`IngestionMode::MetadataOnly`] the upload (if any) is ignored and
    /// `Ok(None)` is returned. Otherwise the upload must be present and must
    /// have arrived under [`FILE_FIELD_NAME`]; its content is streamed to the
    /// blob store, which aborts as soon as the size ceiling is crossed.
    ///
    /// The returned [`IngestedAsset`] is for the caller to persist. If that
    /// persistence fails, the blob stays behind unreferenced.
    pub async fn ingest(
        &self,
        mode: IngestionMode,
        upload: Option<UploadRequest<'_>>,
    ) -> AssetResult<Option<IngestedAsset>> {
        if mode == IngestionMode::MetadataOnly {
            debug!("metadata-only request, skipping blob ingestion");
            return Ok(None);
        }

        let mut upload = match upload {
            Some(upload) if upload.field == FILE_FIELD_NAME => upload,
            _ => return Err(AssetError::MissingField(FILE_FIELD_NAME.to_string())),
        };

        let stored = self
            .store
            .put(upload.content.as_mut(), upload.declared_size)
            .await?;

        info!(
            name = %stored.name,
            original_name = %upload.original_name,
            media_type = %upload.media_type,
            size = stored.size,
            "asset ingested"
        );
        Ok(Some(IngestedAsset {
            name: stored.name,
            original_name: upload.original_name,
            media_type: upload.media_type,
            size: stored.size,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::{memory_service, upload};
    use std::collections::HashSet;

    #[tokio::test]
    async fn ingest_returns_metadata() {
        let (_dir, store, service) = memory_service(1024).await;
        let asset = service
            .ingest(
                IngestionMode::WithBlob,
                Some(upload(b"hello".to_vec(), "hello.txt", "text/plain")),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(asset.original_name, "hello.txt");
        assert_eq!(asset.media_type.as_str(), "text/plain");
        assert_eq!(asset.size, 5);
        assert_ne!(asset.name.as_str(), "hello.txt");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn names_never_repeat() {
        let (_dir, _store, service) = memory_service(1024).await;
        let mut seen = HashSet::new();
        for _ in 0..100 {
            let asset = service
                .ingest(
                    IngestionMode::WithBlob,
                    Some(upload(b"same".to_vec(), "same.bin", "application/octet-stream")),
                )
                .await
                .unwrap()
                .unwrap();
            assert!(seen.insert(asset.name));
        }
    }

    #[tokio::test]
    async fn missing_upload_is_missing_field() {
        let (_dir, _store, service) = memory_service(1024).await;
        let err = service.ingest(IngestionMode::WithBlob, None).await.unwrap_err();
        assert!(matches!(err, AssetError::MissingField(f) if f == "file"));
    }

    #[tokio::test]
    async fn wrong_field_is_missing_field() {
        let (_dir, store, service) = memory_service(1024).await;
        let mut req = upload(b"x".to_vec(), "x.txt", "text/plain");
        req.field = "attachment".into();
        let err = service
            .ingest(IngestionMode::WithBlob, Some(req))
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::MissingField(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn oversized_upload_leaves_no_blob() {
        let (_dir, store, service) = memory_service(8).await;
        let err = service
            .ingest(
                IngestionMode::WithBlob,
                Some(upload(vec![0u8; 9], "big.bin", "application/octet-stream")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::SizeExceeded { limit: 8 }));
        assert!(err.is_client_error());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn declared_size_over_limit_is_rejected() {
        let (_dir, store, service) = memory_service(8).await;
        let req = upload(vec![1, 2, 3], "small.bin", "application/octet-stream")
            .with_declared_size(1 << 30);
        let err = service
            .ingest(IngestionMode::WithBlob, Some(req))
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::SizeExceeded { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn metadata_only_skips_blob() {
        let (_dir, store, service) = memory_service(1024).await;
        let out = service
            .ingest(
                IngestionMode::MetadataOnly,
                Some(upload(b"ignored".to_vec(), "x.txt", "text/plain")),
            )
            .await
            .unwrap();
        assert!(out.is_none());
        assert!(store.is_empty());
        assert!(service
            .ingest(IngestionMode::MetadataOnly, None)
            .await
            .unwrap()
            .is_none());
    }
}
