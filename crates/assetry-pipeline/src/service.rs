use std::sync::Arc;

use assetry_store::{BlobReader, BlobStore, FsBlobStore};
use assetry_thumb::{Thumbnail, ThumbnailCache};
use assetry_types::{AssignedName, MediaType};
use tracing::debug;

use crate::config::AssetConfig;
use crate::error::{AssetError, AssetResult};

/// Entry point to the asset core.
///
/// Cheap to share behind an `Arc`; every method takes `&self` and may be
/// called concurrently.
pub struct AssetService {
    pub(crate) store: Arc<dyn BlobStore>,
    thumbnails: ThumbnailCache,
    config: AssetConfig,
}

impl AssetService {
    /// Open the filesystem-backed service described by `config`.
    pub async fn open(config: AssetConfig) -> AssetResult<Self> {
        let store = FsBlobStore::open(&config.files_root, config.max_file_size).await?;
        Self::with_store(Arc::new(store), config).await
    }

    /// Build the service over an existing blob store.
    ///
    /// Thumbnails are still written under `config.thumbnails_root()`.
    pub async fn with_store(store: Arc<dyn BlobStore>, config: AssetConfig) -> AssetResult<Self> {
        let thumbnails = ThumbnailCache::open(
            Arc::clone(&store),
            config.thumbnails_root(),
            config.thumbnail_config(),
        )
        .await?;
        debug!(files_root = %config.files_root.display(), "asset service ready");
        Ok(Self {
            store,
            thumbnails,
            config,
        })
    }

    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    pub fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    /// Open the primary blob for reading.
    pub async fn open_blob(&self, name: &AssignedName) -> AssetResult<BlobReader> {
        Ok(self.store.open(name).await?)
    }

    /// Whether the primary blob is present.
    pub async fn has_blob(&self, name: &AssignedName) -> AssetResult<bool> {
        Ok(self.store.exists(name).await?)
    }

    /// Open the thumbnail of an image asset, deriving it if needed.
    pub async fn thumbnail(
        &self,
        name: &AssignedName,
        media_type: &MediaType,
    ) -> AssetResult<Thumbnail> {
        self.thumbnails
            .get_or_derive(name, media_type)
            .await
            .map_err(AssetError::from)
    }
}

impl std::fmt::Debug for AssetService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetService")
            .field("config", &self.config)
            .field("thumbnails", &self.thumbnails)
            .finish_non_exhaustive()
    }
}
