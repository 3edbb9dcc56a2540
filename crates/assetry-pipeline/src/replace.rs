use std::sync::Arc;

use assetry_store::BlobStore;
use assetry_types::AssignedName;
use tracing::{info, warn};

use crate::error::AssetResult;
use crate::service::AssetService;
use crate::upload::{IngestedAsset, IngestionMode, UploadRequest};

impl AssetService {
    /// Begin replacing the blob behind `existing`.
    ///
    /// With an upload, the new content is ingested right away; the previous
    /// blob is left untouched until [`PendingReplacement::confirm`] is called,
    /// which the caller must only do once its metadata durably points at the
    /// new name. Without an upload (or in [`IngestionMode::MetadataOnly`])
    /// the replacement carries no blob and confirming it does nothing.
    pub async fn replace(
        &self,
        existing: &AssignedName,
        mode: IngestionMode,
        upload: Option<UploadRequest<'_>>,
    ) -> AssetResult<PendingReplacement> {
        let incoming = match (mode, upload) {
            (IngestionMode::WithBlob, Some(upload)) => self.ingest(mode, Some(upload)).await?,
            _ => None,
        };
        Ok(PendingReplacement {
            store: Arc::clone(&self.store),
            previous: existing.clone(),
            incoming,
            settled: false,
        })
    }
}

/// A replacement whose new blob (if any) is stored but whose old blob is
/// still in place.
///
/// Settle it with [`confirm`](Self::confirm) after the metadata swap, or
/// [`abandon`](Self::abandon) if the swap failed. Dropping it unsettled keeps
/// both blobs.
#[must_use = "the previous blob is only retired by calling `confirm`"]
pub struct PendingReplacement {
    store: Arc<dyn BlobStore>,
    previous: AssignedName,
    incoming: Option<IngestedAsset>,
    settled: bool,
}

impl PendingReplacement {
    /// Name of the blob being replaced.
    pub fn previous(&self) -> &AssignedName {
        &self.previous
    }

    /// The newly stored blob, if this replacement carries one.
    pub fn new_asset(&self) -> Option<&IngestedAsset> {
        self.incoming.as_ref()
    }

    /// The metadata now references the new blob: delete the previous one.
    ///
    /// Does nothing if there is no new blob or its name equals the previous
    /// one. A previous blob that is already gone is not an error.
    pub async fn confirm(mut self) -> AssetResult<Option<IngestedAsset>> {
        self.settled = true;
        let incoming = self.incoming.take();
        if let Some(asset) = &incoming {
            if asset.name != self.previous {
                let existed = self.store.delete(&self.previous).await?;
                info!(
                    previous = %self.previous,
                    current = %asset.name,
                    existed,
                    "replaced blob retired"
                );
            }
        }
        Ok(incoming)
    }

    /// Like [`confirm`](Self::confirm), but retires `previous` instead of
    /// the name seen when the replacement began.
    ///
    /// Concurrent replacements of one record each start from the same old
    /// name; only the metadata store knows which blob a swap actually
    /// displaced.
    pub async fn confirm_against(
        mut self,
        previous: &AssignedName,
    ) -> AssetResult<Option<IngestedAsset>> {
        self.previous = previous.clone();
        self.confirm().await
    }

    /// The metadata swap failed: delete the new blob, keep the previous one.
    pub async fn abandon(mut self) -> AssetResult<()> {
        self.settled = true;
        if let Some(asset) = self.incoming.take() {
            self.store.delete(&asset.name).await?;
            info!(previous = %self.previous, discarded = %asset.name, "replacement abandoned");
        }
        Ok(())
    }
}

impl Drop for PendingReplacement {
    fn drop(&mut self) {
        if !self.settled {
            if let Some(asset) = &self.incoming {
                warn!(
                    previous = %self.previous,
                    orphan = %asset.name,
                    "replacement dropped unsettled; new blob left unreferenced"
                );
            }
        }
    }
}

impl std::fmt::Debug for PendingReplacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingReplacement")
            .field("previous", &self.previous)
            .field("incoming", &self.incoming)
            .field("settled", &self.settled)
            .finish()
    }
}
