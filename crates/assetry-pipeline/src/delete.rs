use assetry_types::AssignedName;
use tracing::{info, warn};

use crate::error::AssetResult;
use crate::service::AssetService;

impl AssetService {
    /// Delete the blob of an asset whose metadata has already been removed.
    ///
    /// A blob that is already gone is not an error. The thumbnail namespace
    /// is not touched; a thumbnail of a deleted image stays on disk.
    pub async fn delete_asset(&self, name: &AssignedName) -> AssetResult<()> {
        if self.store.delete(name).await? {
            info!(name = %name, "asset blob deleted");
        } else {
            warn!(name = %name, "asset blob was already missing");
        }
        Ok(())
    }
}
