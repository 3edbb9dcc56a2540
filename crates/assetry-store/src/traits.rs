use std::time::SystemTime;

use assetry_types::AssignedName;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{StoreError, StoreResult};

/// Content handed to [`BlobStore::put`].
pub type UploadSource<'a> = dyn AsyncRead + Send + Unpin + 'a;

/// Byte stream returned by [`BlobStore::open`].
pub type BlobReader = Box<dyn AsyncRead + Send + Unpin>;

/// Result of a successful write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    pub name: AssignedName,
    /// Number of bytes actually written.
    pub size: u64,
}

/// Size and modification time of a stored blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlobStat {
    pub size: u64,
    pub modified: SystemTime,
}

/// Storage for primary asset blobs.
///
/// All implementations must satisfy these invariants:
/// - `put` picks the name. It is unique within the store and independent of
///   anything the caller knows about the content.
/// - `put` enforces [`max_blob_size`](Self::max_blob_size) while streaming;
///   an oversized write fails with [`StoreError::SizeExceeded`] and leaves no
///   blob behind.
/// - `open` and `stat` have no side effects.
/// - `delete` of an absent blob succeeds.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Size ceiling enforced by `put`, in bytes.
    fn max_blob_size(&self) -> u64;

    /// Stream `content` into a new blob and return its assigned name.
    ///
    /// `size_hint` is the size the caller declared, if any. A hint above the
    /// ceiling is rejected before any byte is read; the actual byte count is
    /// always checked regardless of the hint.
    async fn put(
        &self,
        content: &mut UploadSource<'_>,
        size_hint: Option<u64>,
    ) -> StoreResult<StoredBlob>;

    /// Open a blob for reading.
    ///
    /// Returns [`StoreError::NotFound`] if the blob does not exist.
    async fn open(&self, name: &AssignedName) -> StoreResult<BlobReader>;

    /// Size and modification time of a blob.
    async fn stat(&self, name: &AssignedName) -> StoreResult<BlobStat>;

    /// Delete a blob. Returns `true` if the blob existed.
    ///
    /// Deleting an absent blob is not an error.
    async fn delete(&self, name: &AssignedName) -> StoreResult<bool>;

    /// Check whether a blob exists.
    async fn exists(&self, name: &AssignedName) -> StoreResult<bool> {
        match self.stat(name).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Read a whole blob into memory.
    async fn read_all(&self, name: &AssignedName) -> StoreResult<Vec<u8>> {
        let mut reader = self.open(name).await?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        Ok(data)
    }
}
