use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use assetry_types::AssignedName;
use async_trait::async_trait;

use crate::bounded::{check_hint, copy_bounded};
use crate::error::{StoreError, StoreResult};
use crate::traits::{BlobReader, BlobStat, BlobStore, StoredBlob, UploadSource};

#[derive(Clone)]
struct MemoryBlob {
    data: Arc<Vec<u8>>,
    modified: SystemTime,
}

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Content is buffered in full before it
/// becomes visible, so concurrent readers see either nothing or the whole
/// blob, same as the filesystem store.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<AssignedName, MemoryBlob>>,
    max_blob_size: u64,
}

impl InMemoryBlobStore {
    /// Create a new empty store with the given size ceiling.
    pub fn new(max_blob_size: u64) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            max_blob_size,
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Sorted list of all stored names.
    pub fn names(&self) -> Vec<AssignedName> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut names: Vec<AssignedName> = map.keys().cloned().collect();
        names.sort();
        names
    }

    /// Replace the content of an existing blob, bumping its modification
    /// time.
    ///
    /// Stands in for an out-of-band overwrite of the underlying file; the
    /// store's own API never rewrites a blob.
    pub fn overwrite(&self, name: &AssignedName, data: Vec<u8>) -> StoreResult<()> {
        let mut map = self.blobs.write().expect("lock poisoned");
        let blob = map
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.clone()))?;
        *blob = MemoryBlob {
            data: Arc::new(data),
            modified: SystemTime::now(),
        };
        Ok(())
    }

    fn get(&self, name: &AssignedName) -> StoreResult<MemoryBlob> {
        self.blobs
            .read()
            .expect("lock poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.clone()))
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new(u64::MAX)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    fn max_blob_size(&self) -> u64 {
        self.max_blob_size
    }

    async fn put(
        &self,
        content: &mut UploadSource<'_>,
        size_hint: Option<u64>,
    ) -> StoreResult<StoredBlob> {
        check_hint(size_hint, self.max_blob_size)?;
        let mut data = Vec::new();
        let size = copy_bounded(content, &mut data, self.max_blob_size).await?;

        let mut map = self.blobs.write().expect("lock poisoned");
        let name = loop {
            let candidate = AssignedName::generate();
            if !map.contains_key(&candidate) {
                break candidate;
            }
        };
        map.insert(
            name.clone(),
            MemoryBlob {
                data: Arc::new(data),
                modified: SystemTime::now(),
            },
        );
        Ok(StoredBlob { name, size })
    }

    async fn open(&self, name: &AssignedName) -> StoreResult<BlobReader> {
        let blob = self.get(name)?;
        Ok(Box::new(Cursor::new(blob.data.as_ref().clone())))
    }

    async fn stat(&self, name: &AssignedName) -> StoreResult<BlobStat> {
        let blob = self.get(name)?;
        Ok(BlobStat {
            size: blob.data.len() as u64,
            modified: blob.modified,
        })
    }

    async fn delete(&self, name: &AssignedName) -> StoreResult<bool> {
        let mut map = self.blobs.write().expect("lock poisoned");
        Ok(map.remove(name).is_some())
    }

    async fn read_all(&self, name: &AssignedName) -> StoreResult<Vec<u8>> {
        Ok(self.get(name)?.data.as_ref().clone())
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .field("max_blob_size", &self.max_blob_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn put(store: &InMemoryBlobStore, data: &[u8]) -> StoreResult<StoredBlob> {
        let mut src = data;
        store.put(&mut src, None).await
    }

    #[tokio::test]
    async fn put_and_read_back() {
        let store = InMemoryBlobStore::default();
        let stored = put(&store, b"hello").await.unwrap();
        assert_eq!(stored.size, 5);
        assert_eq!(store.read_all(&stored.name).await.unwrap(), b"hello");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn respects_limit() {
        let store = InMemoryBlobStore::new(4);
        let err = put(&store, b"hello").await.unwrap_err();
        assert!(matches!(err, StoreError::SizeExceeded { limit: 4 }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_twice() {
        let store = InMemoryBlobStore::default();
        let stored = put(&store, b"x").await.unwrap();
        assert!(store.delete(&stored.name).await.unwrap());
        assert!(!store.delete(&stored.name).await.unwrap());
        assert!(matches!(
            store.open(&stored.name).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn overwrite_bumps_modified() {
        let store = InMemoryBlobStore::default();
        let stored = put(&store, b"one").await.unwrap();
        let before = store.stat(&stored.name).await.unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.overwrite(&stored.name, b"three".to_vec()).unwrap();
        let after = store.stat(&stored.name).await.unwrap();
        assert!(after.modified > before.modified);
        assert_eq!(after.size, 5);
    }

    #[tokio::test]
    async fn overwrite_missing_fails() {
        let store = InMemoryBlobStore::default();
        let name = AssignedName::generate();
        assert!(matches!(
            store.overwrite(&name, vec![]),
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn names_sorted() {
        let store = InMemoryBlobStore::default();
        for _ in 0..5 {
            put(&store, b"a").await.unwrap();
        }
        let names = store.names();
        assert_eq!(names.len(), 5);
        assert!(names.windows(2).all(|w| w[0] < w[1]));
    }
}
