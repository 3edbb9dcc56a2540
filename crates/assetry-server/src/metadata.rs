//! File records: the metadata that points at stored blobs.

use std::collections::BTreeMap;
use std::sync::RwLock;

use assetry_pipeline::IngestedAsset;
use assetry_types::{AssignedName, MediaType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ServerResult;

/// One uploaded file as the API exposes it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: Uuid,
    /// Assigned name of the primary blob.
    pub name: AssignedName,
    pub original_name: String,
    #[serde(rename = "mimetype")]
    pub mime_type: MediaType,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FileRecord {
    /// A fresh record for a just-ingested blob. Ids are time-ordered.
    pub fn from_asset(
        asset: IngestedAsset,
        category: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: asset.name,
            original_name: asset.original_name,
            mime_type: asset.media_type,
            size: asset.size,
            category,
            description,
        }
    }
}

/// Partial update. Fields left as `None` keep their current value.
#[derive(Clone, Debug, Default)]
pub struct FilePatch {
    pub category: Option<String>,
    pub description: Option<String>,
    pub asset: Option<IngestedAsset>,
}

impl FilePatch {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.description.is_none() && self.asset.is_none()
    }

    pub fn apply(self, record: &mut FileRecord) {
        if let Some(category) = self.category {
            record.category = Some(category);
        }
        if let Some(description) = self.description {
            record.description = Some(description);
        }
        if let Some(asset) = self.asset {
            record.name = asset.name;
            record.original_name = asset.original_name;
            record.mime_type = asset.media_type;
            record.size = asset.size;
        }
    }
}

/// Persistence for [`FileRecord`]s.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn list(&self) -> ServerResult<Vec<FileRecord>>;

    async fn get(&self, id: Uuid) -> ServerResult<Option<FileRecord>>;

    async fn insert(&self, record: FileRecord) -> ServerResult<FileRecord>;

    /// Apply `patch` to the record. Returns `(before, after)`, or `None`
    /// if there is no such record.
    async fn update(
        &self,
        id: Uuid,
        patch: FilePatch,
    ) -> ServerResult<Option<(FileRecord, FileRecord)>>;

    /// Remove and return the record.
    async fn remove(&self, id: Uuid) -> ServerResult<Option<FileRecord>>;
}

/// Process-local metadata store. Records are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: RwLock<BTreeMap<Uuid, FileRecord>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn list(&self) -> ServerResult<Vec<FileRecord>> {
        let records = self.records.read().expect("lock poisoned");
        Ok(records.values().cloned().collect())
    }

    async fn get(&self, id: Uuid) -> ServerResult<Option<FileRecord>> {
        let records = self.records.read().expect("lock poisoned");
        Ok(records.get(&id).cloned())
    }

    async fn insert(&self, record: FileRecord) -> ServerResult<FileRecord> {
        let mut records = self.records.write().expect("lock poisoned");
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: FilePatch,
    ) -> ServerResult<Option<(FileRecord, FileRecord)>> {
        let mut records = self.records.write().expect("lock poisoned");
        let Some(record) = records.get_mut(&id) else {
            return Ok(None);
        };
        let before = record.clone();
        patch.apply(record);
        Ok(Some((before, record.clone())))
    }

    async fn remove(&self, id: Uuid) -> ServerResult<Option<FileRecord>> {
        let mut records = self.records.write().expect("lock poisoned");
        Ok(records.remove(&id))
    }
}
