use assetry_store::UploadSource;
use assetry_types::{AssignedName, MediaType};
use serde::{Deserialize, Serialize};

/// Whether an operation carries file content at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestionMode {
    /// Store the uploaded content.
    #[default]
    WithBlob,
    /// Skip blob handling; only metadata changes.
    MetadataOnly,
}

impl IngestionMode {
    /// Mode selected by a `skipFileUpload`-style flag.
    pub fn from_skip_flag(skip: bool) -> Self {
        if skip {
            Self::MetadataOnly
        } else {
            Self::WithBlob
        }
    }
}

/// One incoming file, alive for the duration of a single ingestion.
pub struct UploadRequest<'a> {
    /// Form field the content arrived under.
    pub field: String,
    /// Filename as declared by the uploader. Recorded, never used as a path.
    pub original_name: String,
    pub media_type: MediaType,
    /// Size the uploader declared, if any.
    pub declared_size: Option<u64>,
    pub content: Box<UploadSource<'a>>,
}

impl<'a> UploadRequest<'a> {
    pub fn new(
        field: impl Into<String>,
        original_name: impl Into<String>,
        media_type: MediaType,
        content: Box<UploadSource<'a>>,
    ) -> Self {
        Self {
            field: field.into(),
            original_name: original_name.into(),
            media_type,
            declared_size: None,
            content,
        }
    }

    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }
}

impl std::fmt::Debug for UploadRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("field", &self.field)
            .field("original_name", &self.original_name)
            .field("media_type", &self.media_type)
            .field("declared_size", &self.declared_size)
            .finish_non_exhaustive()
    }
}

/// What the caller should persist after a successful ingestion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestedAsset {
    pub name: AssignedName,
    pub original_name: String,
    pub media_type: MediaType,
    /// Bytes actually stored.
    pub size: u64,
}
