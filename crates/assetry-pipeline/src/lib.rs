//! Asset pipelines for Assetry.
//!
//! [`AssetService`] ties the blob store and the thumbnail cache together and
//! exposes the operations a caller with a metadata store needs:
//!
//! - [`AssetService::ingest`] -- validate an upload and store its blob
//! - [`AssetService::replace`] -- store a new blob, retire the old one only
//!   after the caller confirms its metadata now points at the new one
//! - [`AssetService::delete_asset`] -- idempotent blob removal
//! - [`AssetService::open_blob`] / [`AssetService::thumbnail`] -- retrieval
//!
//! The service never reads or writes metadata itself. A blob stored by
//! `ingest` whose metadata write then fails is an orphan: nothing here
//! reconciles it.

pub mod config;
pub mod delete;
pub mod error;
pub mod ingest;
pub mod replace;
pub mod service;
pub mod upload;

pub use config::{AssetConfig, DEFAULT_MAX_FILE_SIZE, DEFAULT_THUMBNAIL_WIDTH, FILE_FIELD_NAME};
pub use error::{AssetError, AssetResult};
pub use replace::PendingReplacement;
pub use service::AssetService;
pub use upload::{IngestedAsset, IngestionMode, UploadRequest};
