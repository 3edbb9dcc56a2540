//! HTTP server for Assetry.
//!
//! Serves file records under `/v1/files`: multipart upload, blob and
//! thumbnail retrieval, partial update with optional blob replacement, and
//! deletion. Blob work is delegated to [`assetry_pipeline::AssetService`];
//! records live behind the [`MetadataStore`] trait.

pub mod config;
pub mod error;
pub mod form;
pub mod handler;
pub mod metadata;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use metadata::{FilePatch, FileRecord, InMemoryMetadataStore, MetadataStore};
pub use server::AssetServer;
