//! Blob storage for Assetry.
//!
//! This crate owns the primary bytes of every uploaded asset. Blobs are
//! stored under names the store generates itself ([`AssignedName`]); the
//! uploader's original filename never reaches the filesystem.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`FsBlobStore`] -- one file per blob under `<root>/blobs/`
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Names are generated, never supplied by the caller.
//! 2. Writes are bounded: an upload is aborted as soon as it crosses the
//!    configured ceiling, and nothing is left behind.
//! 3. A blob becomes visible only once fully written (stage, sync, rename).
//! 4. Blobs are never modified in place.
//! 5. `delete` is idempotent: an absent blob is not an error.
//! 6. All other I/O errors are propagated.
//!
//! [`AssignedName`]: assetry_types::AssignedName

pub mod bounded;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use traits::{BlobReader, BlobStat, BlobStore, StoredBlob, UploadSource};
