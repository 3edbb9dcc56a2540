//! Thumbnail cache for Assetry.
//!
//! Thumbnails are derived lazily from image blobs: the first request for a
//! source renders a fixed-width JPEG into a directory parallel to the blob
//! store, and later requests reuse it for as long as it is not older than
//! its source.
//!
//! - [`ThumbnailCache`] -- freshness check, derivation, atomic persistence
//! - [`LockTable`] -- one async mutex per source name, so a source is
//!   rendered at most once at a time
//! - [`render_jpeg`] -- decode, resize, encode

pub mod cache;
pub mod error;
pub mod locks;
pub mod render;

pub use cache::{Thumbnail, ThumbnailCache, ThumbnailConfig};
pub use error::{ThumbError, ThumbResult};
pub use locks::LockTable;
pub use render::{render_jpeg, target_size};
