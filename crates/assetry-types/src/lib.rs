//! Foundation types for Assetry.
//!
//! This crate provides the identity and media types shared by every other
//! Assetry crate. It has no I/O of its own.
//!
//! # Key Types
//!
//! - [`AssignedName`] — store-generated, collision-free blob identifier
//! - [`MediaType`] — declared MIME type of an uploaded asset

pub mod error;
pub mod media;
pub mod name;

pub use error::TypeError;
pub use media::{MediaType, OCTET_STREAM, THUMBNAIL_MEDIA_TYPE};
pub use name::AssignedName;
