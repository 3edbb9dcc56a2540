use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Media type of every rendered thumbnail.
pub const THUMBNAIL_MEDIA_TYPE: &str = "image/jpeg";

/// Fallback when an upload does not declare a type.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Declared MIME type of an asset, as reported by the uploader.
///
/// The value is recorded as metadata only. It is never validated against the
/// content and never used to build a storage path.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaType(String);

impl MediaType {
    /// Wrap a declared MIME type. Surrounding whitespace is trimmed.
    pub fn new(value: impl AsRef<str>) -> Result<Self, TypeError> {
        let value = value.as_ref().trim();
        if value.is_empty() || value.chars().any(char::is_control) {
            return Err(TypeError::InvalidMediaType(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    /// `application/octet-stream`.
    pub fn octet_stream() -> Self {
        Self(OCTET_STREAM.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the primary category is `image`.
    ///
    /// Only the `image/` prefix is checked (case-insensitively); the subtype
    /// is not validated, so `image/x-anything` passes and decoding decides.
    pub fn is_image(&self) -> bool {
        self.0
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
    }
}

impl fmt::Debug for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MediaType({})", self.0)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_prefix_is_case_insensitive() {
        assert!(MediaType::new("image/png").unwrap().is_image());
        assert!(MediaType::new("IMAGE/JPEG").unwrap().is_image());
        assert!(MediaType::new("Image/x-unknown").unwrap().is_image());
    }

    #[test]
    fn non_images_are_rejected_by_predicate() {
        assert!(!MediaType::new("application/pdf").unwrap().is_image());
        assert!(!MediaType::new("text/image").unwrap().is_image());
        assert!(!MediaType::new("image").unwrap().is_image());
        assert!(!MediaType::octet_stream().is_image());
    }

    #[test]
    fn empty_type_is_invalid() {
        assert_eq!(
            MediaType::new("   ").unwrap_err(),
            TypeError::InvalidMediaType(String::new())
        );
        assert!(MediaType::new("image/png\n").is_ok());
        assert!(MediaType::new("image/\u{0}png").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let mt = MediaType::new("image/png").unwrap();
        assert_eq!(serde_json::to_string(&mt).unwrap(), "\"image/png\"");
    }
}
