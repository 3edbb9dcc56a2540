use std::path::PathBuf;
use std::time::Duration;

use assetry_thumb::ThumbnailConfig;

/// Multipart field that carries the file content.
pub const FILE_FIELD_NAME: &str = "file";

/// Default upload ceiling: 16 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Default thumbnail width in pixels.
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 720;

/// Default JPEG quality for thumbnails.
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 80;

/// Directory (under `files_root`) holding thumbnails.
pub const THUMBNAILS_DIR: &str = "thumbnails";

/// Settings of the asset core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetConfig {
    /// Root of the deployment's file namespace.
    pub files_root: PathBuf,
    /// Upload ceiling in bytes.
    pub max_file_size: u64,
    pub thumbnail_width: u32,
    pub thumbnail_quality: u8,
    pub derivation_timeout: Option<Duration>,
}

impl AssetConfig {
    pub fn new(files_root: impl Into<PathBuf>) -> Self {
        Self {
            files_root: files_root.into(),
            ..Self::default()
        }
    }

    pub fn thumbnails_root(&self) -> PathBuf {
        self.files_root.join(THUMBNAILS_DIR)
    }

    pub fn thumbnail_config(&self) -> ThumbnailConfig {
        ThumbnailConfig {
            width: self.thumbnail_width,
            quality: self.thumbnail_quality,
            derivation_timeout: self.derivation_timeout,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            files_root: PathBuf::from("files"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
            thumbnail_quality: DEFAULT_THUMBNAIL_QUALITY,
            derivation_timeout: None,
        }
    }
}
