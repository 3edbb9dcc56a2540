//! Local filesystem blob store.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/blobs/<assigned-name>     committed blobs
//! <root>/.staging/<assigned-name>  in-flight uploads
//! ```
//!
//! An upload is written to `.staging/`, synced, then renamed into `blobs/`.
//! Readers therefore never observe a partially written blob, and an aborted
//! upload only ever leaves a staging file, which is removed on the spot (or
//! swept on the next open if the process died mid-write).

use std::io;
use std::path::{Path, PathBuf};

use assetry_types::AssignedName;
use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tracing::{debug, info, warn};

use crate::bounded::{check_hint, copy_bounded};
use crate::error::{StoreError, StoreResult};
use crate::traits::{BlobReader, BlobStat, BlobStore, StoredBlob, UploadSource};

/// Directory holding committed blobs.
pub const BLOBS_DIR: &str = "blobs";

/// Directory holding in-flight uploads.
pub const STAGING_DIR: &str = ".staging";

/// Attempts at finding an unused name before giving up.
const MAX_NAME_ATTEMPTS: usize = 8;

/// Blob store backed by a directory on the local filesystem.
///
/// All file operations go through `tokio::fs`, which runs them on the
/// blocking thread pool.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
    blobs: PathBuf,
    staging: PathBuf,
    max_blob_size: u64,
}

impl FsBlobStore {
    /// Open (or create) a store rooted at `root`.
    ///
    /// Leftover staging files from an interrupted process are removed.
    pub async fn open(root: impl Into<PathBuf>, max_blob_size: u64) -> StoreResult<Self> {
        let root = root.into();
        let blobs = root.join(BLOBS_DIR);
        let staging = root.join(STAGING_DIR);
        fs::create_dir_all(&blobs).await?;
        fs::create_dir_all(&staging).await?;

        let store = Self {
            root,
            blobs,
            staging,
            max_blob_size,
        };
        let swept = store.sweep_staging().await?;
        if swept > 0 {
            warn!(count = swept, root = %store.root.display(), "removed interrupted uploads");
        }
        debug!(root = %store.root.display(), max_blob_size, "blob store opened");
        Ok(store)
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the committed blob with the given name.
    ///
    /// The file may or may not exist.
    pub fn blob_path(&self, name: &AssignedName) -> PathBuf {
        self.blobs.join(name.as_str())
    }

    async fn sweep_staging(&self) -> StoreResult<usize> {
        let mut entries = fs::read_dir(&self.staging).await?;
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                discard(&entry.path()).await;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Reserve a fresh name by exclusively creating its staging file.
    async fn reserve(&self) -> StoreResult<(AssignedName, PathBuf, fs::File)> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = AssignedName::generate();
            if fs::try_exists(self.blob_path(&name)).await? {
                continue;
            }
            let staged = self.staging.join(name.as_str());
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&staged)
                .await
            {
                Ok(file) => return Ok((name, staged, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::NameExhausted {
            attempts: MAX_NAME_ATTEMPTS,
        })
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn max_blob_size(&self) -> u64 {
        self.max_blob_size
    }

    async fn put(
        &self,
        content: &mut UploadSource<'_>,
        size_hint: Option<u64>,
    ) -> StoreResult<StoredBlob> {
        check_hint(size_hint, self.max_blob_size)?;

        let (name, staged, mut file) = self.reserve().await?;
        let written = async {
            let size = copy_bounded(content, &mut file, self.max_blob_size).await?;
            file.sync_all().await?;
            Ok::<_, StoreError>(size)
        }
        .await;
        drop(file);

        let size = match written {
            Ok(size) => size,
            Err(e) => {
                discard(&staged).await;
                debug!(name = %name.short(), error = %e, "upload aborted");
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&staged, self.blob_path(&name)).await {
            discard(&staged).await;
            return Err(e.into());
        }

        info!(name = %name, size, "blob stored");
        Ok(StoredBlob { name, size })
    }

    async fn open(&self, name: &AssignedName) -> StoreResult<BlobReader> {
        match fs::File::open(self.blob_path(name)).await {
            Ok(file) => Ok(Box::new(file)),
            Err(e) => Err(not_found_or(e, name)),
        }
    }

    async fn stat(&self, name: &AssignedName) -> StoreResult<BlobStat> {
        let meta = fs::metadata(self.blob_path(name))
            .await
            .map_err(|e| not_found_or(e, name))?;
        Ok(BlobStat {
            size: meta.len(),
            modified: meta.modified()?,
        })
    }

    async fn delete(&self, name: &AssignedName) -> StoreResult<bool> {
        match fs::remove_file(self.blob_path(name)).await {
            Ok(()) => {
                info!(name = %name, "blob deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(name = %name, "blob already absent");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn not_found_or(e: io::Error, name: &AssignedName) -> StoreError {
    if e.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound(name.clone())
    } else {
        StoreError::Io(e)
    }
}

/// Best-effort removal of a staging file.
async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove staging file");
        }
    }
}
