use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use assetry_store::BlobStore;
use assetry_types::{AssignedName, MediaType};
use tokio::fs;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

use crate::error::{ThumbError, ThumbResult};
use crate::locks::LockTable;
use crate::render::render_jpeg;

/// Rendering parameters. Fixed per deployment, not per request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThumbnailConfig {
    /// Output width in pixels (default: 720).
    pub width: u32,
    /// JPEG quality, 1-100 (default: 80).
    pub quality: u8,
    /// Upper bound on a single derivation. `None` waits indefinitely.
    pub derivation_timeout: Option<Duration>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 720,
            quality: 80,
            derivation_timeout: None,
        }
    }
}

/// An open thumbnail file.
#[derive(Debug)]
pub struct Thumbnail {
    pub file: fs::File,
    pub size: u64,
    /// `true` if this call rendered the thumbnail, `false` on a cache hit.
    pub derived: bool,
}

/// Lazily derived JPEG previews of image blobs.
///
/// A thumbnail lives at `<root>/<source-name>` and is fresh iff its
/// modification time is not older than the source blob's. Stale or missing
/// thumbnails are re-rendered on request; nothing is tracked or purged
/// proactively, and a thumbnail whose source was deleted simply stays on
/// disk.
///
/// Timestamps are compared rather than content, so a source overwritten with
/// its old mtime preserved (or a skewed clock) is not noticed.
pub struct ThumbnailCache {
    store: Arc<dyn BlobStore>,
    root: PathBuf,
    config: ThumbnailConfig,
    locks: LockTable,
    derivations: Arc<AtomicU64>,
}

impl ThumbnailCache {
    /// Create a cache writing into `root`, reading sources from `store`.
    pub async fn open(
        store: Arc<dyn BlobStore>,
        root: impl Into<PathBuf>,
        config: ThumbnailConfig,
    ) -> ThumbResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            ThumbError::Derivation(format!("create {}: {e}", root.display()))
        })?;
        Ok(Self {
            store,
            root,
            config,
            locks: LockTable::new(),
            derivations: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    /// Path of the thumbnail for `source`. The file may or may not exist.
    pub fn thumbnail_path(&self, source: &AssignedName) -> PathBuf {
        self.root.join(source.as_str())
    }

    /// Number of thumbnails written since the cache was opened.
    pub fn derivation_count(&self) -> u64 {
        self.derivations.load(Ordering::SeqCst)
    }

    /// Return the thumbnail of `source`, rendering it first if it is missing
    /// or stale.
    ///
    /// `media_type` is the declared type of the source; anything outside
    /// `image/*` is rejected before the source is touched. Concurrent calls
    /// for the same source wait for each other, so a source is rendered at
    /// most once at a time and followers get the leader's output.
    ///
    /// A render that outlives its caller (timeout or cancellation) keeps the
    /// source locked until it finishes and then discards its output.
    pub async fn get_or_derive(
        &self,
        source: &AssignedName,
        media_type: &MediaType,
    ) -> ThumbResult<Thumbnail> {
        if !media_type.is_image() {
            return Err(ThumbError::UnsupportedMediaType(media_type.clone()));
        }
        let guard = self.locks.acquire(source.as_str()).await;
        self.refresh(source, guard).await
    }

    /// Freshness check and (re)derivation, holding the source's lock.
    async fn refresh(
        &self,
        source: &AssignedName,
        guard: OwnedMutexGuard<()>,
    ) -> ThumbResult<Thumbnail> {
        let source_modified = self.store.stat(source).await?.modified;
        let path = self.thumbnail_path(source);

        match modified_time(&path).await? {
            Some(thumb_modified) if thumb_modified >= source_modified => {
                debug!(source = %source, "thumbnail cache hit");
                return open_thumbnail(&path, false).await;
            }
            Some(_) => debug!(source = %source, "thumbnail stale"),
            None => debug!(source = %source, "thumbnail missing"),
        }

        match self.config.derivation_timeout {
            Some(limit) => tokio::time::timeout(limit, self.derive(source, source_modified, guard))
                .await
                .map_err(|_| {
                    ThumbError::Derivation(format!("timed out after {}ms", limit.as_millis()))
                })??,
            None => self.derive(source, source_modified, guard).await?,
        }
        open_thumbnail(&path, true).await
    }

    /// Render and write the thumbnail. The lock guard travels into the
    /// blocking task and is released only when that task returns.
    async fn derive(
        &self,
        source: &AssignedName,
        source_modified: SystemTime,
        guard: OwnedMutexGuard<()>,
    ) -> ThumbResult<()> {
        let data = self.store.read_all(source).await?;
        let source_len = data.len();
        let width = self.config.width;
        let quality = self.config.quality;
        let dir = self.root.clone();
        let target = self.thumbnail_path(source);
        let derivations = Arc::clone(&self.derivations);
        let abandon = AbandonOnDrop::new();
        let abandoned = abandon.flag();

        let written = tokio::task::spawn_blocking(move || -> ThumbResult<usize> {
            let _guard = guard;
            let jpeg = render_jpeg(&data, width, quality)?;
            if abandoned.load(Ordering::SeqCst) {
                return Err(ThumbError::Derivation(
                    "render abandoned by its caller".to_string(),
                ));
            }
            persist(&dir, &target, &jpeg, source_modified).map_err(|e| {
                ThumbError::Derivation(format!("write {}: {e}", target.display()))
            })?;
            derivations.fetch_add(1, Ordering::SeqCst);
            Ok(jpeg.len())
        })
        .await
        .map_err(|e| ThumbError::Derivation(format!("render task failed: {e}")))??;
        abandon.disarm();

        info!(source = %source, source_len, thumbnail_len = written, width, "thumbnail derived");
        Ok(())
    }
}

impl std::fmt::Debug for ThumbnailCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThumbnailCache")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("derivations", &self.derivation_count())
            .finish()
    }
}

/// Raises a shared flag when dropped while armed, telling a detached render
/// not to write its output.
struct AbandonOnDrop {
    flag: Arc<AtomicBool>,
    armed: bool,
}

impl AbandonOnDrop {
    fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            armed: true,
        }
    }

    fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.flag.store(true, Ordering::SeqCst);
        }
    }
}

async fn modified_time(path: &Path) -> ThumbResult<Option<SystemTime>> {
    match fs::metadata(path).await {
        Ok(meta) => meta
            .modified()
            .map(Some)
            .map_err(|e| ThumbError::Derivation(format!("stat {}: {e}", path.display()))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ThumbError::Derivation(format!(
            "stat {}: {e}",
            path.display()
        ))),
    }
}

async fn open_thumbnail(path: &Path, derived: bool) -> ThumbResult<Thumbnail> {
    let file = fs::File::open(path)
        .await
        .map_err(|e| ThumbError::Derivation(format!("open {}: {e}", path.display())))?;
    let size = file
        .metadata()
        .await
        .map_err(|e| ThumbError::Derivation(format!("stat {}: {e}", path.display())))?
        .len();
    Ok(Thumbnail {
        file,
        size,
        derived,
    })
}

/// Write `jpeg` to `target` atomically.
///
/// The thumbnail is stamped with the source's modification time rather than
/// the wall clock: a source rewritten while it was being rendered then reads
/// as newer than its thumbnail and is rendered again on the next request.
fn persist(dir: &Path, target: &Path, jpeg: &[u8], source_modified: SystemTime) -> io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(jpeg)?;
    tmp.as_file().sync_all()?;
    tmp.as_file().set_modified(source_modified)?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
