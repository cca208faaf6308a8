//! Generate-on-miss thumbnail cache on local disk.
//!
//! One file per identifier, named by the identifier, never evicted. Files
//! are written under `.partial/` and renamed into place so readers only
//! ever see complete thumbnails. At most one generation runs per
//! identifier; concurrent requests for the same identifier wait for it and
//! then read the persisted file.

use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::index::ImageIndex;
use crate::remote::RemoteStore;
use crate::resize::Resizer;
use crate::Result;

/// Subdirectory for thumbnails still being written. Identifiers always
/// carry an image extension, so none can name it.
const PARTIAL_DIR: &str = ".partial";

type GenerationLock = Arc<tokio::sync::Mutex<()>>;

pub struct ThumbnailCache {
    dir: PathBuf,
    index: Arc<ImageIndex>,
    store: Arc<dyn RemoteStore>,
    resizer: Arc<dyn Resizer>,
    target_height: u32,
    in_flight: Mutex<HashMap<String, GenerationLock>>,
}

impl ThumbnailCache {
    pub fn new(
        dir: impl Into<PathBuf>,
        index: Arc<ImageIndex>,
        store: Arc<dyn RemoteStore>,
        resizer: Arc<dyn Resizer>,
        target_height: u32,
    ) -> Self {
        Self {
            dir: dir.into(),
            index,
            store,
            resizer,
            target_height,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Create the cache directory if needed and clear temp files left behind
    /// by an interrupted run.
    pub async fn open(
        dir: impl Into<PathBuf>,
        index: Arc<ImageIndex>,
        store: Arc<dyn RemoteStore>,
        resizer: Arc<dyn Resizer>,
        target_height: u32,
    ) -> Result<Self> {
        let cache = Self::new(dir, index, store, resizer, target_height);
        tokio::fs::create_dir_all(cache.partial_dir()).await?;
        cache.remove_stale_partials().await?;
        Ok(cache)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub const fn target_height(&self) -> u32 {
        self.target_height
    }

    pub fn cached_path(&self, id: &str) -> PathBuf {
        self.dir.join(id)
    }

    fn partial_dir(&self) -> PathBuf {
        self.dir.join(PARTIAL_DIR)
    }

    pub async fn is_cached(&self, id: &str) -> bool {
        tokio::fs::try_exists(self.cached_path(id))
            .await
            .unwrap_or(false)
    }

    /// Return the thumbnail for `id`, generating and persisting it on a miss
    pub async fn get_thumbnail(&self, id: &str) -> Result<Vec<u8>> {
        let remote_path = self.index.lookup(id)?;

        if let Some(bytes) = self.read_cached(id).await? {
            tracing::debug!(id, "Thumbnail cache hit");
            return Ok(bytes);
        }

        let lock = self.acquire(id);
        let _generating = lock.lock.lock().await;

        // Another request may have finished generating while we waited
        if let Some(bytes) = self.read_cached(id).await? {
            tracing::debug!(id, "Thumbnail generated by concurrent request");
            return Ok(bytes);
        }

        tracing::debug!(id, path = %remote_path, "Thumbnail cache miss, generating");
        let source = self.store.read_file(remote_path).await?;
        let thumbnail = self.resizer.resize(source, self.target_height).await?;
        self.persist(id, thumbnail).await
    }

    async fn read_cached(&self, id: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.cached_path(id)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write `bytes` under `id` and hand them back.
    ///
    /// The write runs as one blocking task, so a caller that is dropped
    /// mid-write leaves either the finished file or nothing at all.
    async fn persist(&self, id: &str, bytes: Vec<u8>) -> Result<Vec<u8>> {
        let temp = self.partial_dir().join(Uuid::new_v4().to_string());
        let target = self.cached_path(id);

        let bytes = tokio::task::spawn_blocking(move || {
            write_atomically(temp, &target, &bytes)?;
            Ok::<_, std::io::Error>(bytes)
        })
        .await
        .map_err(std::io::Error::other)??;
        Ok(bytes)
    }

    async fn remove_stale_partials(&self) -> Result<()> {
        let mut read_dir = tokio::fs::read_dir(self.partial_dir()).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            tracing::debug!(path = %entry.path().display(), "Removing stale partial thumbnail");
            tokio::fs::remove_file(entry.path()).await?;
        }
        Ok(())
    }

    fn acquire(&self, id: &str) -> InFlight<'_> {
        let mut table = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = Arc::clone(table.entry(id.to_string()).or_default());
        InFlight {
            table: &self.in_flight,
            id: id.to_string(),
            lock,
        }
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Registration in the per-identifier lock table. The table entry is
/// removed once the last registered request is done with it.
struct InFlight<'a> {
    table: &'a Mutex<HashMap<String, GenerationLock>>,
    id: String,
    lock: GenerationLock,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the table plus ours means nobody else is waiting
        if Arc::strong_count(&self.lock) == 2 {
            table.remove(&self.id);
        }
    }
}

fn write_atomically(temp: PathBuf, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut pending = PendingFile::new(temp);

    let mut file = std::fs::File::create(&pending.path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&pending.path, target)?;
    pending.committed = true;
    Ok(())
}

/// Temp file that is deleted unless it was renamed into place
struct PendingFile {
    path: PathBuf,
    committed: bool,
}

impl PendingFile {
    const fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
