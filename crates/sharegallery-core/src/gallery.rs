use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::ThumbnailCache;
use crate::index::ImageIndex;
use crate::remote::{RemotePath, RemoteStore};
use crate::resize::Resizer;
use crate::Result;

/// Read side of the gallery: listing, originals and thumbnails
pub struct Gallery {
    index: Arc<ImageIndex>,
    store: Arc<dyn RemoteStore>,
    thumbnails: ThumbnailCache,
}

impl Gallery {
    /// Index the share from `root`, then open the thumbnail cache in `cache_dir`.
    ///
    /// Indexing completes before this returns, so callers never observe a
    /// half-built index.
    pub async fn open(
        store: Arc<dyn RemoteStore>,
        root: &RemotePath,
        resizer: Arc<dyn Resizer>,
        cache_dir: impl Into<PathBuf>,
        thumbnail_height: u32,
    ) -> Result<Self> {
        let index = Arc::new(ImageIndex::from_walk(store.as_ref(), root).await);
        let thumbnails =
            ThumbnailCache::open(cache_dir, Arc::clone(&index), Arc::clone(&store), resizer, thumbnail_height)
                .await?;
        Ok(Self {
            index,
            store,
            thumbnails,
        })
    }

    pub fn index(&self) -> &ImageIndex {
        &self.index
    }

    pub const fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    pub fn list(&self) -> Vec<&str> {
        self.index.list()
    }

    /// Unmodified bytes of the source image, read from the share every time
    pub async fn get_original(&self, id: &str) -> Result<Vec<u8>> {
        let remote_path = self.index.lookup(id)?;
        Ok(self.store.read_file(remote_path).await?)
    }

    pub async fn get_thumbnail(&self, id: &str) -> Result<Vec<u8>> {
        self.thumbnails.get_thumbnail(id).await
    }
}

/// MIME type for an identifier, from its extension
pub fn content_type_for(id: &str) -> &'static str {
    let ext = std::path::Path::new(id)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{MemoryStore, RemoteError};
    use crate::resize::ImageResizer;
    use crate::Error;
    use tempfile::TempDir;

    async fn open(store: Arc<MemoryStore>, tmp: &TempDir) -> Gallery {
        Gallery::open(
            store,
            &RemotePath::root(),
            Arc::new(ImageResizer),
            tmp.path().join("thumbs"),
            400,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_original_returns_exact_bytes() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(
            MemoryStore::new()
                .with_file("/photos/x.jpg", vec![1u8, 2, 3])
                .with_file("/photos/sub/y.png", vec![9u8, 8, 7, 6]),
        );
        let gallery = open(store, &tmp).await;

        assert_eq!(gallery.list(), vec!["x.jpg", "y.png"]);
        assert_eq!(gallery.get_original("y.png").await.unwrap(), vec![9, 8, 7, 6]);
    }

    #[tokio::test]
    async fn test_get_original_is_not_cached() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new().with_file("/x.jpg", "x"));
        let gallery = open(Arc::clone(&store), &tmp).await;

        gallery.get_original("x.jpg").await.unwrap();
        gallery.get_original("x.jpg").await.unwrap();

        assert_eq!(store.read_calls(), 2);
    }

    #[tokio::test]
    async fn test_get_original_unknown_id() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new().with_file("/x.jpg", "x"));
        let gallery = open(Arc::clone(&store), &tmp).await;
        let calls_before = store.total_calls();

        let err = gallery.get_original("nope.jpg").await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(store.total_calls(), calls_before);
    }

    #[tokio::test]
    async fn test_get_original_remote_failure() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(
            MemoryStore::new()
                .with_file("/x.jpg", "x")
                .fail_read("/x.jpg", RemoteError::Permission("x.jpg".into())),
        );
        let gallery = open(store, &tmp).await;

        let err = gallery.get_original("x.jpg").await.unwrap_err();

        assert!(matches!(err, Error::Remote(RemoteError::Permission(_))));
    }

    #[tokio::test]
    async fn test_unreachable_root_serves_empty_gallery() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(
            MemoryStore::new()
                .with_file("/x.jpg", "x")
                .fail_listing("/", RemoteError::Unavailable("no route".into())),
        );
        let gallery = open(store, &tmp).await;

        assert!(gallery.list().is_empty());
        assert!(gallery.get_thumbnail("x.jpg").await.unwrap_err().is_not_found());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("b.png"), "image/png");
        assert_eq!(content_type_for("c.gif"), "image/gif");
        assert_eq!(content_type_for("d"), "application/octet-stream");
    }
}
