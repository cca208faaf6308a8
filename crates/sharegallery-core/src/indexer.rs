//! Discovery of image files on the remote share.
//!
//! The walk is depth-first and keeps the order in which the share lists
//! entries. An entry whose extension names a supported raster format is
//! trusted to be a file and never stat'd; anything else is stat'd and
//! descended into when it is a directory.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::remote::{DirEntry, RemoteError, RemotePath, RemoteStore};

/// Extensions (lower-case) treated as images
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

pub fn is_image_path(path: &RemotePath) -> bool {
    path.extension()
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Walk `root` and return every image path beneath it.
///
/// Only a failure to list `root` itself is returned as an error. Subtrees
/// that cannot be listed contribute no images, and entries that cannot be
/// stat'd are dropped.
pub async fn walk(store: &dyn RemoteStore, root: &RemotePath) -> Result<Vec<RemotePath>, RemoteError> {
    let entries = store.list_directory(root).await?;
    Ok(classify_all(store, entries).await)
}

fn walk_subtree<'a>(store: &'a dyn RemoteStore, dir: RemotePath) -> BoxFuture<'a, Vec<RemotePath>> {
    async move {
        match store.list_directory(&dir).await {
            Ok(entries) => classify_all(store, entries).await,
            Err(e) => {
                tracing::warn!(path = %dir, error = %e, "Skipping unreadable directory");
                Vec::new()
            }
        }
    }
    .boxed()
}

async fn classify_all(store: &dyn RemoteStore, entries: Vec<DirEntry>) -> Vec<RemotePath> {
    let mut images = Vec::new();
    for entry in entries {
        classify(store, entry.path, &mut images).await;
    }
    images
}

async fn classify(store: &dyn RemoteStore, path: RemotePath, images: &mut Vec<RemotePath>) {
    if is_image_path(&path) {
        images.push(path);
        return;
    }

    match store.stat(&path).await {
        Ok(stat) if stat.is_directory => {
            let found = walk_subtree(store, path).await;
            images.extend(found);
        }
        Ok(_) => {}
        Err(e) => {
            tracing::debug!(path = %path, error = %e, "Ignoring entry that could not be stat'd");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryStore;

    fn paths(found: &[RemotePath]) -> Vec<&str> {
        found.iter().map(RemotePath::as_str).collect()
    }

    #[tokio::test]
    async fn test_finds_images_in_subdirectory() {
        let store = MemoryStore::new()
            .with_file("/photos/a.jpg", "a")
            .with_file("/photos/notes.txt", "n");

        let found = walk(&store, &RemotePath::root()).await.unwrap();

        assert_eq!(paths(&found), vec![r"\photos\a.jpg"]);
    }

    #[tokio::test]
    async fn test_extension_match_is_case_insensitive_and_skips_stat() {
        let store = MemoryStore::new()
            .with_file("/A.JPG", "a")
            .with_file("/b.Jpeg", "b")
            .with_file("/c.PNG", "c")
            .with_file("/d.gif", "d");

        let found = walk(&store, &RemotePath::root()).await.unwrap();

        assert_eq!(found.len(), 4);
        assert_eq!(store.stat_calls(), 0);
    }

    #[tokio::test]
    async fn test_preserves_listing_order_depth_first() {
        let store = MemoryStore::new()
            .with_file("/z.jpg", "z")
            .with_file("/sub/m.png", "m")
            .with_file("/a.gif", "a")
            .with_file("/sub/deeper/b.jpg", "b");

        let found = walk(&store, &RemotePath::root()).await.unwrap();

        assert_eq!(
            paths(&found),
            vec![r"\z.jpg", r"\sub\m.png", r"\sub\deeper\b.jpg", r"\a.gif"]
        );
    }

    #[tokio::test]
    async fn test_does_not_deduplicate() {
        let store = MemoryStore::new()
            .with_file("/one/same.jpg", "1")
            .with_file("/two/same.jpg", "2");

        let found = walk(&store, &RemotePath::root()).await.unwrap();

        assert_eq!(paths(&found), vec![r"\one\same.jpg", r"\two\same.jpg"]);
    }

    #[tokio::test]
    async fn test_root_listing_failure_is_fatal() {
        let store = MemoryStore::new()
            .with_file("/a.jpg", "a")
            .fail_listing("/", RemoteError::Unavailable("offline".into()));

        let result = walk(&store, &RemotePath::root()).await;

        assert_eq!(result, Err(RemoteError::Unavailable("offline".into())));
    }

    #[tokio::test]
    async fn test_subtree_listing_failure_is_skipped() {
        let store = MemoryStore::new()
            .with_file("/locked/secret.jpg", "s")
            .with_file("/open/ok.jpg", "o")
            .fail_listing("/locked", RemoteError::Permission("locked".into()));

        let found = walk(&store, &RemotePath::root()).await.unwrap();

        assert_eq!(paths(&found), vec![r"\open\ok.jpg"]);
    }

    #[tokio::test]
    async fn test_stat_failure_drops_entry() {
        let store = MemoryStore::new()
            .with_file("/broken/inner.jpg", "i")
            .with_file("/fine.png", "f")
            .fail_stat("/broken", RemoteError::Unavailable("stat".into()));

        let found = walk(&store, &RemotePath::root()).await.unwrap();

        assert_eq!(paths(&found), vec![r"\fine.png"]);
    }

    #[tokio::test]
    async fn test_subtree_entries_are_classified_like_root_entries() {
        let store = MemoryStore::new()
            .with_file("/top.jpg", "t")
            .with_file("/top.txt", "t")
            .with_file("/sub/inner.jpg", "i")
            .with_file("/sub/inner.txt", "i")
            .with_file("/sub/broken/lost.jpg", "l")
            .fail_stat("/sub/broken", RemoteError::Unavailable("stat".into()));

        let found = walk(&store, &RemotePath::root()).await.unwrap();

        assert_eq!(paths(&found), vec![r"\top.jpg", r"\sub\inner.jpg"]);
        // top.txt, sub, sub\inner.txt and sub\broken; never the images
        assert_eq!(store.stat_calls(), 4);
    }

    #[tokio::test]
    async fn test_walk_from_nested_root() {
        let store = MemoryStore::new()
            .with_file("/photos/x.jpg", "x")
            .with_file("/other/y.jpg", "y");

        let found = walk(&store, &RemotePath::parse("/photos")).await.unwrap();

        assert_eq!(paths(&found), vec![r"\photos\x.jpg"]);
    }

    #[tokio::test]
    async fn test_empty_root() {
        let store = MemoryStore::new();

        let found = walk(&store, &RemotePath::root()).await.unwrap();

        assert!(found.is_empty());
    }
}
