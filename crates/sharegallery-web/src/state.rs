use std::sync::Arc;

use sharegallery_core::{Gallery, ImageResizer, MountedShare};

use crate::config::ServerConfig;

/// Application state shared across all requests.
///
/// The gallery is read-only once built, so handlers share it without locks.
#[derive(Clone)]
pub struct AppState {
    pub gallery: Arc<Gallery>,
}

impl AppState {
    /// Connect to the share and build the index. Returns only once indexing
    /// is finished, so the server never answers from a partial index.
    pub async fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        tracing::info!(
            share = %config.share.unc(),
            mount = %config.share.mount_point.display(),
            access = ?config.share.access,
            root = %config.share.root,
            "Indexing images on remote share"
        );

        // An unreachable share is treated like an unlistable root: the
        // gallery comes up empty instead of the process exiting
        let store = match MountedShare::connect(&config.share).await {
            Ok(store) => store,
            Err(e) => {
                tracing::error!(share = %config.share.unc(), error = %e, "Failed to connect to share");
                MountedShare::new(&config.share.mount_point)
            }
        };
        let store = Arc::new(store);
        let gallery = Gallery::open(
            store,
            &config.share.root,
            Arc::new(ImageResizer),
            &config.cache_dir,
            config.thumbnail_height,
        )
        .await?;

        tracing::info!(
            images = gallery.index().len(),
            cache = %config.cache_dir.display(),
            "Gallery ready"
        );
        Ok(Self::with_gallery(gallery))
    }

    pub fn with_gallery(gallery: Gallery) -> Self {
        Self {
            gallery: Arc::new(gallery),
        }
    }
}
