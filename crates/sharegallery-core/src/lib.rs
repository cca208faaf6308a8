pub mod cache;
pub mod error;
pub mod gallery;
pub mod index;
pub mod indexer;
pub mod remote;
pub mod resize;

pub use cache::ThumbnailCache;
pub use error::{Error, Result};
pub use gallery::{content_type_for, Gallery};
pub use index::{Collision, ImageEntry, ImageIndex};
pub use remote::{
    DirEntry, FileStat, MemoryStore, MountedShare, RemoteError, RemotePath, RemoteStore,
    ShareAccess, ShareConfig,
};
pub use resize::{ImageResizer, ResizeError, Resizer, DEFAULT_THUMBNAIL_HEIGHT};
