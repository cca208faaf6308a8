pub mod cifs;
mod config;
mod memory;
mod mounted;
mod path;

use async_trait::async_trait;
use thiserror::Error;

pub use config::{ShareAccess, ShareConfig};
pub use memory::MemoryStore;
pub use mounted::MountedShare;
pub use path::RemotePath;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("Remote share unavailable: {0}")]
    Unavailable(String),
    #[error("Permission denied on remote share: {0}")]
    Permission(String),
    #[error("Not found on remote share: {0}")]
    NotFound(String),
}

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: RemotePath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub is_directory: bool,
}

/// Read-only access to the file share holding the images.
///
/// Implementations must be shareable across request handlers; every call
/// may suspend on network I/O.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List a directory. Entries come back in the order the share returns them.
    async fn list_directory(&self, path: &RemotePath) -> Result<Vec<DirEntry>, RemoteError>;

    async fn stat(&self, path: &RemotePath) -> Result<FileStat, RemoteError>;

    /// Read a file's full contents
    async fn read_file(&self, path: &RemotePath) -> Result<Vec<u8>, RemoteError>;
}
