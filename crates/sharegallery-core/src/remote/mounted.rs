use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{cifs, DirEntry, FileStat, RemoteError, RemotePath, RemoteStore, ShareAccess, ShareConfig};

/// Share accessed through a local CIFS mount. Authentication is handled by
/// the mount itself, whether the host set it up or [`MountedShare::connect`]
/// did.
#[derive(Debug, Clone)]
pub struct MountedShare {
    mount_point: PathBuf,
}

impl MountedShare {
    pub fn new(mount_point: impl Into<PathBuf>) -> Self {
        Self {
            mount_point: mount_point.into(),
        }
    }

    /// Store for `config`, mounting the share first when the process is
    /// responsible for it
    pub async fn connect(config: &ShareConfig) -> Result<Self, RemoteError> {
        if config.access == ShareAccess::Cifs {
            cifs::mount(config).await?;
        }
        Ok(Self::new(&config.mount_point))
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    fn local_path(&self, path: &RemotePath) -> PathBuf {
        path.components()
            .fold(self.mount_point.clone(), |acc, part| acc.join(part))
    }
}

fn map_io(path: &RemotePath, err: &std::io::Error) -> RemoteError {
    let detail = format!("{path}: {err}");
    match err.kind() {
        ErrorKind::NotFound => RemoteError::NotFound(detail),
        ErrorKind::PermissionDenied => RemoteError::Permission(detail),
        _ => RemoteError::Unavailable(detail),
    }
}

#[async_trait]
impl RemoteStore for MountedShare {
    async fn list_directory(&self, path: &RemotePath) -> Result<Vec<DirEntry>, RemoteError> {
        let mut read_dir = tokio::fs::read_dir(self.local_path(path))
            .await
            .map_err(|e| map_io(path, &e))?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(|e| map_io(path, &e))? {
            let name = entry.file_name().to_string_lossy().to_string();
            entries.push(DirEntry {
                path: path.join(&name),
                name,
            });
        }
        Ok(entries)
    }

    async fn stat(&self, path: &RemotePath) -> Result<FileStat, RemoteError> {
        let metadata = tokio::fs::metadata(self.local_path(path))
            .await
            .map_err(|e| map_io(path, &e))?;
        Ok(FileStat {
            is_directory: metadata.is_dir(),
        })
    }

    async fn read_file(&self, path: &RemotePath) -> Result<Vec<u8>, RemoteError> {
        tokio::fs::read(self.local_path(path))
            .await
            .map_err(|e| map_io(path, &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn share() -> (TempDir, MountedShare) {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("photos/sub")).unwrap();
        fs::write(tmp.path().join("photos/x.jpg"), b"x-bytes").unwrap();
        fs::write(tmp.path().join("photos/sub/y.png"), b"y-bytes").unwrap();
        let store = MountedShare::new(tmp.path());
        (tmp, store)
    }

    #[tokio::test]
    async fn test_list_directory() {
        let (_tmp, store) = share();

        let mut entries = store
            .list_directory(&RemotePath::parse("/photos"))
            .await
            .unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "sub");
        assert_eq!(entries[0].path.as_str(), r"\photos\sub");
        assert_eq!(entries[1].name, "x.jpg");
    }

    #[tokio::test]
    async fn test_stat_and_read() {
        let (_tmp, store) = share();

        let stat = store.stat(&RemotePath::parse("/photos/sub")).await.unwrap();
        assert!(stat.is_directory);

        let bytes = store
            .read_file(&RemotePath::parse("/photos/sub/y.png"))
            .await
            .unwrap();
        assert_eq!(bytes, b"y-bytes");
    }

    #[tokio::test]
    async fn test_connect_with_host_mount_runs_nothing() {
        let (tmp, _) = share();
        let config = ShareConfig::from_lookup(|key| match key {
            "SHAREGALLERY_MOUNT" => Some(tmp.path().to_string_lossy().to_string()),
            "SHAREGALLERY_ACCESS" => Some("mount".to_string()),
            _ => None,
        });

        let store = MountedShare::connect(&config).await.unwrap();

        assert_eq!(store.mount_point(), tmp.path());
        assert_eq!(
            store.read_file(&RemotePath::parse("/photos/x.jpg")).await.unwrap(),
            b"x-bytes"
        );
    }

    #[tokio::test]
    async fn test_missing_maps_to_not_found() {
        let (_tmp, store) = share();

        let result = store.read_file(&RemotePath::parse("/photos/nope.jpg")).await;
        assert!(matches!(result, Err(RemoteError::NotFound(_))));

        let result = store.list_directory(&RemotePath::parse("/missing")).await;
        assert!(matches!(result, Err(RemoteError::NotFound(_))));
    }
}
