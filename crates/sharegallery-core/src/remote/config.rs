use std::fmt;
use std::path::PathBuf;

use super::RemotePath;

const DEFAULT_DOMAIN: &str = "WORKGROUP";

/// How the process reaches the share
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareAccess {
    /// The share is already mounted at the mount point by the host
    Mounted,
    /// The process mounts the share itself with the configured credentials
    Cifs,
}

impl ShareAccess {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mount" | "mounted" => Some(Self::Mounted),
            "cifs" | "smb" => Some(Self::Cifs),
            _ => None,
        }
    }
}

/// Connection settings for the image share
#[derive(Clone)]
pub struct ShareConfig {
    /// Address of the file server
    pub server: String,
    /// Share name on that server
    pub share: String,
    pub domain: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Directory to index, share root by default
    pub root: RemotePath,
    /// Local mount point of the share
    pub mount_point: PathBuf,
    pub access: ShareAccess,
}

impl ShareConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let server = get("SMB_SERVER_IP").unwrap_or_else(|| "localhost".to_string());
        let share = get("SMB_SHARE_NAME").unwrap_or_else(|| "images".to_string());
        let mount_point = get("SHAREGALLERY_MOUNT").map_or_else(
            || PathBuf::from("/mnt").join(&server).join(&share),
            PathBuf::from,
        );
        let username = get("SMB_USERNAME");

        // Credentials mean the process is expected to connect on its own
        let default_access = if username.is_some() {
            ShareAccess::Cifs
        } else {
            ShareAccess::Mounted
        };
        let access = get("SHAREGALLERY_ACCESS").map_or(default_access, |v| {
            ShareAccess::parse(&v).unwrap_or_else(|| {
                tracing::warn!(value = %v, "Invalid SHAREGALLERY_ACCESS, expected mount or cifs");
                default_access
            })
        });

        Self {
            domain: get("SMB_DOMAIN").unwrap_or_else(|| DEFAULT_DOMAIN.to_string()),
            username,
            password: get("SMB_PASSWORD"),
            root: get("SMB_DIRECTORY_PATH")
                .map_or_else(RemotePath::root, |p| RemotePath::parse(&p)),
            server,
            share,
            mount_point,
            access,
        }
    }

    /// UNC name of the share, e.g. `\\10.0.0.5\photos`
    pub fn unc(&self) -> String {
        format!(r"\\{}\{}", self.server, self.share)
    }
}

impl fmt::Debug for ShareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareConfig")
            .field("server", &self.server)
            .field("share", &self.share)
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("root", &self.root)
            .field("mount_point", &self.mount_point)
            .field("access", &self.access)
            .finish()
    }
}
