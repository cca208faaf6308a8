use std::collections::HashMap;

use crate::indexer;
use crate::remote::{RemotePath, RemoteStore};
use crate::{Error, Result};

/// A discovered image and the public identifier it is served under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub id: String,
    pub remote_path: RemotePath,
}

/// An image whose base name is shared with another image, and the
/// path-derived identifier it was given instead
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub base_name: String,
    pub assigned_id: String,
    pub remote_path: RemotePath,
}

/// Hex digits of the path digest used in a collision identifier
const SHORT_DIGEST_LEN: usize = 8;

/// Table from public identifier to remote location.
///
/// Built once and never mutated, so it can be shared behind an `Arc` and
/// read without locking.
///
/// Identifiers are base file names. When several images share a base name,
/// none of them keeps it: each is served as `<stem>-<digest>.<ext>`, where
/// the digest is taken from its remote path. An identifier therefore names
/// the same file across rebuilds for as long as both exist, and adding a
/// duplicate can only retire the bare name, never move it to another file.
#[derive(Debug, Default)]
pub struct ImageIndex {
    entries: Vec<ImageEntry>,
    by_id: HashMap<String, usize>,
    collisions: Vec<Collision>,
}

impl ImageIndex {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assign identifiers to `paths`, keeping their order
    pub fn build(paths: Vec<RemotePath>) -> Self {
        let mut name_counts: HashMap<String, usize> = HashMap::new();
        for name in paths.iter().filter_map(RemotePath::file_name) {
            *name_counts.entry(name.to_string()).or_default() += 1;
        }

        let mut index = Self::default();
        for remote_path in paths {
            let Some(base_name) = remote_path.file_name().map(str::to_string) else {
                continue;
            };

            let id = if name_counts.get(&base_name).copied().unwrap_or(0) > 1 {
                let assigned = index.path_derived_id(&base_name, &remote_path, &name_counts);
                tracing::warn!(
                    base_name = %base_name,
                    assigned_id = %assigned,
                    path = %remote_path,
                    "Duplicate image name, serving under a path-derived identifier"
                );
                index.collisions.push(Collision {
                    base_name,
                    assigned_id: assigned.clone(),
                    remote_path: remote_path.clone(),
                });
                assigned
            } else {
                base_name
            };

            if index.by_id.contains_key(&id) {
                tracing::error!(id = %id, path = %remote_path, "Identifier already taken, image not indexed");
                continue;
            }
            index.by_id.insert(id.clone(), index.entries.len());
            index.entries.push(ImageEntry { id, remote_path });
        }
        index
    }

    /// Walk the share from `root` and index what was found.
    ///
    /// A failure to list `root` leaves the index empty; it stays empty
    /// until the process restarts.
    pub async fn from_walk(store: &dyn RemoteStore, root: &RemotePath) -> Self {
        match indexer::walk(store, root).await {
            Ok(paths) => {
                let index = Self::build(paths);
                tracing::info!(
                    images = index.len(),
                    collisions = index.collisions.len(),
                    "Indexed remote share"
                );
                index
            }
            Err(e) => {
                tracing::error!(root = %root, error = %e, "Failed to index remote share, serving an empty gallery");
                Self::empty()
            }
        }
    }

    /// `<stem>-<digest>.<ext>` for a colliding image. The short digest is
    /// lengthened only if it would shadow a real base name or an identifier
    /// already handed out.
    fn path_derived_id(&self, base_name: &str, path: &RemotePath, name_counts: &HashMap<String, usize>) -> String {
        let (stem, ext) = match base_name.rfind('.') {
            Some(dot) if dot > 0 => (&base_name[..dot], &base_name[dot..]),
            _ => (base_name, ""),
        };
        let digest = path_digest(path);

        [SHORT_DIGEST_LEN, 2 * SHORT_DIGEST_LEN, digest.len()]
            .into_iter()
            .map(|len| format!("{stem}-{}{ext}", &digest[..len]))
            .find(|candidate| !name_counts.contains_key(candidate) && !self.by_id.contains_key(candidate))
            .unwrap_or_else(|| format!("{stem}-{digest}{ext}"))
    }

    pub fn lookup(&self, id: &str) -> Result<&RemotePath> {
        self.by_id
            .get(id)
            .map(|&i| &self.entries[i].remote_path)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Identifiers in index order. Remote paths are never exposed here.
    pub fn list(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }

    pub fn entries(&self) -> &[ImageEntry] {
        &self.entries
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn path_digest(path: &RemotePath) -> String {
    format!("{:x}", md5::compute(path.as_str()))
}
