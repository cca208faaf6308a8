use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{DirEntry, FileStat, RemoteError, RemotePath, RemoteStore};

#[derive(Debug)]
enum Node {
    Dir(Vec<String>),
    File(Vec<u8>),
}

/// In-memory share for tests and local demos.
///
/// Listings are returned in insertion order. Failures can be injected per
/// path, and every call is counted so callers can assert on remote I/O.
#[derive(Debug)]
pub struct MemoryStore {
    nodes: HashMap<RemotePath, Node>,
    list_failures: HashMap<RemotePath, RemoteError>,
    stat_failures: HashMap<RemotePath, RemoteError>,
    read_failures: HashMap<RemotePath, RemoteError>,
    read_delay: Option<Duration>,
    lists: AtomicUsize,
    stats: AtomicUsize,
    reads: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(RemotePath::root(), Node::Dir(Vec::new()));
        Self {
            nodes,
            list_failures: HashMap::new(),
            stat_failures: HashMap::new(),
            read_failures: HashMap::new(),
            read_delay: None,
            lists: AtomicUsize::new(0),
            stats: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
        }
    }

    /// Add a directory, creating missing parents
    #[must_use]
    pub fn with_dir(mut self, path: &str) -> Self {
        self.ensure_dir(&RemotePath::parse(path));
        self
    }

    /// Add a file, creating missing parents
    #[must_use]
    pub fn with_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        let path = RemotePath::parse(path);
        let Some(name) = path.file_name().map(str::to_string) else {
            return self;
        };
        let parent = parent_of(&path);
        self.ensure_dir(&parent);
        self.attach(&parent, name);
        self.nodes.insert(path, Node::File(contents.into()));
        self
    }

    #[must_use]
    pub fn fail_listing(mut self, path: &str, error: RemoteError) -> Self {
        self.list_failures.insert(RemotePath::parse(path), error);
        self
    }

    #[must_use]
    pub fn fail_stat(mut self, path: &str, error: RemoteError) -> Self {
        self.stat_failures.insert(RemotePath::parse(path), error);
        self
    }

    #[must_use]
    pub fn fail_read(mut self, path: &str, error: RemoteError) -> Self {
        self.read_failures.insert(RemotePath::parse(path), error);
        self
    }

    /// Make every file read take at least `delay`
    #[must_use]
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn list_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn stat_calls(&self) -> usize {
        self.stats.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Total remote operations of any kind
    pub fn total_calls(&self) -> usize {
        self.list_calls() + self.stat_calls() + self.read_calls()
    }

    fn ensure_dir(&mut self, path: &RemotePath) {
        if self.nodes.contains_key(path) {
            return;
        }
        let parent = parent_of(path);
        self.ensure_dir(&parent);
        if let Some(name) = path.file_name() {
            self.attach(&parent, name.to_string());
        }
        self.nodes.insert(path.clone(), Node::Dir(Vec::new()));
    }

    fn attach(&mut self, parent: &RemotePath, name: String) {
        if let Some(Node::Dir(children)) = self.nodes.get_mut(parent) {
            if !children.contains(&name) {
                children.push(name);
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn parent_of(path: &RemotePath) -> RemotePath {
    let parts: Vec<&str> = path.components().collect();
    match parts.split_last() {
        Some((_, init)) => init
            .iter()
            .fold(RemotePath::root(), |acc, part| acc.join(part)),
        None => RemotePath::root(),
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_directory(&self, path: &RemotePath) -> Result<Vec<DirEntry>, RemoteError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.list_failures.get(path) {
            return Err(err.clone());
        }
        match self.nodes.get(path) {
            Some(Node::Dir(children)) => Ok(children
                .iter()
                .map(|name| DirEntry {
                    name: name.clone(),
                    path: path.join(name),
                })
                .collect()),
            Some(Node::File(_)) => Err(RemoteError::Unavailable(format!("{path}: not a directory"))),
            None => Err(RemoteError::NotFound(path.to_string())),
        }
    }

    async fn stat(&self, path: &RemotePath) -> Result<FileStat, RemoteError> {
        self.stats.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.stat_failures.get(path) {
            return Err(err.clone());
        }
        match self.nodes.get(path) {
            Some(node) => Ok(FileStat {
                is_directory: matches!(node, Node::Dir(_)),
            }),
            None => Err(RemoteError::NotFound(path.to_string())),
        }
    }

    async fn read_file(&self, path: &RemotePath) -> Result<Vec<u8>, RemoteError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.read_failures.get(path) {
            return Err(err.clone());
        }
        match self.nodes.get(path) {
            Some(Node::File(contents)) => Ok(contents.clone()),
            Some(Node::Dir(_)) => Err(RemoteError::Unavailable(format!("{path}: is a directory"))),
            None => Err(RemoteError::NotFound(path.to_string())),
        }
    }
}
