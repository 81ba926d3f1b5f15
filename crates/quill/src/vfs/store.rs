//! The path-indexed node tree.
//!
//! [`NodeStore`] owns every file and directory of an editing session. It is
//! the only type that mutates node data; the editor, the snapshot codec and
//! the command adapters all go through its API.
//!
//! Every mutating operation validates first and commits second, so a failed
//! call leaves the store exactly as it was and can simply be retried.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::ops::Bound;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{VfsError, VfsResult};
use super::path::{CanonicalPath, SEPARATOR, normalize};

/// The two kinds of node the store can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A text file.
    File,
    /// A directory.
    Directory,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::File => f.write_str("file"),
            NodeKind::Directory => f.write_str("directory"),
        }
    }
}

/// A file or directory at a canonical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A text file and its content.
    File {
        /// Where the file lives.
        path: CanonicalPath,
        /// Newline-delimited text.
        content: String,
    },
    /// A directory.
    Directory {
        /// Where the directory lives.
        path: CanonicalPath,
    },
}

impl Node {
    /// The node's canonical path.
    pub fn path(&self) -> &CanonicalPath {
        match self {
            Node::File { path, .. } | Node::Directory { path } => path,
        }
    }

    /// Whether this is a file or a directory.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::File { .. } => NodeKind::File,
            Node::Directory { .. } => NodeKind::Directory,
        }
    }

    /// File content, or `None` for directories.
    pub fn content(&self) -> Option<&str> {
        match self {
            Node::File { content, .. } => Some(content),
            Node::Directory { .. } => None,
        }
    }

    /// Returns true for file nodes.
    pub fn is_file(&self) -> bool {
        matches!(self, Node::File { .. })
    }

    /// Returns true for directory nodes.
    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory { .. })
    }

    fn moved_to(self, path: CanonicalPath) -> Self {
        match self {
            Node::File { content, .. } => Node::File { path, content },
            Node::Directory { .. } => Node::Directory { path },
        }
    }
}

/// Directory entry returned by [`NodeStore::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (final path segment).
    pub name: String,
    /// Whether this entry is a directory.
    pub is_dir: bool,
}

/// In-memory tree of files and directories addressed by canonical path.
///
/// The root directory `/` always exists implicitly. It is never stored,
/// never serialized and can be neither deleted nor renamed.
///
/// # Example
///
/// ```rust
/// use quill::vfs::NodeStore;
///
/// let mut store = NodeStore::new();
/// store.create_file_with_parents("/a/b/c.txt", "x")?;
///
/// assert!(store.get("/a")?.is_dir());
/// assert!(store.get("/a/b")?.is_dir());
/// assert_eq!(store.get("/a/b/c.txt")?.content(), Some("x"));
/// # Ok::<(), quill::vfs::VfsError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStore {
    nodes: BTreeMap<CanonicalPath, Node>,
    root: Node,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    /// Create an empty store containing only the implicit root.
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            root: Node::Directory {
                path: CanonicalPath::root(),
            },
        }
    }

    /// Build a store from already-validated nodes.
    pub(crate) fn from_nodes(nodes: BTreeMap<CanonicalPath, Node>) -> Self {
        Self {
            nodes,
            ..Self::new()
        }
    }

    /// Create (or overwrite) a file, materializing any missing parent directories.
    ///
    /// Fails with [`VfsError::TypeConflict`] if a directory already sits at
    /// `path` or if any ancestor is a file; in both cases nothing changes.
    pub fn create_file_with_parents(
        &mut self,
        path: impl AsRef<str>,
        content: impl Into<String>,
    ) -> VfsResult<&Node> {
        let path = normalize(path.as_ref())?;
        if path.is_root() {
            return Err(VfsError::TypeConflict {
                path: path.to_string(),
                expected: NodeKind::File,
                found: NodeKind::Directory,
            });
        }

        let missing = self.missing_ancestors(&path)?;
        if let Some(Node::Directory { .. }) = self.nodes.get(&path) {
            return Err(VfsError::TypeConflict {
                path: path.to_string(),
                expected: NodeKind::File,
                found: NodeKind::Directory,
            });
        }

        self.materialize(missing);
        let node = Node::File {
            path: path.clone(),
            content: content.into(),
        };
        let node = match self.nodes.entry(path) {
            Entry::Occupied(mut entry) => {
                debug!(path = %entry.key(), "overwriting file");
                entry.insert(node);
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                debug!(path = %entry.key(), "creating file");
                entry.insert(node)
            }
        };
        Ok(node)
    }

    /// Create a directory and any missing parents (`mkdir -p`).
    ///
    /// Existing directories are left untouched.
    pub fn create_directory(&mut self, path: impl AsRef<str>) -> VfsResult<&Node> {
        let path = normalize(path.as_ref())?;
        if path.is_root() {
            return Ok(&self.root);
        }

        let missing = self.missing_ancestors(&path)?;
        if let Some(Node::File { .. }) = self.nodes.get(&path) {
            return Err(VfsError::TypeConflict {
                path: path.to_string(),
                expected: NodeKind::Directory,
                found: NodeKind::File,
            });
        }

        self.materialize(missing);
        let node = self.nodes.entry(path).or_insert_with_key(|path| {
            debug!(%path, "creating directory");
            Node::Directory { path: path.clone() }
        });
        Ok(node)
    }

    /// Delete a node. Directories are removed together with everything below them.
    ///
    /// Returns the number of nodes removed.
    pub fn delete_file(&mut self, path: impl AsRef<str>) -> VfsResult<usize> {
        let path = normalize(path.as_ref())?;
        if path.is_root() {
            return Err(VfsError::invalid_path(
                path.as_str(),
                "the root directory cannot be deleted",
            ));
        }

        let node = self
            .nodes
            .remove(&path)
            .ok_or_else(|| VfsError::NotFound(path.to_string()))?;

        let mut removed = 1;
        if node.is_dir() {
            for descendant in self.descendants(&path) {
                self.nodes.remove(&descendant);
                removed += 1;
            }
        }

        debug!(%path, removed, "deleted");
        Ok(removed)
    }

    /// Move a file, or a directory with its whole subtree, to a new path.
    ///
    /// Missing parents of the target are created. Returns the number of nodes moved.
    pub fn rename(
        &mut self,
        old_path: impl AsRef<str>,
        new_path: impl AsRef<str>,
    ) -> VfsResult<usize> {
        let from = normalize(old_path.as_ref())?;
        let to = normalize(new_path.as_ref())?;
        if from.is_root() {
            return Err(VfsError::invalid_path(
                from.as_str(),
                "the root directory cannot be renamed",
            ));
        }

        let is_dir = self
            .nodes
            .get(&from)
            .ok_or_else(|| VfsError::NotFound(from.to_string()))?
            .is_dir();
        if to.is_root() || self.nodes.contains_key(&to) {
            return Err(VfsError::Collision(to.to_string()));
        }
        if is_dir && to.is_within(&from) {
            return Err(VfsError::invalid_path(
                to.as_str(),
                format!("cannot move {from} into its own subtree"),
            ));
        }
        let missing = self.missing_ancestors(&to)?;

        let mut moving = vec![from.clone()];
        if is_dir {
            moving.extend(self.descendants(&from));
        }

        self.materialize(missing);
        let mut moved = Vec::with_capacity(moving.len());
        for old in moving {
            let Some(new) = old.rebase(&from, &to) else {
                continue;
            };
            if let Some(node) = self.nodes.remove(&old) {
                moved.push(node.moved_to(new));
            }
        }
        let count = moved.len();
        for node in moved {
            self.nodes.insert(node.path().clone(), node);
        }

        debug!(%from, %to, count, "renamed");
        Ok(count)
    }

    /// Look up a node.
    pub fn get(&self, path: impl AsRef<str>) -> VfsResult<&Node> {
        let path = normalize(path.as_ref())?;
        if path.is_root() {
            return Ok(&self.root);
        }
        self.nodes
            .get(&path)
            .ok_or_else(|| VfsError::NotFound(path.to_string()))
    }

    /// Look up a file, failing with [`VfsError::NotFound`] for directories.
    pub fn get_file(&self, path: impl AsRef<str>) -> VfsResult<(&CanonicalPath, &str)> {
        match self.get(path.as_ref())? {
            Node::File { path, content } => Ok((path, content)),
            Node::Directory { path } => Err(VfsError::NotFound(format!(
                "{path} is a directory, not a file"
            ))),
        }
    }

    /// Replace the content of an existing file.
    pub(crate) fn write_file(&mut self, path: &CanonicalPath, new_content: String) -> VfsResult<()> {
        match self.nodes.get_mut(path) {
            Some(Node::File { content, .. }) => {
                *content = new_content;
                debug!(%path, bytes = content.len(), "file content updated");
                Ok(())
            }
            Some(Node::Directory { .. }) => Err(VfsError::NotFound(format!(
                "{path} is a directory, not a file"
            ))),
            None => Err(VfsError::NotFound(path.to_string())),
        }
    }

    /// Returns true if a node exists at `path`.
    pub fn exists(&self, path: impl AsRef<str>) -> bool {
        self.get(path).is_ok()
    }

    /// Immediate children of a directory, sorted by name.
    pub fn list(&self, path: impl AsRef<str>) -> VfsResult<Vec<DirEntry>> {
        let dir = self.get(path)?;
        if dir.is_file() {
            return Err(VfsError::TypeConflict {
                path: dir.path().to_string(),
                expected: NodeKind::Directory,
                found: NodeKind::File,
            });
        }
        let depth = dir.path().depth() + 1;
        let mut entries: Vec<DirEntry> = self
            .descendants(dir.path())
            .into_iter()
            .filter(|child| child.depth() == depth)
            .filter_map(|child| {
                let is_dir = self.nodes.get(&child)?.is_dir();
                Some(DirEntry {
                    name: child.name()?.to_string(),
                    is_dir,
                })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Render the tree as an indented listing, directories suffixed with `/`.
    pub fn tree(&self) -> String {
        let mut out = String::from("/\n");
        self.render_tree(&CanonicalPath::root(), 1, &mut out);
        out
    }

    fn render_tree(&self, dir: &CanonicalPath, depth: usize, out: &mut String) {
        let Ok(entries) = self.list(dir.as_str()) else {
            return;
        };
        for entry in entries {
            out.push_str(&"  ".repeat(depth));
            out.push_str(&entry.name);
            if entry.is_dir {
                out.push(SEPARATOR);
                out.push('\n');
                if let Ok(child) = dir.join(&entry.name) {
                    self.render_tree(&child, depth + 1, out);
                }
            } else {
                out.push('\n');
            }
        }
    }

    /// Number of stored nodes (the implicit root is not counted).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing but the root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All stored nodes in path order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Ancestors of `path` that do not exist yet.
    ///
    /// Fails if any existing ancestor is a file.
    fn missing_ancestors(&self, path: &CanonicalPath) -> VfsResult<Vec<CanonicalPath>> {
        let mut missing = Vec::new();
        for ancestor in path.ancestors() {
            match self.nodes.get(&ancestor) {
                Some(Node::File { .. }) => {
                    return Err(VfsError::TypeConflict {
                        path: ancestor.to_string(),
                        expected: NodeKind::Directory,
                        found: NodeKind::File,
                    });
                }
                Some(Node::Directory { .. }) => {}
                None => missing.push(ancestor),
            }
        }
        Ok(missing)
    }

    fn materialize(&mut self, dirs: Vec<CanonicalPath>) {
        for path in dirs {
            debug!(%path, "creating parent directory");
            self.nodes
                .insert(path.clone(), Node::Directory { path });
        }
    }

    /// Every stored path strictly inside `dir`, in path order.
    fn descendants(&self, dir: &CanonicalPath) -> Vec<CanonicalPath> {
        if dir.is_root() {
            return self.nodes.keys().cloned().collect();
        }
        let prefix = format!("{dir}{SEPARATOR}");
        self.nodes
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .take_while(|(path, _)| path.as_str().starts_with(&prefix))
            .map(|(path, _)| path.clone())
            .collect()
    }
}
