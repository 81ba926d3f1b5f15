//! Flat, serializable projection of a [`NodeStore`].
//!
//! The wire format is a JSON object keyed by canonical path:
//!
//! ```json
//! {
//!   "/components": { "kind": "directory" },
//!   "/components/Card.jsx": { "kind": "file", "content": "export default ..." }
//! }
//! ```
//!
//! Directories are listed explicitly so empty ones survive a round trip.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::error::{VfsError, VfsResult};
use super::path::{CanonicalPath, normalize};
use super::store::{Node, NodeKind, NodeStore};

/// Descriptor of a single node inside a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// File or directory.
    pub kind: NodeKind,
    /// File content; required for files, absent for directories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NodeSnapshot {
    /// Descriptor for a file with the given content.
    pub fn file(content: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::File,
            content: Some(content.into()),
        }
    }

    /// Descriptor for a directory.
    pub fn directory() -> Self {
        Self {
            kind: NodeKind::Directory,
            content: None,
        }
    }
}

/// Path-keyed mapping of every node in a store.
///
/// Keys are kept as raw strings so that a snapshot received from outside
/// can be inspected before it is validated by [`Snapshot::into_store`].
/// Decoding fails if the same key appears twice in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, NodeSnapshot>);

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnapshotVisitor;

        impl<'de> Visitor<'de> for SnapshotVisitor {
            type Value = Snapshot;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of paths to node descriptors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Snapshot, A::Error> {
                let mut entries = BTreeMap::new();
                while let Some((path, node)) = map.next_entry::<String, NodeSnapshot>()? {
                    match entries.entry(path) {
                        Entry::Vacant(slot) => {
                            slot.insert(node);
                        }
                        Entry::Occupied(slot) => {
                            return Err(de::Error::custom(format!(
                                "duplicate snapshot entry {:?}",
                                slot.key()
                            )));
                        }
                    }
                }
                Ok(Snapshot(entries))
            }
        }

        deserializer.deserialize_map(SnapshotVisitor)
    }
}

impl Snapshot {
    /// An empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten every node of `store`.
    pub fn from_store(store: &NodeStore) -> Self {
        let entries = store
            .iter()
            .map(|node| {
                let descriptor = match node {
                    Node::File { content, .. } => NodeSnapshot::file(content.clone()),
                    Node::Directory { .. } => NodeSnapshot::directory(),
                };
                (node.path().to_string(), descriptor)
            })
            .collect();
        Self(entries)
    }

    /// Rebuild a store from this snapshot.
    ///
    /// The result replaces whatever the caller had before; nothing is merged.
    /// Fails with [`VfsError::InvalidSnapshot`] if a path does not normalize,
    /// two entries normalize to the same path, a file lacks content, a
    /// directory carries content, or a file sits where a directory is needed.
    /// Parent directories missing from the mapping are materialized.
    pub fn into_store(self) -> VfsResult<NodeStore> {
        let mut nodes: BTreeMap<CanonicalPath, Node> = BTreeMap::new();

        for (raw, descriptor) in self.0 {
            let path = normalize(&raw).map_err(|e| VfsError::InvalidSnapshot(e.to_string()))?;
            let node = match (descriptor.kind, descriptor.content) {
                (NodeKind::File, Some(content)) => Node::File {
                    path: path.clone(),
                    content,
                },
                (NodeKind::File, None) => {
                    return Err(VfsError::InvalidSnapshot(format!(
                        "file entry {raw:?} has no content"
                    )));
                }
                (NodeKind::Directory, None) => Node::Directory { path: path.clone() },
                (NodeKind::Directory, Some(_)) => {
                    return Err(VfsError::InvalidSnapshot(format!(
                        "directory entry {raw:?} must not have content"
                    )));
                }
            };

            if path.is_root() {
                if node.is_file() {
                    return Err(VfsError::InvalidSnapshot(
                        "the root must be a directory".to_string(),
                    ));
                }
                continue;
            }

            match nodes.entry(path) {
                Entry::Occupied(entry) => {
                    return Err(VfsError::InvalidSnapshot(format!(
                        "entry {raw:?} duplicates {}",
                        entry.key()
                    )));
                }
                Entry::Vacant(entry) => {
                    entry.insert(node);
                }
            }
        }

        let mut implicit = Vec::new();
        for path in nodes.keys() {
            for ancestor in path.ancestors() {
                match nodes.get(&ancestor) {
                    Some(Node::File { .. }) => {
                        return Err(VfsError::InvalidSnapshot(format!(
                            "{path} is nested under the file {ancestor}"
                        )));
                    }
                    Some(Node::Directory { .. }) => {}
                    None => implicit.push(ancestor),
                }
            }
        }
        for path in implicit {
            nodes
                .entry(path)
                .or_insert_with_key(|path| Node::Directory { path: path.clone() });
        }

        debug!(nodes = nodes.len(), "hydrated store from snapshot");
        Ok(NodeStore::from_nodes(nodes))
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, path: impl Into<String>, node: NodeSnapshot) {
        self.0.insert(path.into(), node);
    }

    /// Look up an entry by its key as stored.
    pub fn get(&self, path: &str) -> Option<&NodeSnapshot> {
        self.0.get(path)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the snapshot has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(path, descriptor)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeSnapshot)> {
        self.0.iter().map(|(path, node)| (path.as_str(), node))
    }
}

impl From<&NodeStore> for Snapshot {
    fn from(store: &NodeStore) -> Self {
        Self::from_store(store)
    }
}

impl TryFrom<Snapshot> for NodeStore {
    type Error = VfsError;

    fn try_from(snapshot: Snapshot) -> Result<Self, Self::Error> {
        snapshot.into_store()
    }
}

impl FromIterator<(String, NodeSnapshot)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, NodeSnapshot)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Flatten a store into a snapshot.
pub fn serialize(store: &NodeStore) -> Snapshot {
    Snapshot::from_store(store)
}

/// Rebuild a store from a snapshot.
pub fn deserialize(snapshot: Snapshot) -> VfsResult<NodeStore> {
    snapshot.into_store()
}
