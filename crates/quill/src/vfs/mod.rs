//! In-memory virtual filesystem edited by the agent.
//!
//! This module provides:
//! - [`normalize`] / [`CanonicalPath`] - path validation and normalization
//! - [`NodeStore`] - the path-indexed tree of files and directories
//! - [`editor`] - view, replace, insert and undo over a single file
//! - [`Snapshot`] - the flat serializable projection used for persistence

pub mod editor;
mod error;
mod path;
pub mod snapshot;
mod store;

pub use editor::{EditResult, ViewResult};
pub use error::{VfsError, VfsResult};
pub use path::{CanonicalPath, SEPARATOR, normalize};
pub use snapshot::{NodeSnapshot, Snapshot};
pub use store::{DirEntry, Node, NodeKind, NodeStore};
