//! Errors produced by the virtual filesystem and the command adapters.

use thiserror::Error;

use super::store::NodeKind;

/// Errors that can occur while resolving paths, mutating the store, editing
/// file content or decoding snapshots.
///
/// The `Display` output of every variant is shown to the agent verbatim, so
/// each message says what went wrong and, where possible, how to fix the
/// next command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfsError {
    /// The path could not be normalized.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath {
        /// The path as given.
        path: String,
        /// Why it was rejected.
        reason: String,
    },
    /// No node exists at the path (or the node is not a file where one is needed).
    #[error("not found: {0}")]
    NotFound(String),
    /// A file was found where a directory is required, or the reverse.
    #[error("{path} is a {found}, expected a {expected}")]
    TypeConflict {
        /// The offending path.
        path: String,
        /// The kind the operation needed.
        expected: NodeKind,
        /// The kind that is actually there.
        found: NodeKind,
    },
    /// The rename target already exists.
    #[error("{0} already exists")]
    Collision(String),
    /// `old_str` does not occur in the file.
    #[error(
        "no match for old_str in {path}; it must match the file content exactly, including whitespace and indentation"
    )]
    NoMatch {
        /// The file that was searched.
        path: String,
    },
    /// `old_str` occurs more than once in the file.
    #[error(
        "found {count} matches for old_str in {path}; include more surrounding context so that it matches exactly once"
    )]
    AmbiguousMatch {
        /// The file that was searched.
        path: String,
        /// Number of (possibly overlapping) occurrences.
        count: usize,
    },
    /// A line number or range falls outside the file.
    #[error("line range {requested} is out of bounds for {path} ({line_count} lines)")]
    RangeOutOfBounds {
        /// The file being addressed.
        path: String,
        /// The requested line or range, as the agent sent it.
        requested: String,
        /// Current number of lines in the file.
        line_count: usize,
    },
    /// The operation is not supported.
    #[error("{0}")]
    Unsupported(String),
    /// A snapshot could not be turned back into a store.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
    /// A command was missing required parameters or had malformed ones.
    #[error("{0}")]
    ParamValidation(String),
}

impl VfsError {
    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the VFS.
pub type VfsResult<T> = Result<T, VfsError>;
