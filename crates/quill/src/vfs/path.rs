//! Path normalization.
//!
//! Every path that reaches the store goes through [`normalize`] first, so the
//! rest of the crate only ever sees [`CanonicalPath`] values: absolute, no
//! empty segments, no `.`/`..`, no trailing separator except on the root.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{VfsError, VfsResult};

/// Path separator used by the virtual filesystem.
pub const SEPARATOR: char = '/';

/// A normalized absolute path, the identity of a node in the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalPath(String);

/// Normalize a raw path string into a [`CanonicalPath`].
///
/// Relative input is anchored at the root, repeated separators collapse and
/// `.` segments are dropped. A `..` segment removes the previous segment and
/// fails if there is nothing left to remove.
///
/// ```rust
/// use quill::vfs::normalize;
///
/// assert_eq!(normalize("components//Card.jsx").unwrap().as_str(), "/components/Card.jsx");
/// assert_eq!(normalize("/a/./b/../c/").unwrap().as_str(), "/a/c");
/// assert!(normalize("/../etc").is_err());
/// ```
pub fn normalize(raw: &str) -> VfsResult<CanonicalPath> {
    if raw.trim().is_empty() {
        return Err(VfsError::invalid_path(raw, "path is empty"));
    }
    if raw.contains('\0') {
        return Err(VfsError::invalid_path(raw, "path contains a NUL byte"));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(VfsError::invalid_path(raw, "path escapes the root"));
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Ok(CanonicalPath::root());
    }

    let mut path = String::with_capacity(raw.len() + 1);
    for segment in segments {
        path.push(SEPARATOR);
        path.push_str(segment);
    }
    Ok(CanonicalPath(path))
}

impl CanonicalPath {
    /// The root directory, `/`.
    pub fn root() -> Self {
        Self(SEPARATOR.to_string())
    }

    /// Returns true if this is the root directory.
    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit(SEPARATOR).next()
    }

    /// The containing directory, or `None` for the root.
    pub fn parent(&self) -> Option<CanonicalPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind(SEPARATOR) {
            Some(0) | None => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
        }
    }

    /// Proper ancestors below the root, outermost first.
    ///
    /// `/a/b/c.txt` yields `/a` then `/a/b`.
    pub fn ancestors(&self) -> Vec<CanonicalPath> {
        self.0
            .match_indices(SEPARATOR)
            .map(|(idx, _)| idx)
            .filter(|&idx| idx > 0)
            .map(|idx| Self(self.0[..idx].to_string()))
            .collect()
    }

    /// Append a single segment, normalizing the result.
    pub fn join(&self, segment: &str) -> VfsResult<CanonicalPath> {
        normalize(&format!("{}{SEPARATOR}{segment}", self.0))
    }

    /// Returns true if `self` lies strictly inside the directory `dir`.
    pub fn is_within(&self, dir: &CanonicalPath) -> bool {
        if dir.is_root() {
            return !self.is_root();
        }
        self.0.len() > dir.0.len()
            && self.0.starts_with(&dir.0)
            && self.0.as_bytes()[dir.0.len()] == SEPARATOR as u8
    }

    /// Rewrite the `from` prefix of this path to `to`.
    ///
    /// Returns `None` when `self` is neither `from` nor inside it.
    pub fn rebase(&self, from: &CanonicalPath, to: &CanonicalPath) -> Option<CanonicalPath> {
        if self == from {
            return Some(to.clone());
        }
        if !self.is_within(from) {
            return None;
        }
        let suffix = if from.is_root() {
            &self.0[..]
        } else {
            &self.0[from.0.len()..]
        };
        if to.is_root() {
            Some(Self(suffix.to_string()))
        } else {
            Some(Self(format!("{}{suffix}", to.0)))
        }
    }

    /// Number of segments below the root.
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.0.matches(SEPARATOR).count()
        }
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CanonicalPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CanonicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CanonicalPath {
    type Err = VfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

impl TryFrom<String> for CanonicalPath {
    type Error = VfsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        normalize(&value)
    }
}

impl TryFrom<&str> for CanonicalPath {
    type Error = VfsError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        normalize(value)
    }
}

impl From<CanonicalPath> for String {
    fn from(path: CanonicalPath) -> Self {
        path.0
    }
}
