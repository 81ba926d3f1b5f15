//! Durable project records.
//!
//! A project is the unit of persistence: the message log and the flattened
//! filesystem of one session, owned by one user. Both are stored as opaque
//! JSON values; decoding them is the session's business.
//!
//! Two sessions on the same project each hydrate from the same record and
//! persist independently, so the later write silently replaces the earlier
//! one. No locking or versioning is attempted here.

mod file;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FileProjectStore;
pub use memory::InMemoryProjectStore;

/// Errors produced by project stores.
#[derive(Debug, Error)]
pub enum PersistError {
    /// No project with this id exists.
    #[error("project not found: {0}")]
    NotFound(String),
    /// The project belongs to another user.
    #[error("project {project_id} is not owned by {user_id}")]
    NotOwner {
        /// The project that was addressed.
        project_id: String,
        /// The user that addressed it.
        user_id: String,
    },
    /// The project id contains characters other than ASCII alphanumerics, `-` and `_`.
    #[error("invalid project id {0:?}: use ASCII letters, digits, '-' and '_'")]
    InvalidProjectId(String),
    /// A stored record could not be decoded.
    #[error("corrupt project record {project_id}: {reason}")]
    Corrupt {
        /// The project whose record is unreadable.
        project_id: String,
        /// What was wrong with it.
        reason: String,
    },
    /// Underlying I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Identifies a project and the user acting on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectKey {
    /// Project identifier.
    pub project_id: String,
    /// Owning user.
    pub user_id: String,
}

impl ProjectKey {
    /// Create a key.
    pub fn new(project_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Fail with [`PersistError::InvalidProjectId`] unless the id is non-empty
    /// and made of ASCII alphanumerics, `-` and `_`.
    pub fn validate(&self) -> Result<(), PersistError> {
        let valid = !self.project_id.is_empty()
            && self
                .project_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(())
        } else {
            Err(PersistError::InvalidProjectId(self.project_id.clone()))
        }
    }
}

/// The stored state of a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// The message log, without system messages.
    #[serde(default)]
    pub messages: serde_json::Value,
    /// The flattened filesystem.
    #[serde(default)]
    pub snapshot: serde_json::Value,
}

/// Collaborator that loads and persists project records.
#[async_trait]
pub trait ProjectStore: Send + Sync + std::fmt::Debug {
    /// Load the record for `key`.
    async fn load(&self, key: &ProjectKey) -> Result<ProjectRecord, PersistError>;

    /// Replace the record for `key`, creating the project if it does not exist.
    async fn persist(
        &self,
        key: &ProjectKey,
        messages: serde_json::Value,
        snapshot: serde_json::Value,
    ) -> Result<(), PersistError>;
}
