use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use super::{PersistError, ProjectKey, ProjectRecord, ProjectStore};
use crate::vfs::Snapshot;

/// On-disk form of a project: the record plus its owner.
#[derive(Debug, Serialize, Deserialize)]
struct ProjectFile {
    user_id: String,
    #[serde(flatten)]
    record: ProjectRecord,
}

/// Decodes only the snapshot of a project file, keeping repeated keys visible.
#[derive(Deserialize)]
#[allow(dead_code)]
struct SnapshotCheck {
    #[serde(default)]
    snapshot: Option<Snapshot>,
}

/// Project store keeping one JSON file per project under a root directory.
///
/// ```text
/// <root>/
/// ├── landing-page.json
/// └── todo-app.json
/// ```
///
/// Writes go to a uniquely named temporary file in the root which is then
/// renamed over the target, so a crash never leaves a half-written record
/// behind.
#[derive(Debug, Clone)]
pub struct FileProjectStore {
    root: PathBuf,
}

impl FileProjectStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_path(&self, key: &ProjectKey) -> PathBuf {
        self.root.join(format!("{}.json", key.project_id))
    }

    async fn read(&self, key: &ProjectKey) -> Result<Option<ProjectFile>, PersistError> {
        let path = self.project_path(key);
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let corrupt = |e: serde_json::Error| PersistError::Corrupt {
            project_id: key.project_id.clone(),
            reason: e.to_string(),
        };
        // A `Value` keeps only the last of two equal keys, so check the snapshot first
        serde_json::from_str::<SnapshotCheck>(&data).map_err(corrupt)?;
        let file = serde_json::from_str(&data).map_err(corrupt)?;
        Ok(Some(file))
    }
}

fn check_owner(key: &ProjectKey, file: &ProjectFile) -> Result<(), PersistError> {
    if file.user_id == key.user_id {
        Ok(())
    } else {
        Err(PersistError::NotOwner {
            project_id: key.project_id.clone(),
            user_id: key.user_id.clone(),
        })
    }
}

#[async_trait]
impl ProjectStore for FileProjectStore {
    async fn load(&self, key: &ProjectKey) -> Result<ProjectRecord, PersistError> {
        key.validate()?;
        let file = self
            .read(key)
            .await?
            .ok_or_else(|| PersistError::NotFound(key.project_id.clone()))?;
        check_owner(key, &file)?;
        Ok(file.record)
    }

    async fn persist(
        &self,
        key: &ProjectKey,
        messages: serde_json::Value,
        snapshot: serde_json::Value,
    ) -> Result<(), PersistError> {
        key.validate()?;
        if let Some(existing) = self.read(key).await? {
            check_owner(key, &existing)?;
        }

        let file = ProjectFile {
            user_id: key.user_id.clone(),
            record: ProjectRecord { messages, snapshot },
        };
        let data = serde_json::to_vec_pretty(&file).map_err(|e| PersistError::Corrupt {
            project_id: key.project_id.clone(),
            reason: e.to_string(),
        })?;

        tokio::fs::create_dir_all(&self.root).await?;
        let target = self.project_path(key);
        let root = self.root.clone();
        let bytes = data.len();
        // Each writer gets its own temp file; dropping it on failure removes it
        tokio::task::spawn_blocking({
            let target = target.clone();
            move || -> std::io::Result<()> {
                let mut temp = NamedTempFile::new_in(&root)?;
                temp.write_all(&data)?;
                temp.persist(&target).map_err(|e| e.error)?;
                Ok(())
            }
        })
        .await
        .map_err(std::io::Error::other)??;

        debug!(project = %key.project_id, path = %target.display(), bytes, "persisted project");
        Ok(())
    }
}
