use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{PersistError, ProjectKey, ProjectRecord, ProjectStore};

#[derive(Debug, Clone)]
struct StoredProject {
    user_id: String,
    record: ProjectRecord,
}

/// Project store held in memory; contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct InMemoryProjectStore {
    projects: RwLock<HashMap<String, StoredProject>>,
}

impl InMemoryProjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored projects.
    pub async fn len(&self) -> usize {
        self.projects.read().await.len()
    }

    /// Returns true if no project has been stored.
    pub async fn is_empty(&self) -> bool {
        self.projects.read().await.is_empty()
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn load(&self, key: &ProjectKey) -> Result<ProjectRecord, PersistError> {
        key.validate()?;
        let projects = self.projects.read().await;
        let stored = projects
            .get(&key.project_id)
            .ok_or_else(|| PersistError::NotFound(key.project_id.clone()))?;
        if stored.user_id != key.user_id {
            return Err(PersistError::NotOwner {
                project_id: key.project_id.clone(),
                user_id: key.user_id.clone(),
            });
        }
        Ok(stored.record.clone())
    }

    async fn persist(
        &self,
        key: &ProjectKey,
        messages: serde_json::Value,
        snapshot: serde_json::Value,
    ) -> Result<(), PersistError> {
        key.validate()?;
        let mut projects = self.projects.write().await;
        if let Some(existing) = projects.get(&key.project_id)
            && existing.user_id != key.user_id
        {
            return Err(PersistError::NotOwner {
                project_id: key.project_id.clone(),
                user_id: key.user_id.clone(),
            });
        }
        projects.insert(
            key.project_id.clone(),
            StoredProject {
                user_id: key.user_id.clone(),
                record: ProjectRecord { messages, snapshot },
            },
        );
        debug!(project = %key.project_id, "persisted project in memory");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_persist_then_load() {
        let store = InMemoryProjectStore::new();
        let key = ProjectKey::new("p1", "alice");

        assert!(matches!(
            store.load(&key).await,
            Err(PersistError::NotFound(_))
        ));

        store
            .persist(&key, json!([{"role": "user", "content": "hi"}]), json!({}))
            .await
            .unwrap();
        let record = store.load(&key).await.unwrap();
        assert_eq!(record.messages[0]["content"], "hi");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_ownership_enforced() {
        let store = InMemoryProjectStore::new();
        store
            .persist(&ProjectKey::new("p1", "alice"), json!([]), json!({}))
            .await
            .unwrap();

        let mallory = ProjectKey::new("p1", "mallory");
        assert!(matches!(
            store.load(&mallory).await,
            Err(PersistError::NotOwner { .. })
        ));
        assert!(matches!(
            store.persist(&mallory, json!([]), json!({})).await,
            Err(PersistError::NotOwner { .. })
        ));
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = InMemoryProjectStore::new();
        let key = ProjectKey::new("p1", "alice");
        store.persist(&key, json!(["first"]), json!({})).await.unwrap();
        store.persist(&key, json!(["second"]), json!({})).await.unwrap();
        assert_eq!(store.load(&key).await.unwrap().messages, json!(["second"]));
    }

    #[tokio::test]
    async fn test_rejects_invalid_id() {
        let store = InMemoryProjectStore::new();
        let key = ProjectKey::new("../p", "alice");
        assert!(matches!(
            store.persist(&key, json!([]), json!({})).await,
            Err(PersistError::InvalidProjectId(_))
        ));
        assert!(store.is_empty().await);
    }
}
