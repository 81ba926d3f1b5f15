//! The `file_manager` tool: structural changes that move or remove whole nodes.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::vfs::{NodeStore, VfsResult, normalize};

/// A parsed `file_manager` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum FileManagerCommand {
    /// Move a file or directory; directories move with their whole subtree.
    Rename {
        /// Current path.
        path: String,
        /// Destination path.
        new_path: String,
    },
    /// Remove a file, or a directory and everything under it.
    Delete {
        /// Path to remove.
        path: String,
    },
}

impl FileManagerCommand {
    /// Parse raw tool arguments.
    pub fn parse(args: serde_json::Value) -> VfsResult<Self> {
        super::parse_args(super::FILE_MANAGER_TOOL, args)
    }

    /// The command name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            FileManagerCommand::Rename { .. } => "rename",
            FileManagerCommand::Delete { .. } => "delete",
        }
    }

    /// The path the command addresses.
    pub fn path(&self) -> &str {
        match self {
            FileManagerCommand::Rename { path, .. } | FileManagerCommand::Delete { path } => path,
        }
    }

    /// Run the command, returning its result payload.
    pub fn execute(&self, store: &mut NodeStore) -> VfsResult<serde_json::Value> {
        match self {
            FileManagerCommand::Rename { path, new_path } => {
                let from = normalize(path)?;
                let to = normalize(new_path)?;
                let moved = store.rename(&from, &to)?;
                Ok(json!({ "from": from.as_str(), "to": to.as_str(), "moved": moved }))
            }
            FileManagerCommand::Delete { path } => {
                let path = normalize(path)?;
                let removed = store.delete_file(&path)?;
                Ok(json!({ "deleted": path.as_str(), "removed": removed }))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tools::{FILE_MANAGER_TOOL, ToolResponse, dispatch};

    fn run(store: &mut NodeStore, args: serde_json::Value) -> ToolResponse {
        dispatch(store, FILE_MANAGER_TOOL, args)
    }

    #[test]
    fn test_parse() {
        let command = FileManagerCommand::parse(json!({
            "command": "rename",
            "path": "/a",
            "new_path": "/b"
        }))
        .unwrap();
        assert_eq!(command.name(), "rename");
        assert_eq!(command.path(), "/a");

        let err = FileManagerCommand::parse(json!({"command": "copy", "path": "/a"})).unwrap_err();
        assert!(err.to_string().contains("invalid file_manager arguments"));
    }

    #[test]
    fn test_rename_file() {
        let mut store = NodeStore::new();
        store.create_file_with_parents("/old.jsx", "x").unwrap();

        let response = run(
            &mut store,
            json!({"command": "rename", "path": "old.jsx", "new_path": "/components/New.jsx"}),
        );
        assert_eq!(
            response.result,
            Some(json!({"from": "/old.jsx", "to": "/components/New.jsx", "moved": 1}))
        );
        assert!(!store.exists("/old.jsx"));
        assert!(store.get("/components").unwrap().is_dir());
        assert_eq!(
            store.get("/components/New.jsx").unwrap().content(),
            Some("x")
        );
    }

    #[test]
    fn test_rename_directory_moves_subtree() {
        let mut store = NodeStore::new();
        store.create_file_with_parents("/src/a.js", "a").unwrap();
        store.create_file_with_parents("/src/lib/b.js", "b").unwrap();

        let response = run(
            &mut store,
            json!({"command": "rename", "path": "/src", "new_path": "/app"}),
        );
        assert!(response.success, "{response:?}");
        assert_eq!(response.result.unwrap()["moved"], 4);
        assert_eq!(store.get("/app/lib/b.js").unwrap().content(), Some("b"));
        assert!(!store.exists("/src"));
    }

    #[test]
    fn test_rename_requires_new_path() {
        let mut store = NodeStore::new();
        store.create_file_with_parents("/a.txt", "a").unwrap();
        let response = run(&mut store, json!({"command": "rename", "path": "/a.txt"}));
        assert!(!response.success);
        assert!(response.error.unwrap().contains("new_path"));
        assert!(store.exists("/a.txt"));
    }

    #[test]
    fn test_rename_collision() {
        let mut store = NodeStore::new();
        store.create_file_with_parents("/a.txt", "a").unwrap();
        store.create_file_with_parents("/b.txt", "b").unwrap();
        let response = run(
            &mut store,
            json!({"command": "rename", "path": "/a.txt", "new_path": "/b.txt"}),
        );
        assert_eq!(response.error.as_deref(), Some("/b.txt already exists"));
        assert_eq!(store.get("/b.txt").unwrap().content(), Some("b"));
    }

    #[test]
    fn test_delete_directory() {
        let mut store = NodeStore::new();
        store.create_file_with_parents("/d/x.txt", "x").unwrap();
        store.create_file_with_parents("/keep.txt", "k").unwrap();

        let response = run(&mut store, json!({"command": "delete", "path": "/d"}));
        assert_eq!(
            response.result,
            Some(json!({"deleted": "/d", "removed": 2}))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_missing() {
        let mut store = NodeStore::new();
        let response = run(&mut store, json!({"command": "delete", "path": "/nope"}));
        assert_eq!(response.error.as_deref(), Some("not found: /nope"));
    }

    #[test]
    fn test_delete_root_rejected() {
        let mut store = NodeStore::new();
        store.create_file_with_parents("/a.txt", "a").unwrap();
        let response = run(&mut store, json!({"command": "delete", "path": "/"}));
        assert!(!response.success);
        assert!(store.exists("/a.txt"));
    }
}
