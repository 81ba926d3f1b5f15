//! Command adapters between agent tool calls and the virtual filesystem.
//!
//! The agent edits files through two tools:
//!
//! - [`str_replace_editor`](EDITOR_TOOL) - `view`, `create`, `str_replace`, `insert`, `undo_edit`
//! - [`file_manager`](FILE_MANAGER_TOOL) - `rename`, `delete`
//!
//! Arguments arrive as loosely-shaped JSON. They are parsed into closed
//! command enums ([`EditorCommand`], [`FileManagerCommand`]) before anything
//! touches the store, and every outcome, good or bad, comes back as a
//! [`ToolResponse`] envelope:
//!
//! ```json
//! { "success": true, "result": { "deleted": "/old.jsx" } }
//! { "success": false, "error": "not found: /old.jsx" }
//! ```

mod definition;
mod file_manager;
mod str_replace;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::vfs::{NodeStore, VfsError, VfsResult};

pub use definition::{ToolDefinition, tool_definitions};
pub use file_manager::FileManagerCommand;
pub use str_replace::EditorCommand;

/// Name of the content editing tool.
pub const EDITOR_TOOL: &str = "str_replace_editor";

/// Name of the structural tool.
pub const FILE_MANAGER_TOOL: &str = "file_manager";

/// Uniform result envelope returned for every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Whether the command succeeded.
    pub success: bool,
    /// Operation-specific payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResponse {
    /// A successful response carrying `result`.
    pub fn success(result: serde_json::Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    /// A failed response carrying the error's message.
    pub fn failure(error: impl fmt::Display) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.to_string()),
        }
    }

    /// The envelope as a JSON value.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({ "success": false, "error": format!("unserializable result: {e}") })
        })
    }
}

impl From<VfsResult<serde_json::Value>> for ToolResponse {
    fn from(result: VfsResult<serde_json::Value>) -> Self {
        match result {
            Ok(value) => Self::success(value),
            Err(err) => Self::failure(err),
        }
    }
}

/// Run one tool call against the store.
///
/// Never fails: unknown tools, malformed arguments and filesystem errors all
/// come back as a failed [`ToolResponse`].
pub fn dispatch(store: &mut NodeStore, tool: &str, args: serde_json::Value) -> ToolResponse {
    let result = match tool {
        EDITOR_TOOL => parse_args::<EditorCommand>(tool, args).and_then(|command| {
            debug!(tool, command = command.name(), path = command.path(), "executing");
            command.execute(store)
        }),
        FILE_MANAGER_TOOL => parse_args::<FileManagerCommand>(tool, args).and_then(|command| {
            debug!(tool, command = command.name(), path = command.path(), "executing");
            command.execute(store)
        }),
        other => Err(VfsError::ParamValidation(format!(
            "unknown tool: {other}; available tools are {EDITOR_TOOL} and {FILE_MANAGER_TOOL}"
        ))),
    };

    if let Err(err) = &result {
        warn!(tool, error = %err, "tool call failed");
    }
    result.into()
}

/// Parse tool arguments into a command, mapping any shape error to
/// [`VfsError::ParamValidation`].
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: serde_json::Value) -> VfsResult<T> {
    serde_json::from_value(args)
        .map_err(|e| VfsError::ParamValidation(format!("invalid {tool} arguments: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_envelope_serialization() {
        let ok = ToolResponse::success(json!({"deleted": "/a"}));
        assert_eq!(
            ok.to_value(),
            json!({"success": true, "result": {"deleted": "/a"}})
        );

        let err = ToolResponse::failure("boom");
        assert_eq!(err.to_value(), json!({"success": false, "error": "boom"}));
    }

    #[test]
    fn test_dispatch_routes_by_tool() {
        let mut store = NodeStore::new();
        let created = dispatch(
            &mut store,
            EDITOR_TOOL,
            json!({"command": "create", "path": "/a.txt", "file_text": "hi"}),
        );
        assert!(created.success, "{created:?}");

        let renamed = dispatch(
            &mut store,
            FILE_MANAGER_TOOL,
            json!({"command": "rename", "path": "/a.txt", "new_path": "/b.txt"}),
        );
        assert!(renamed.success, "{renamed:?}");
        assert!(store.exists("/b.txt"));
    }

    #[test]
    fn test_dispatch_unknown_tool() {
        let mut store = NodeStore::new();
        let response = dispatch(&mut store, "bash", json!({"command": "ls"}));
        assert!(!response.success);
        assert!(response.error.unwrap().contains("unknown tool: bash"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_dispatch_missing_command() {
        let mut store = NodeStore::new();
        let response = dispatch(&mut store, EDITOR_TOOL, json!({"path": "/a.txt"}));
        assert!(!response.success);
        assert!(response.error.unwrap().contains("command"));
    }
}
