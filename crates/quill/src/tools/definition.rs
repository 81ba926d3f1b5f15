//! Tool definitions advertised to the language model.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{EDITOR_TOOL, FILE_MANAGER_TOOL};

/// Full definition of a tool including its parameter schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (unique identifier).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's parameters.
    #[serde(default)]
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// The content editing tool: `view`, `create`, `str_replace`, `insert`, `undo_edit`.
    pub fn str_replace_editor() -> Self {
        Self::new(
            EDITOR_TOOL,
            "View, create and edit files in the project's virtual filesystem. \
             `str_replace` replaces old_str only when it occurs exactly once; \
             add surrounding lines to old_str if it is ambiguous. \
             Line numbers are 1-indexed; `insert` with insert_line 0 inserts at the top.",
            json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "enum": ["view", "create", "str_replace", "insert", "undo_edit"],
                        "description": "The operation to perform"
                    },
                    "path": {
                        "type": "string",
                        "description": "Absolute path of the file, e.g. /App.jsx"
                    },
                    "file_text": {
                        "type": "string",
                        "description": "Content of the new file (create)"
                    },
                    "old_str": {
                        "type": "string",
                        "description": "Exact text to replace; must occur exactly once (str_replace)"
                    },
                    "new_str": {
                        "type": "string",
                        "description": "Replacement text (str_replace) or text to insert (insert)"
                    },
                    "insert_line": {
                        "type": "integer",
                        "description": "Line after which to insert; 0 inserts before the first line (insert)"
                    },
                    "view_range": {
                        "type": "array",
                        "items": { "type": "integer" },
                        "minItems": 2,
                        "maxItems": 2,
                        "description": "Inclusive 1-indexed [start, end] line range (view)"
                    }
                },
                "required": ["command", "path"]
            }),
        )
    }

    /// The structural tool: `rename` and `delete`.
    pub fn file_manager() -> Self {
        Self::new(
            FILE_MANAGER_TOOL,
            "Rename or delete files and directories. Renaming a directory moves everything \
             inside it; deleting a directory removes everything inside it.",
            json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "enum": ["rename", "delete"],
                        "description": "The operation to perform"
                    },
                    "path": {
                        "type": "string",
                        "description": "Absolute path of the file or directory"
                    },
                    "new_path": {
                        "type": "string",
                        "description": "Destination path (rename)"
                    }
                },
                "required": ["command", "path"]
            }),
        )
    }
}

/// Definitions of every tool the session can execute.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::str_replace_editor(),
        ToolDefinition::file_manager(),
    ]
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definitions() {
        let tools = tool_definitions();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["str_replace_editor", "file_manager"]);

        for tool in &tools {
            assert_eq!(tool.parameters["type"], "object");
            assert_eq!(tool.parameters["required"], json!(["command", "path"]));
        }
    }

    #[test]
    fn test_editor_schema_lists_commands() {
        let tool = ToolDefinition::str_replace_editor();
        let commands = tool.parameters["properties"]["command"]["enum"]
            .as_array()
            .expect("enum array");
        assert_eq!(commands.len(), 5);
        assert!(tool.description.contains("exactly once"));
    }

    #[test]
    fn test_tool_definition_serialization() {
        let tool = ToolDefinition::file_manager();
        let json = serde_json::to_string(&tool).expect("serialize");
        let parsed: ToolDefinition = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, tool);
    }
}
