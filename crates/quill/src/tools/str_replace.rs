//! The `str_replace_editor` tool.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::vfs::{NodeStore, VfsError, VfsResult, editor};

/// A parsed `str_replace_editor` call.
///
/// The `command` field selects the variant; each variant lists exactly the
/// fields that command requires. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
    /// Show a file with line numbers.
    View {
        /// File to show.
        path: String,
        /// Optional inclusive `[start, end]` line range.
        #[serde(default)]
        view_range: Option<[i64; 2]>,
    },
    /// Create or overwrite a file, creating parent directories.
    Create {
        /// File to write.
        path: String,
        /// Full file content.
        file_text: String,
    },
    /// Replace the unique occurrence of `old_str` with `new_str`.
    StrReplace {
        /// File to edit.
        path: String,
        /// Text to find; must occur exactly once.
        old_str: String,
        /// Replacement text.
        new_str: String,
    },
    /// Insert text after a line.
    Insert {
        /// File to edit.
        path: String,
        /// Line after which to insert; 0 inserts at the top.
        insert_line: i64,
        /// Text to insert.
        new_str: String,
    },
    /// Always rejected; no history is kept.
    UndoEdit {
        /// File the agent wanted to revert.
        path: String,
    },
}

impl EditorCommand {
    /// Parse raw tool arguments.
    pub fn parse(args: serde_json::Value) -> VfsResult<Self> {
        super::parse_args(super::EDITOR_TOOL, args)
    }

    /// The command name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            EditorCommand::View { .. } => "view",
            EditorCommand::Create { .. } => "create",
            EditorCommand::StrReplace { .. } => "str_replace",
            EditorCommand::Insert { .. } => "insert",
            EditorCommand::UndoEdit { .. } => "undo_edit",
        }
    }

    /// The path the command addresses.
    pub fn path(&self) -> &str {
        match self {
            EditorCommand::View { path, .. }
            | EditorCommand::Create { path, .. }
            | EditorCommand::StrReplace { path, .. }
            | EditorCommand::Insert { path, .. }
            | EditorCommand::UndoEdit { path } => path,
        }
    }

    /// Run the command, returning its result payload.
    pub fn execute(&self, store: &mut NodeStore) -> VfsResult<serde_json::Value> {
        match self {
            EditorCommand::View { path, view_range } => {
                let range = view_range.map(|[start, end]| (start, end));
                let view = editor::view(store, path, range)?;
                Ok(serde_json::Value::String(view.numbered()))
            }
            EditorCommand::Create { path, file_text } => {
                let node = store.create_file_with_parents(path, file_text.as_str())?;
                Ok(json!({ "created": node.path().as_str() }))
            }
            EditorCommand::StrReplace {
                path,
                old_str,
                new_str,
            } => {
                if old_str.is_empty() {
                    return Err(VfsError::ParamValidation(
                        "old_str must not be empty for str_replace".to_string(),
                    ));
                }
                let edit = editor::replace_in_file(store, path, old_str, new_str)?;
                Ok(json!({ "path": edit.path.as_str(), "content": edit.content }))
            }
            EditorCommand::Insert {
                path,
                insert_line,
                new_str,
            } => {
                let edit = editor::insert_in_file(store, path, *insert_line, new_str)?;
                Ok(json!({ "path": edit.path.as_str(), "content": edit.content }))
            }
            EditorCommand::UndoEdit { path } => {
                editor::undo_edit(path)?;
                Ok(serde_json::Value::Null)
            }
        }
    }
}
