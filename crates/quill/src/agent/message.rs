//! The session message log.
//!
//! # Transcript Format
//!
//! [`transcript`] renders the log in a compact form:
//!
//! ```text
//! U> Build me a counter
//!
//! A> I'll create a Counter component for you.
//! T[str_replace_editor] {"command":"create","path":"/components/Counter.jsx",...}
//! R> {"success":true,"result":{"created":"/components/Counter.jsx"}}
//! ```
//!
//! - `U>` - user message
//! - `A>` - assistant text
//! - `T[tool_name]` - tool invocation with JSON arguments
//! - `R>` - tool result envelope
//!
//! System messages are not rendered.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::ToolCall;
use crate::tools::ToolResponse;

/// One entry of the message log, tagged by role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    /// Instructions for the model. Never persisted.
    System {
        /// Prompt text.
        content: String,
    },
    /// A user request.
    User {
        /// Request text.
        content: String,
    },
    /// One model step: its text and the tool calls it made.
    Assistant {
        /// Assistant text; may be empty.
        #[serde(default)]
        content: String,
        /// Tool calls, in the order they were run.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// The outcome of one tool call.
    Tool {
        /// Id of the [`ToolCall`] this answers.
        call_id: String,
        /// Name of the tool that ran.
        tool_name: String,
        /// The result envelope.
        result: ToolResponse,
    },
}

impl Message {
    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// An assistant message.
    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    /// A tool result message.
    pub fn tool(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        result: ToolResponse,
    ) -> Self {
        Self::Tool {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            result,
        }
    }

    /// The role name as it appears on the wire.
    pub fn role(&self) -> &'static str {
        match self {
            Message::System { .. } => "system",
            Message::User { .. } => "user",
            Message::Assistant { .. } => "assistant",
            Message::Tool { .. } => "tool",
        }
    }

    /// Text content of system, user and assistant messages.
    pub fn text(&self) -> Option<&str> {
        match self {
            Message::System { content }
            | Message::User { content }
            | Message::Assistant { content, .. } => Some(content),
            Message::Tool { .. } => None,
        }
    }

    /// Returns true for system messages.
    pub fn is_system(&self) -> bool {
        matches!(self, Message::System { .. })
    }
}

/// Render `messages` in the compact transcript format.
pub fn transcript(messages: &[Message]) -> String {
    let results: HashMap<&str, &ToolResponse> = messages
        .iter()
        .filter_map(|m| match m {
            Message::Tool {
                call_id, result, ..
            } => Some((call_id.as_str(), result)),
            _ => None,
        })
        .collect();
    let answered: Vec<&str> = messages
        .iter()
        .flat_map(|m| match m {
            Message::Assistant { tool_calls, .. } => tool_calls.as_slice(),
            _ => &[],
        })
        .map(|call| call.id.as_str())
        .collect();

    let mut blocks = Vec::new();
    for message in messages {
        match message {
            Message::System { .. } => {}
            Message::User { content } => blocks.push(format!("U> {content}")),
            Message::Assistant {
                content,
                tool_calls,
            } => {
                let mut lines = Vec::new();
                if !content.is_empty() {
                    lines.push(format!("A> {content}"));
                }
                for call in tool_calls {
                    lines.push(format!("T[{}] {}", call.name, call.arguments));
                    if let Some(result) = results.get(call.id.as_str()) {
                        lines.push(format!("R> {}", result.to_value()));
                    }
                }
                if !lines.is_empty() {
                    blocks.push(lines.join("\n"));
                }
            }
            Message::Tool {
                call_id, result, ..
            } => {
                if !answered.contains(&call_id.as_str()) {
                    blocks.push(format!("R> {}", result.to_value()));
                }
            }
        }
    }

    let mut out = blocks.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn call(id: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: "file_manager".to_string(),
            arguments: json!({"command": "delete", "path": "/a"}),
        }
    }

    #[test]
    fn test_message_wire_format() {
        let message = Message::assistant("ok", vec![call("c1")]);
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["tool_calls"][0]["id"], "c1");

        let plain = serde_json::to_value(Message::assistant("hi", Vec::new())).unwrap();
        assert_eq!(plain, json!({"role": "assistant", "content": "hi"}));

        let parsed: Message =
            serde_json::from_value(json!({"role": "user", "content": "hello"})).unwrap();
        assert_eq!(parsed, Message::user("hello"));
        assert_eq!(parsed.role(), "user");
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result: Result<Message, _> =
            serde_json::from_value(json!({"role": "narrator", "content": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_transcript() {
        let messages = vec![
            Message::system("be helpful"),
            Message::user("delete a"),
            Message::assistant("Deleting.", vec![call("c1")]),
            Message::tool(
                "c1",
                "file_manager",
                ToolResponse::success(json!({"deleted": "/a"})),
            ),
            Message::assistant("Done.", Vec::new()),
        ];
        let expected = format!(
            "U> delete a\n\nA> Deleting.\nT[file_manager] {}\nR> {}\n\nA> Done.\n",
            json!({"command": "delete", "path": "/a"}),
            ToolResponse::success(json!({"deleted": "/a"})).to_value()
        );
        assert_eq!(transcript(&messages), expected);
    }

    #[test]
    fn test_transcript_orphan_result() {
        let messages = vec![Message::tool("x", "file_manager", ToolResponse::failure("boom"))];
        assert_eq!(
            transcript(&messages),
            format!("R> {}\n", ToolResponse::failure("boom").to_value())
        );
        assert_eq!(transcript(&[]), "");
    }
}
