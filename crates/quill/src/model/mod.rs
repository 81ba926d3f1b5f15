//! The language model capability driving the agent loop.
//!
//! A model turns a prompt (the system prompt plus the message log) into a
//! stream of [`ModelEvent`]s:
//!
//! ```text
//! TextChunk("I'll ") TextChunk("create ") ... ToolCall{..} Finish{ToolCalls}
//! ```
//!
//! Every turn ends with exactly one [`ModelEvent::Finish`]. The session runs
//! the tool calls of a turn and asks the model again while the finish reason
//! is [`FinishReason::ToolCalls`].
//!
//! Two implementations ship with the crate. [`MockLanguageModel`] is a
//! deterministic stand-in used when no hosted model is configured, and
//! [`ScriptedLanguageModel`] replays a fixed list of turns. A hosted client
//! is supplied by the embedding application through the same trait; see
//! [`select_model`].

mod config;
mod mock;
mod scripted;

use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::Message;

pub use config::{DEFAULT_MAX_STEPS, DEFAULT_MODEL, ProviderConfig, select_model};
pub use mock::{ComponentKind, MockLanguageModel, MockStep, MockTurn};
pub use scripted::{ScriptedLanguageModel, ScriptedToolCall, ScriptedTurn};

/// Errors produced by language models and their configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The model could not be reached or rejected the request.
    #[error("model request failed: {0}")]
    Request(String),
    /// The event stream broke the turn protocol.
    #[error("malformed model stream: {0}")]
    Stream(String),
    /// A scripted conversation could not be parsed.
    #[error("invalid script: {0}")]
    InvalidScript(String),
    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// A request from the model to run one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier linking the call to its result; unique within a transcript.
    pub id: String,
    /// Tool name, e.g. `str_replace_editor`.
    pub name: String,
    /// Tool arguments as sent by the model.
    pub arguments: serde_json::Value,
}

/// Why a model turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The model is done with this user message.
    Stop,
    /// The model wants its tool calls executed and to be asked again.
    ToolCalls,
    /// The model hit its output limit.
    Length,
    /// The model stopped for another reason.
    Other,
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            FinishReason::Stop => "stop",
            FinishReason::ToolCalls => "tool_calls",
            FinishReason::Length => "length",
            FinishReason::Other => "other",
        };
        f.write_str(reason)
    }
}

/// Token accounting reported with [`ModelEvent::Finish`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens produced by the model.
    pub completion_tokens: u32,
}

/// One event of a model turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelEvent {
    /// A fragment of assistant text.
    TextChunk {
        /// The fragment.
        text: String,
    },
    /// A tool invocation.
    ToolCall(ToolCall),
    /// End of the turn.
    Finish {
        /// Why the turn ended.
        reason: FinishReason,
        /// Token accounting for the turn.
        usage: Usage,
    },
}

impl ModelEvent {
    /// A text fragment event.
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextChunk { text: text.into() }
    }
}

/// Stream of events for a single model turn.
pub type EventStream = BoxStream<'static, Result<ModelEvent, ModelError>>;

/// Capability interface implemented by every model backend.
///
/// Implementations must be deterministic with respect to what the session
/// needs: each call produces one turn, ending in exactly one `Finish` event.
#[async_trait]
pub trait LanguageModel: Send + Sync + fmt::Debug {
    /// Identifier of the model, used in logs.
    fn model_id(&self) -> &str;

    /// Produce the next turn for `prompt`.
    async fn generate(&self, prompt: &[Message]) -> Result<EventStream, ModelError>;
}

/// Split text into word-sized chunks, keeping the separating spaces.
pub(crate) fn word_chunks(text: &str) -> Vec<String> {
    text.split_inclusive(' ').map(str::to_string).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_word_chunks_reassemble() {
        let text = "I'll create a Counter component.";
        let chunks = word_chunks(text);
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[0], "I'll ");
        assert_eq!(chunks.concat(), text);
        assert!(word_chunks("").is_empty());
    }

    #[test]
    fn test_event_serialization() {
        let event = ModelEvent::Finish {
            reason: FinishReason::ToolCalls,
            usage: Usage {
                prompt_tokens: 50,
                completion_tokens: 30,
            },
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "finish",
                "reason": "tool_calls",
                "usage": {"prompt_tokens": 50, "completion_tokens": 30}
            })
        );
        assert_eq!(
            serde_json::to_value(ModelEvent::text("hi")).unwrap(),
            json!({"type": "text_chunk", "text": "hi"})
        );
    }
}
