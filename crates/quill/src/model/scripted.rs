//! A model that replays a fixed conversation.
//!
//! Scripts are JSON arrays of turns, one per assistant step after a user
//! message:
//!
//! ```json
//! [
//!   { "text": "Creating the file.",
//!     "tool_calls": [{ "name": "str_replace_editor",
//!                      "arguments": { "command": "create", "path": "/a.txt", "file_text": "hi" } }] },
//!   { "text": "All done." }
//! ]
//! ```

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use super::{
    EventStream, FinishReason, LanguageModel, ModelError, ModelEvent, ToolCall, Usage, word_chunks,
};
use crate::agent::Message;

/// A tool call inside a scripted turn. Ids are assigned at replay time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedToolCall {
    /// Tool name.
    pub name: String,
    /// Tool arguments.
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// One scripted assistant step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptedTurn {
    /// Assistant text.
    #[serde(default)]
    pub text: String,
    /// Tool calls, run in order.
    #[serde(default)]
    pub tool_calls: Vec<ScriptedToolCall>,
}

impl ScriptedTurn {
    /// A turn with text only.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Add a tool call to the turn.
    pub fn with_call(mut self, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        self.tool_calls.push(ScriptedToolCall {
            name: name.into(),
            arguments,
        });
        self
    }
}

/// Replays [`ScriptedTurn`]s, choosing the turn by the number of assistant
/// messages since the latest user message. Past the end of the script it
/// finishes with [`FinishReason::Stop`] and no text.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLanguageModel {
    turns: Vec<ScriptedTurn>,
}

impl ScriptedLanguageModel {
    /// Create a model replaying `turns`.
    pub fn new(turns: Vec<ScriptedTurn>) -> Self {
        Self { turns }
    }

    /// Parse a script from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let turns: Vec<ScriptedTurn> =
            serde_json::from_str(json).map_err(|e| ModelError::InvalidScript(e.to_string()))?;
        Ok(Self::new(turns))
    }

    /// Number of scripted turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if the script has no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn events_for(&self, prompt: &[Message]) -> Vec<ModelEvent> {
        let since_user = prompt
            .iter()
            .rposition(|m| matches!(m, Message::User { .. }))
            .map_or(prompt, |i| &prompt[i + 1..]);
        let index = since_user
            .iter()
            .filter(|m| matches!(m, Message::Assistant { .. }))
            .count();
        let issued = prompt
            .iter()
            .filter(|m| matches!(m, Message::Assistant { .. }))
            .count();

        let Some(turn) = self.turns.get(index) else {
            return vec![ModelEvent::Finish {
                reason: FinishReason::Stop,
                usage: Usage::default(),
            }];
        };

        let mut events: Vec<ModelEvent> = word_chunks(&turn.text)
            .into_iter()
            .map(ModelEvent::text)
            .collect();
        events.extend(turn.tool_calls.iter().enumerate().map(|(i, call)| {
            ModelEvent::ToolCall(ToolCall {
                id: format!("script_{}_{}", issued + 1, i + 1),
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            })
        }));
        let reason = if turn.tool_calls.is_empty() {
            FinishReason::Stop
        } else {
            FinishReason::ToolCalls
        };
        events.push(ModelEvent::Finish {
            reason,
            usage: Usage::default(),
        });
        events
    }
}

#[async_trait]
impl LanguageModel for ScriptedLanguageModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &[Message]) -> Result<EventStream, ModelError> {
        let events = self.events_for(prompt);
        Ok(futures::stream::iter(events.into_iter().map(Ok)).boxed())
    }
}
