//! The editing session: one project's message log and filesystem.

use futures::StreamExt;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::message::{Message, transcript};
use crate::model::{DEFAULT_MAX_STEPS, FinishReason, LanguageModel, ModelError, ModelEvent, ToolCall};
use crate::project::{PersistError, ProjectKey, ProjectRecord, ProjectStore};
use crate::tools::{ToolResponse, dispatch};
use crate::vfs::{NodeStore, Snapshot, VfsError};

/// Instructions prepended to every prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a software engineer building React components inside a virtual file system.

- The root of the file system is '/'. There is no other directory on the machine.
- Every project must have a root /App.jsx that default-exports a React component.
- Import local files with the '@/' alias, e.g. '@/components/Counter'.
- Style with Tailwind CSS classes, not inline styles.
- Use the str_replace_editor tool to view, create and edit files, and the file_manager tool to rename or delete them.
- Keep responses brief. Do not summarize the work unless asked.";

/// Errors produced while running or storing a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The stored snapshot could not be rebuilt.
    #[error(transparent)]
    Vfs(#[from] VfsError),
    /// The model failed.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// The project store failed.
    #[error(transparent)]
    Persist(#[from] PersistError),
    /// The message log could not be encoded or decoded.
    #[error("message log codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Receives everything that happens during [`Session::respond`].
pub trait TurnObserver: Send {
    /// Called for every model event, in stream order.
    fn on_event(&mut self, _event: &ModelEvent) {}

    /// Called after each tool call has run.
    fn on_tool_result(&mut self, _call: &ToolCall, _response: &ToolResponse) {}
}

impl TurnObserver for () {}

/// Summary of one [`Session::respond`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Number of model steps taken.
    pub steps: usize,
    /// Assistant text of all steps, one line per step that produced text.
    pub text: String,
    /// Finish reason of the last step.
    pub finish_reason: FinishReason,
    /// True if the loop stopped because it ran out of steps.
    pub step_limit_reached: bool,
}

/// An editing session.
///
/// The session owns the message log and the [`NodeStore`]; commands run
/// strictly one after another against it.
pub struct Session {
    key: ProjectKey,
    messages: Vec<Message>,
    store: NodeStore,
    system_prompt: String,
    max_steps: usize,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("key", &self.key)
            .field("messages", &self.messages.len())
            .field("nodes", &self.store.len())
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// A session with an empty log and an empty filesystem.
    pub fn new(key: ProjectKey) -> Self {
        Self {
            key,
            messages: Vec::new(),
            store: NodeStore::new(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Rebuild a session from a stored record.
    ///
    /// A `null` message log or snapshot counts as empty.
    pub fn hydrate(key: ProjectKey, record: ProjectRecord) -> Result<Self, SessionError> {
        let messages: Vec<Message> = if record.messages.is_null() {
            Vec::new()
        } else {
            serde_json::from_value(record.messages)?
        };
        let snapshot: Snapshot = if record.snapshot.is_null() {
            Snapshot::new()
        } else {
            serde_json::from_value(record.snapshot)
                .map_err(|e| VfsError::InvalidSnapshot(e.to_string()))?
        };
        let store = snapshot.into_store()?;

        info!(
            project = %key.project_id,
            messages = messages.len(),
            nodes = store.len(),
            "hydrated session"
        );
        Ok(Self {
            messages,
            store,
            ..Self::new(key)
        })
    }

    /// Load the session for `key`; a project that does not exist yet starts empty.
    pub async fn load(key: ProjectKey, projects: &dyn ProjectStore) -> Result<Self, SessionError> {
        match projects.load(&key).await {
            Ok(record) => Self::hydrate(key, record),
            Err(PersistError::NotFound(_)) => {
                info!(project = %key.project_id, "starting new project");
                Ok(Self::new(key))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the maximum number of model steps per [`respond`](Self::respond) call.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// The project this session edits.
    pub fn key(&self) -> &ProjectKey {
        &self.key
    }

    /// The message log, without the system prompt.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The filesystem.
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Mutable access to the filesystem.
    pub fn store_mut(&mut self) -> &mut NodeStore {
        &mut self.store
    }

    /// The flattened filesystem.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_store(&self.store)
    }

    /// The log in the compact transcript format.
    pub fn transcript(&self) -> String {
        transcript(&self.messages)
    }

    /// Run one tool call against the filesystem.
    pub fn dispatch(&mut self, call: &ToolCall) -> ToolResponse {
        dispatch(&mut self.store, &call.name, call.arguments.clone())
    }

    /// The full prompt sent to the model: system prompt followed by the log.
    pub fn prompt(&self) -> Vec<Message> {
        let mut prompt = Vec::with_capacity(self.messages.len() + 1);
        prompt.push(Message::system(self.system_prompt.as_str()));
        prompt.extend(self.messages.iter().cloned());
        prompt
    }

    /// Answer a user message, letting the model edit files until it stops.
    ///
    /// Each step streams one model turn, records one assistant message and
    /// one tool message per tool call. The loop ends when a turn finishes
    /// with anything but [`FinishReason::ToolCalls`], makes no tool calls,
    /// or the step limit is reached. If the returned future is dropped,
    /// commands that already ran stay applied.
    pub async fn respond(
        &mut self,
        model: &dyn LanguageModel,
        prompt: impl Into<String>,
        observer: &mut dyn TurnObserver,
    ) -> Result<TurnOutcome, SessionError> {
        self.messages.push(Message::user(prompt));

        let mut steps = 0;
        let mut texts: Vec<String> = Vec::new();
        let mut finish_reason = FinishReason::Stop;
        let mut step_limit_reached = false;

        loop {
            if steps >= self.max_steps {
                warn!(
                    project = %self.key.project_id,
                    max_steps = self.max_steps,
                    "step limit reached"
                );
                step_limit_reached = true;
                break;
            }
            steps += 1;

            let mut stream = model.generate(&self.prompt()).await?;
            let mut text = String::new();
            let mut tool_calls = Vec::new();
            let mut finish = None;
            while let Some(event) = stream.next().await {
                let event = event?;
                observer.on_event(&event);
                match event {
                    ModelEvent::TextChunk { text: chunk } => text.push_str(&chunk),
                    ModelEvent::ToolCall(call) => tool_calls.push(call),
                    ModelEvent::Finish { reason, usage } => {
                        debug!(step = steps, %reason, ?usage, "model turn finished");
                        finish = Some(reason);
                        break;
                    }
                }
            }
            let reason = finish.ok_or_else(|| {
                ModelError::Stream("turn ended without a finish event".to_string())
            })?;
            finish_reason = reason;

            self.messages
                .push(Message::assistant(text.as_str(), tool_calls.clone()));
            if !text.is_empty() {
                texts.push(text);
            }

            for call in &tool_calls {
                let response = self.dispatch(call);
                observer.on_tool_result(call, &response);
                self.messages
                    .push(Message::tool(call.id.as_str(), call.name.as_str(), response));
            }

            if reason != FinishReason::ToolCalls || tool_calls.is_empty() {
                break;
            }
        }

        info!(
            project = %self.key.project_id,
            model = %model.model_id(),
            steps,
            %finish_reason,
            "turn complete"
        );
        Ok(TurnOutcome {
            steps,
            text: texts.join("\n"),
            finish_reason,
            step_limit_reached,
        })
    }

    /// Write the log (without system messages) and the flattened filesystem.
    pub async fn persist(&self, projects: &dyn ProjectStore) -> Result<(), SessionError> {
        let messages: Vec<&Message> = self.messages.iter().filter(|m| !m.is_system()).collect();
        let messages = serde_json::to_value(messages)?;
        let snapshot = serde_json::to_value(self.snapshot())?;
        projects.persist(&self.key, messages, snapshot).await?;
        info!(project = %self.key.project_id, nodes = self.store.len(), "persisted session");
        Ok(())
    }
}
