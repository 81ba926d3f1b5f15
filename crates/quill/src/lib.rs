//! Quill: a virtual filesystem edited by a coding agent.
//!
//! Quill keeps a project's source tree in memory and lets an agent change it
//! only through a small exact-match editing protocol: view, create, replace a
//! unique substring, insert at a line, rename and delete. Every command either
//! applies completely or leaves the tree untouched, and every failure comes
//! back to the agent as a message it can act on.
//!
//! The tree round-trips through a flat [`Snapshot`](vfs::Snapshot) so a
//! [`Session`](agent::Session) can be stored in a
//! [`ProjectStore`](project::ProjectStore) and resumed later.

pub mod agent;
pub mod model;
pub mod project;
pub mod tools;
pub mod vfs;

pub use agent::{Message, Session, SessionError, TurnObserver, TurnOutcome};
pub use model::{
    FinishReason, LanguageModel, MockLanguageModel, ModelError, ModelEvent, ProviderConfig,
    ScriptedLanguageModel, ToolCall, select_model,
};
pub use project::{
    FileProjectStore, InMemoryProjectStore, PersistError, ProjectKey, ProjectRecord, ProjectStore,
};
pub use tools::{ToolDefinition, ToolResponse, dispatch, tool_definitions};
pub use vfs::{CanonicalPath, NodeStore, Snapshot, VfsError, normalize};
