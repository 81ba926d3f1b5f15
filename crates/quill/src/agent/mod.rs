//! The agent loop: a [`Session`] owning the message log and the filesystem,
//! driven by a [`LanguageModel`](crate::model::LanguageModel).
//!
//! ```text
//! ProjectStore::load ──► Session::hydrate
//!                            │
//!          ┌─────────────────┤ respond(prompt)
//!          ▼                 │
//!   model.generate ──► TextChunk / ToolCall / Finish
//!          │                 │
//!          │        dispatch each ToolCall ──► NodeStore
//!          └──── ToolCalls ◄─┘
//!                            │
//! ProjectStore::persist ◄── Session::persist
//! ```

mod message;
mod session;

pub use message::{Message, transcript};
pub use session::{DEFAULT_SYSTEM_PROMPT, Session, SessionError, TurnObserver, TurnOutcome};
