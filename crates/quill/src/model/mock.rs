//! Deterministic offline model.
//!
//! The mock builds one React component in three tool-calling steps and then
//! stops. Which step comes next depends only on how many tool results the
//! log holds since the latest user message:
//!
//! ```text
//! 0 results  AwaitingCreate       create /components/<Name>.jsx
//! 1 result   AwaitingEnhance      str_replace inside the component
//! 2 results  AwaitingAppAssembly  create /App.jsx rendering the component
//! 3+         Done                 summary text, finish with Stop
//! ```

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use tracing::debug;

use super::{
    EventStream, FinishReason, LanguageModel, ModelError, ModelEvent, ToolCall, Usage, word_chunks,
};
use crate::agent::Message;
use crate::tools::EDITOR_TOOL;

/// Position of the mock in its fixed step sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockStep {
    /// Create the component file.
    AwaitingCreate,
    /// Edit the component in place.
    AwaitingEnhance,
    /// Create the entry point that renders the component.
    AwaitingAppAssembly,
    /// Nothing left to do.
    Done,
}

impl MockStep {
    /// The step that follows `tool_results` tool results since the latest user message.
    pub fn from_tool_results(tool_results: usize) -> Self {
        let mut step = MockStep::AwaitingCreate;
        for _ in 0..tool_results {
            if step == MockStep::Done {
                break;
            }
            step = step.next();
        }
        step
    }

    /// The step after this one.
    pub fn next(self) -> Self {
        match self {
            MockStep::AwaitingCreate => MockStep::AwaitingEnhance,
            MockStep::AwaitingEnhance => MockStep::AwaitingAppAssembly,
            MockStep::AwaitingAppAssembly | MockStep::Done => MockStep::Done,
        }
    }
}

/// The component the mock builds, chosen from the user's prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// A counter with increment, decrement and reset buttons.
    Counter,
    /// A contact form.
    ContactForm,
    /// A content card.
    Card,
}

impl ComponentKind {
    /// Pick the component for a prompt: "form" wins over "card", counter otherwise.
    pub fn from_prompt(prompt: &str) -> Self {
        let prompt = prompt.to_lowercase();
        if prompt.contains("form") {
            ComponentKind::ContactForm
        } else if prompt.contains("card") {
            ComponentKind::Card
        } else {
            ComponentKind::Counter
        }
    }

    /// Component name, also used as its file stem.
    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Counter => "Counter",
            ComponentKind::ContactForm => "ContactForm",
            ComponentKind::Card => "Card",
        }
    }

    /// Path of the component file.
    pub fn path(self) -> String {
        format!("/components/{}.jsx", self.name())
    }

    fn source(self) -> &'static str {
        match self {
            ComponentKind::Counter => COUNTER_SOURCE,
            ComponentKind::ContactForm => CONTACT_FORM_SOURCE,
            ComponentKind::Card => CARD_SOURCE,
        }
    }

    /// The `(old_str, new_str)` pair used by the enhance step.
    fn enhancement(self) -> (&'static str, &'static str) {
        match self {
            ComponentKind::Counter => (
                "const [count, setCount] = useState(0);",
                "const [count, setCount] = useState(0); // Enhanced counter",
            ),
            ComponentKind::ContactForm => (
                "console.log('Submitted:', formData);",
                "console.log('Submitted:', formData);\n    alert('Thank you for your message!');",
            ),
            ComponentKind::Card => (
                "<p className=\"text-gray-600\">{description}</p>",
                "<p className=\"text-gray-600\">{description}</p>\n      \
                 <button className=\"mt-4 px-4 py-2 bg-blue-500 text-white rounded hover:bg-blue-600\">\n        \
                 Learn more\n      </button>",
            ),
        }
    }

    fn app_source(self) -> String {
        let name = self.name();
        format!(
            "import {name} from './components/{name}';\n\
             \n\
             export default function App() {{\n  \
             return (\n    \
             <div className=\"min-h-screen bg-gray-100 flex items-center justify-center p-8\">\n      \
             <{name} />\n    \
             </div>\n  \
             );\n\
             }}"
        )
    }
}

const STEP_USAGE: Usage = Usage {
    prompt_tokens: 50,
    completion_tokens: 30,
};

const DONE_USAGE: Usage = Usage {
    prompt_tokens: 50,
    completion_tokens: 50,
};

/// The fully determined content of one mock turn.
///
/// A turn is plain data; [`MockTurn::events`] can be called any number of
/// times and always yields the same finite sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct MockTurn {
    step: MockStep,
    text: String,
    tool_call: Option<ToolCall>,
    reason: FinishReason,
    usage: Usage,
}

impl MockTurn {
    /// Build the turn for `step`. `call_id` is used if the step calls a tool.
    pub fn new(step: MockStep, component: ComponentKind, call_id: impl Into<String>) -> Self {
        let name = component.name();
        let call = |arguments: serde_json::Value| ToolCall {
            id: call_id.into(),
            name: EDITOR_TOOL.to_string(),
            arguments,
        };

        let (text, tool_call) = match step {
            MockStep::AwaitingCreate => (
                format!(
                    "This is a static response from the offline model. \
                     I'll create a {name} component for you."
                ),
                Some(call(json!({
                    "command": "create",
                    "path": component.path(),
                    "file_text": component.source(),
                }))),
            ),
            MockStep::AwaitingEnhance => {
                let (old_str, new_str) = component.enhancement();
                (
                    format!("Enhancing the {name} component..."),
                    Some(call(json!({
                        "command": "str_replace",
                        "path": component.path(),
                        "old_str": old_str,
                        "new_str": new_str,
                    }))),
                )
            }
            MockStep::AwaitingAppAssembly => (
                format!("Creating App.jsx to render {name}..."),
                Some(call(json!({
                    "command": "create",
                    "path": "/App.jsx",
                    "file_text": component.app_source(),
                }))),
            ),
            MockStep::Done => (
                format!("Done! Created {name}.jsx and App.jsx."),
                None,
            ),
        };

        let (reason, usage) = if tool_call.is_some() {
            (FinishReason::ToolCalls, STEP_USAGE)
        } else {
            (FinishReason::Stop, DONE_USAGE)
        };

        Self {
            step,
            text,
            tool_call,
            reason,
            usage,
        }
    }

    /// The step this turn performs.
    pub fn step(&self) -> MockStep {
        self.step
    }

    /// Full assistant text of the turn.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The tool call of the turn, if any.
    pub fn tool_call(&self) -> Option<&ToolCall> {
        self.tool_call.as_ref()
    }

    /// Consume the turn into its events: text chunks, at most one tool call,
    /// then `Finish`. Clone the turn first to replay it.
    pub fn into_events(self) -> impl Iterator<Item = ModelEvent> + Send + 'static {
        let finish = ModelEvent::Finish {
            reason: self.reason,
            usage: self.usage,
        };
        word_chunks(&self.text)
            .into_iter()
            .map(ModelEvent::text)
            .chain(self.tool_call.map(ModelEvent::ToolCall))
            .chain(std::iter::once(finish))
    }
}

/// Offline model that walks the [`MockStep`] sequence.
#[derive(Debug, Clone)]
pub struct MockLanguageModel {
    model_id: String,
}

impl Default for MockLanguageModel {
    fn default() -> Self {
        Self::new("mock")
    }
}

impl MockLanguageModel {
    /// Create a mock reporting `model_id` in logs.
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
        }
    }

    /// Determine the turn the mock produces for `prompt`.
    pub fn plan(&self, prompt: &[Message]) -> MockTurn {
        let latest_user = prompt
            .iter()
            .rposition(|m| matches!(m, Message::User { .. }));
        let user_prompt = latest_user
            .and_then(|i| prompt[i].text())
            .unwrap_or_default();
        let since_user = latest_user.map_or(prompt, |i| &prompt[i + 1..]);

        let results = since_user
            .iter()
            .filter(|m| matches!(m, Message::Tool { .. }))
            .count();
        let total_results = prompt
            .iter()
            .filter(|m| matches!(m, Message::Tool { .. }))
            .count();

        let step = MockStep::from_tool_results(results);
        let component = ComponentKind::from_prompt(user_prompt);
        MockTurn::new(step, component, format!("call_{}", total_results + 1))
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, prompt: &[Message]) -> Result<EventStream, ModelError> {
        let turn = self.plan(prompt);
        debug!(model = %self.model_id, step = ?turn.step(), "mock turn");
        Ok(futures::stream::iter(turn.into_events().map(Ok)).boxed())
    }
}

const COUNTER_SOURCE: &str = r#"import { useState } from 'react';

const Counter = () => {
  const [count, setCount] = useState(0);

  return (
    <div className="flex flex-col items-center p-6 bg-white rounded-lg shadow-md">
      <h2 className="text-2xl font-bold mb-4">Counter</h2>
      <div className="text-4xl font-bold mb-6">{count}</div>
      <div className="flex gap-4">
        <button onClick={() => setCount(count - 1)} className="px-4 py-2 bg-red-500 text-white rounded hover:bg-red-600">
          -
        </button>
        <button onClick={() => setCount(0)} className="px-4 py-2 bg-gray-500 text-white rounded hover:bg-gray-600">
          Reset
        </button>
        <button onClick={() => setCount(count + 1)} className="px-4 py-2 bg-green-500 text-white rounded hover:bg-green-600">
          +
        </button>
      </div>
    </div>
  );
};

export default Counter;"#;

const CONTACT_FORM_SOURCE: &str = r#"import React, { useState } from 'react';

const ContactForm = () => {
  const [formData, setFormData] = useState({ name: '', email: '', message: '' });

  const handleSubmit = (e) => {
    e.preventDefault();
    console.log('Submitted:', formData);
  };

  return (
    <div className="max-w-md mx-auto p-6 bg-white rounded-lg shadow-md">
      <h2 className="text-2xl font-bold mb-6">Contact Us</h2>
      <form onSubmit={handleSubmit} className="space-y-4">
        <input type="text" placeholder="Name" className="w-full px-3 py-2 border rounded-md" />
        <input type="email" placeholder="Email" className="w-full px-3 py-2 border rounded-md" />
        <textarea placeholder="Message" rows={4} className="w-full px-3 py-2 border rounded-md" />
        <button type="submit" className="w-full bg-blue-500 text-white py-2 rounded-md hover:bg-blue-600">
          Send Message
        </button>
      </form>
    </div>
  );
};

export default ContactForm;"#;

const CARD_SOURCE: &str = r#"const Card = ({ title = 'Card Title', description = 'A short description of the card.' }) => {
  return (
    <div className="max-w-sm p-6 bg-white rounded-lg shadow-md">
      <h3 className="text-xl font-semibold mb-2">{title}</h3>
      <p className="text-gray-600">{description}</p>
    </div>
  );
};

export default Card;"#;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures::TryStreamExt;

    use super::*;
    use crate::tools::{ToolResponse, dispatch};
    use crate::vfs::NodeStore;

    fn tool_message(id: &str) -> Message {
        Message::tool(id, EDITOR_TOOL, ToolResponse::success(json!({})))
    }

    #[test]
    fn test_component_from_prompt() {
        assert_eq!(
            ComponentKind::from_prompt("Build a contact FORM"),
            ComponentKind::ContactForm
        );
        assert_eq!(
            ComponentKind::from_prompt("a pricing card"),
            ComponentKind::Card
        );
        assert_eq!(
            ComponentKind::from_prompt("a form inside a card"),
            ComponentKind::ContactForm
        );
        assert_eq!(ComponentKind::from_prompt("anything"), ComponentKind::Counter);
    }

    #[test]
    fn test_step_sequence() {
        assert_eq!(MockStep::from_tool_results(0), MockStep::AwaitingCreate);
        assert_eq!(MockStep::from_tool_results(1), MockStep::AwaitingEnhance);
        assert_eq!(MockStep::from_tool_results(2), MockStep::AwaitingAppAssembly);
        assert_eq!(MockStep::from_tool_results(7), MockStep::Done);
        assert_eq!(MockStep::AwaitingCreate.next(), MockStep::AwaitingEnhance);
        assert_eq!(MockStep::Done.next(), MockStep::Done);
    }

    #[test]
    fn test_plan_counts_results_since_latest_user_message() {
        let model = MockLanguageModel::default();
        let mut prompt = vec![Message::user("make a card")];
        assert_eq!(model.plan(&prompt).step(), MockStep::AwaitingCreate);

        prompt.push(tool_message("call_1"));
        prompt.push(tool_message("call_2"));
        let turn = model.plan(&prompt);
        assert_eq!(turn.step(), MockStep::AwaitingAppAssembly);
        assert_eq!(turn.tool_call().unwrap().id, "call_3");

        prompt.push(Message::user("now a form"));
        let turn = model.plan(&prompt);
        assert_eq!(turn.step(), MockStep::AwaitingCreate);
        assert_eq!(turn.tool_call().unwrap().id, "call_3");
        assert_eq!(
            turn.tool_call().unwrap().arguments["path"],
            "/components/ContactForm.jsx"
        );
    }

    #[test]
    fn test_turn_events_are_restartable() {
        let turn = MockTurn::new(MockStep::AwaitingCreate, ComponentKind::Counter, "call_1");
        let first: Vec<_> = turn.clone().into_events().collect();
        let second: Vec<_> = turn.clone().into_events().collect();
        assert_eq!(first, second);

        let finishes = first
            .iter()
            .filter(|e| matches!(e, ModelEvent::Finish { .. }))
            .count();
        assert_eq!(finishes, 1);
        assert!(matches!(
            first.last(),
            Some(ModelEvent::Finish {
                reason: FinishReason::ToolCalls,
                ..
            })
        ));

        let text: String = first
            .iter()
            .filter_map(|e| match e {
                ModelEvent::TextChunk { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, turn.text());
    }

    #[test]
    fn test_done_turn_stops() {
        let turn = MockTurn::new(MockStep::Done, ComponentKind::Card, "unused");
        assert!(turn.tool_call().is_none());
        assert_eq!(
            turn.into_events().last(),
            Some(ModelEvent::Finish {
                reason: FinishReason::Stop,
                usage: DONE_USAGE
            })
        );
    }

    #[test]
    fn test_enhancement_applies_to_every_component() {
        for component in [
            ComponentKind::Counter,
            ComponentKind::ContactForm,
            ComponentKind::Card,
        ] {
            let mut store = NodeStore::new();
            for step in [
                MockStep::AwaitingCreate,
                MockStep::AwaitingEnhance,
                MockStep::AwaitingAppAssembly,
            ] {
                let turn = MockTurn::new(step, component, "id");
                let call = turn.tool_call().unwrap();
                let response = dispatch(&mut store, &call.name, call.arguments.clone());
                assert!(response.success, "{component:?} {step:?}: {response:?}");
            }
            let app = store.get("/App.jsx").unwrap().content().unwrap();
            assert!(app.contains(&format!("<{} />", component.name())));
        }
    }

    #[tokio::test]
    async fn test_generate_streams_turn() {
        let model = MockLanguageModel::new("mock-test");
        let events: Vec<ModelEvent> = model
            .generate(&[Message::user("counter please")])
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        let call = events
            .iter()
            .find_map(|e| match e {
                ModelEvent::ToolCall(call) => Some(call),
                _ => None,
            })
            .unwrap();
        assert_eq!(call.arguments["command"], "create");
        assert_eq!(call.arguments["path"], "/components/Counter.jsx");
        assert_eq!(model.model_id(), "mock-test");
    }
}
