//! Drive a session with the offline mock model and print what it did.
//!
//! Run with: cargo run -p quill --example mock_session -- "build a pricing card"

use quill::agent::{Session, TurnObserver};
use quill::model::{ModelEvent, ToolCall};
use quill::project::{InMemoryProjectStore, ProjectKey};
use quill::tools::ToolResponse;
use quill::{MockLanguageModel, ProjectStore};

struct Printer;

impl TurnObserver for Printer {
    fn on_event(&mut self, event: &ModelEvent) {
        if let ModelEvent::TextChunk { text } = event {
            print!("{text}");
        }
    }

    fn on_tool_result(&mut self, call: &ToolCall, response: &ToolResponse) {
        let status = if response.success { "ok" } else { "failed" };
        println!("\n  [{}] {} -> {status}", call.name, call.arguments["command"]);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "build a counter".to_string());

    let projects = InMemoryProjectStore::new();
    let key = ProjectKey::new("example", "local");
    let mut session = Session::load(key.clone(), &projects).await?;

    let outcome = session
        .respond(&MockLanguageModel::default(), prompt, &mut Printer)
        .await?;
    println!(
        "\n\n=== {} steps, finished with {} ===",
        outcome.steps, outcome.finish_reason
    );

    println!("\n=== Tree ===\n{}", session.store().tree());

    session.persist(&projects).await?;
    let record = projects.load(&key).await?;
    println!(
        "=== Snapshot ===\n{}",
        serde_json::to_string_pretty(&record.snapshot)?
    );
    Ok(())
}
