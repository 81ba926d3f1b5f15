//! Quill CLI - drive an editing session from the terminal
//!
//! Usage:
//!   quill chat "build a contact form"           Let the model edit the project
//!   quill exec str_replace_editor '{"command":"view","path":"/App.jsx"}'
//!   quill tree | transcript | snapshot          Inspect the stored project
//!
//! Projects are stored as JSON files under `--store` (default `.quill`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quill::agent::{Session, TurnObserver};
use quill::model::{
    LanguageModel, ModelEvent, ProviderConfig, ScriptedLanguageModel, ToolCall, select_model,
};
use quill::project::{FileProjectStore, ProjectKey};
use quill::tools::ToolResponse;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Quill - virtual filesystem editing sessions
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(about = "Drive a Quill editing session from the terminal")]
struct Args {
    /// Directory holding project records
    #[arg(long, default_value = ".quill", global = true)]
    store: PathBuf,

    /// Project to open
    #[arg(long, default_value = "default", global = true)]
    project: String,

    /// User owning the project
    #[arg(long, default_value = "local", global = true)]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a prompt to the model and let it edit the project
    Chat {
        /// The user message
        prompt: String,

        /// Maximum model steps (defaults to QUILL_MAX_STEPS or 10)
        #[arg(long)]
        max_steps: Option<usize>,

        /// Replay a JSON script instead of calling a model
        #[arg(long)]
        script: Option<PathBuf>,
    },
    /// Run a single tool command and print its result envelope
    Exec {
        /// Tool name: str_replace_editor or file_manager
        tool: String,

        /// Tool arguments as JSON
        args: String,
    },
    /// Print the project's file tree
    Tree,
    /// Print the project's message log
    Transcript,
    /// Print the project's snapshot as JSON
    Snapshot,
}

/// Streams model text to stdout and reports each tool result.
struct ConsoleObserver;

impl TurnObserver for ConsoleObserver {
    fn on_event(&mut self, event: &ModelEvent) {
        if let ModelEvent::TextChunk { text } = event {
            print!("{text}");
        }
    }

    fn on_tool_result(&mut self, call: &ToolCall, response: &ToolResponse) {
        let command = call.arguments["command"].as_str().unwrap_or("?");
        let path = call.arguments["path"].as_str().unwrap_or("?");
        match &response.error {
            None => println!("\n  [{}] {command} {path}: ok", call.name),
            Some(error) => println!("\n  [{}] {command} {path}: {error}", call.name),
        }
    }
}

fn with_default_level(filter: EnvFilter) -> EnvFilter {
    filter.add_directive(tracing::Level::INFO.into())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so they never mix with command output
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(with_default_level(EnvFilter::from_default_env()))
        .init();

    let args = Args::parse();
    let projects = FileProjectStore::new(&args.store);
    let key = ProjectKey::new(args.project, args.user);
    let mut session = Session::load(key, &projects)
        .await
        .context("failed to open project")?;

    match args.command {
        Command::Chat {
            prompt,
            max_steps,
            script,
        } => {
            let config = ProviderConfig::from_env()?;
            let model: Arc<dyn LanguageModel> = match script {
                Some(path) => {
                    let json = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("failed to read script {}", path.display()))?;
                    Arc::new(ScriptedLanguageModel::from_json(&json)?)
                }
                None => select_model(&config, None),
            };

            let mut session = session.with_max_steps(max_steps.unwrap_or(config.max_steps));
            let outcome = session
                .respond(model.as_ref(), prompt, &mut ConsoleObserver)
                .await?;
            println!();
            if outcome.step_limit_reached {
                eprintln!(
                    "quill: stopped after {} steps; send another message to continue",
                    outcome.steps
                );
            }
            session.persist(&projects).await?;
        }
        Command::Exec { tool, args } => {
            let arguments: serde_json::Value =
                serde_json::from_str(&args).context("tool arguments must be JSON")?;
            let call = ToolCall {
                id: "cli".to_string(),
                name: tool,
                arguments,
            };
            let response = session.dispatch(&call);
            println!("{}", serde_json::to_string_pretty(&response)?);
            session.persist(&projects).await?;
            if !response.success {
                std::process::exit(1);
            }
        }
        Command::Tree => print!("{}", session.store().tree()),
        Command::Transcript => print!("{}", session.transcript()),
        Command::Snapshot => {
            println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
        }
    }

    Ok(())
}
