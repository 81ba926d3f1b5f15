//! Quill MCP Server
//!
//! This binary serves one Quill project over stdio. The project is loaded
//! from `--store` at startup (a missing project starts empty) and persisted
//! back once the client disconnects.

use std::path::PathBuf;

use clap::Parser;
use quill::agent::Session;
use quill::project::{FileProjectStore, ProjectKey};
use quill_mcp::QuillServer;
use rmcp::ServiceExt;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Quill MCP Server - exact-match file editing over a virtual filesystem
#[derive(Parser, Debug)]
#[command(name = "quill-mcp")]
#[command(about = "MCP server exposing the Quill editing tools over stdio")]
struct Args {
    /// Directory holding project records
    #[arg(long, default_value = ".quill")]
    store: PathBuf,

    /// Project to serve
    #[arg(long, default_value = "default")]
    project: String,

    /// User owning the project
    #[arg(long, default_value = "local")]
    user: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing - output to stderr so it doesn't interfere with MCP stdio
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();
    let projects = FileProjectStore::new(args.store);
    let key = ProjectKey::new(args.project, args.user);

    tracing::info!(
        project = %key.project_id,
        store = %projects.root().display(),
        "Starting Quill MCP server"
    );

    let session = Session::load(key, &projects).await?;
    let server = QuillServer::new(session);
    let handle = server.clone();

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("Failed to start MCP service: {}", e);
        })?;

    tracing::info!("Quill MCP server running");

    service.waiting().await?;

    handle.persist(&projects).await?;
    tracing::info!("Quill MCP server shutting down");

    Ok(())
}
