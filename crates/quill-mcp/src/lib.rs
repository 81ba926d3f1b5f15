//! Quill MCP Server
//!
//! An MCP server that exposes the two Quill editing tools,
//! `str_replace_editor` and `file_manager`, over one project's virtual
//! filesystem. Every call returns the command's result envelope as JSON text;
//! failed commands are reported with `isError` set so the client can correct
//! its next call.

use std::sync::Arc;

use quill::agent::{Session, SessionError};
use quill::project::ProjectStore;
use quill::tools::{EDITOR_TOOL, FILE_MANAGER_TOOL, ToolDefinition, dispatch, tool_definitions};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::*,
    service::{RequestContext, RoleServer},
};
use tokio::sync::Mutex;
use tracing::debug;

/// MCP server editing a single session's filesystem.
///
/// Clones share the same session, so a handle kept by the caller sees every
/// edit made through the server.
#[derive(Clone)]
pub struct QuillServer {
    session: Arc<Mutex<Session>>,
}

impl std::fmt::Debug for QuillServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuillServer").finish_non_exhaustive()
    }
}

impl QuillServer {
    /// Serve `session`.
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// The shared session.
    pub fn session(&self) -> &Arc<Mutex<Session>> {
        &self.session
    }

    /// Persist the session's current state.
    pub async fn persist(&self, projects: &dyn ProjectStore) -> Result<(), SessionError> {
        self.session.lock().await.persist(projects).await
    }

    /// Run one tool call and wrap its envelope for MCP.
    pub async fn run_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult, McpError> {
        if name != EDITOR_TOOL && name != FILE_MANAGER_TOOL {
            return Err(McpError::invalid_params(
                format!("Unknown tool: {name}"),
                None,
            ));
        }

        let response = {
            let mut session = self.session.lock().await;
            dispatch(session.store_mut(), name, arguments)
        };
        debug!(tool = name, success = response.success, "tool call handled");

        let text = serde_json::to_string_pretty(&response)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {e}"), None))?;
        let content = vec![Content::text(text)];
        if response.success {
            Ok(CallToolResult::success(content))
        } else {
            Ok(CallToolResult::error(content))
        }
    }
}

fn to_mcp_tool(definition: ToolDefinition) -> Tool {
    let input_schema = match definition.parameters {
        serde_json::Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    };
    let title = match definition.name.as_str() {
        EDITOR_TOOL => "Edit Files",
        _ => "Manage Files",
    };

    Tool {
        name: definition.name.into(),
        title: Some(title.into()),
        description: Some(definition.description.into()),
        input_schema,
        output_schema: None,
        annotations: None,
        icons: None,
        meta: None,
    }
}

impl ServerHandler for QuillServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Quill holds a project's source files in a virtual filesystem rooted at '/'. \
                Use 'str_replace_editor' to view, create and edit files and 'file_manager' to \
                rename or delete them. str_replace only succeeds when old_str matches exactly \
                once; add surrounding lines if it reports several matches."
                    .into(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: tool_definitions().into_iter().map(to_mcp_tool).collect(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = serde_json::Value::Object(request.arguments.unwrap_or_default());
        self.run_tool(request.name.as_ref(), arguments).await
    }
}
