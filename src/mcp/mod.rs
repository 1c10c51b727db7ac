//! MCP server for StudyForge: exposes conversation analysis, quiz
//! generation and study-notes storage via the Model Context Protocol.
//!
//! Tools: process_conversation, generate_quiz_topics, save_notes, list_notes.

pub mod params;

use params::*;
use crate::api::StudyForgeApi;
use crate::config::Config;
use crate::events::TracingSink;
use crate::storage::{OpenStore, SqliteNotesStore};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Notes returned by `list_notes` when no limit is given
pub const DEFAULT_LIST_LIMIT: usize = 20;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ok_text(text: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn err_text(msg: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg)]))
}

fn ok_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(text) => ok_text(text),
        Err(e) => err_text(format!("failed to encode result: {}", e)),
    }
}

// ---------------------------------------------------------------------------
// StudyForgeMcpServer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct StudyForgeMcpServer {
    api: StudyForgeApi,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl StudyForgeMcpServer {
    pub fn new(api: StudyForgeApi) -> Self {
        Self {
            api,
            tool_router: Self::tool_router(),
        }
    }

    // ── Analysis tools ──────────────────────────────────────────────────

    #[tool(
        description = "Analyze a learning conversation: topic summary, code analysis, study notes and concept map"
    )]
    async fn process_conversation(
        &self,
        Parameters(p): Parameters<ProcessConversationParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.process_conversation(&p.conversation_text).await {
            Ok(aggregate) => ok_json(&aggregate),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "Generate quiz topics from a conversation")]
    async fn generate_quiz_topics(
        &self,
        Parameters(p): Parameters<GenerateQuizTopicsParams>,
    ) -> Result<CallToolResult, McpError> {
        match self
            .api
            .generate_quiz_topics(&p.conversation_text, p.count)
            .await
        {
            Ok(result) => ok_json(&result),
            Err(e) => err_text(e.to_string()),
        }
    }

    // ── Notes tools ─────────────────────────────────────────────────────

    #[tool(description = "Save study notes under a topic name; blank notes are skipped")]
    async fn save_notes(
        &self,
        Parameters(p): Parameters<SaveNotesParams>,
    ) -> Result<CallToolResult, McpError> {
        let topic_name = p.topic_name.unwrap_or_default();
        match self
            .api
            .save_notes(&topic_name, p.content.as_deref())
            .await
        {
            Ok(outcome) => ok_json(&outcome),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "List saved study notes, most recent first")]
    async fn list_notes(
        &self,
        Parameters(p): Parameters<ListNotesParams>,
    ) -> Result<CallToolResult, McpError> {
        match self
            .api
            .list_notes(p.limit.unwrap_or(DEFAULT_LIST_LIMIT))
            .await
        {
            Ok(notes) => ok_json(&notes),
            Err(e) => err_text(e.to_string()),
        }
    }
}

#[tool_handler]
impl ServerHandler for StudyForgeMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "StudyForge MCP server: turns learning conversations into summaries, study notes, concept maps and quiz topics"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run_mcp_server(config: Config, db_path: &Path) -> i32 {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    rt.block_on(async {
        let store = match SqliteNotesStore::open(db_path) {
            Ok(s) => Arc::new(s),
            Err(e) => {
                eprintln!("failed to open database at {}: {}", db_path.display(), e);
                return 1;
            }
        };

        let api = StudyForgeApi::new(config.build_client(), store, Arc::new(TracingSink), &config);
        if !api.inference_available().await {
            tracing::warn!(
                program = %config.inference.program,
                "inference service not available, analysis tools will report failures"
            );
        }

        let server = StudyForgeMcpServer::new(api);

        tracing::info!(db = %db_path.display(), "studyforge mcp server starting on stdio");

        let service = match server.serve(rmcp::transport::stdio()).await {
            Ok(s) => s,
            Err(e) => {
                eprintln!("failed to start MCP server: {}", e);
                return 1;
            }
        };

        if let Err(e) = service.waiting().await {
            eprintln!("MCP server error: {}", e);
            return 1;
        }

        0
    })
}
