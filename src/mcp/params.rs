//! MCP tool parameter structs with schemars-derived JSON schemas.

use schemars::JsonSchema;
use serde::Deserialize;

// ── Analysis params ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProcessConversationParams {
    #[schemars(description = "Full conversation transcript to analyze")]
    pub conversation_text: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateQuizTopicsParams {
    #[schemars(description = "Conversation transcript to draw quiz topics from")]
    pub conversation_text: String,
    #[schemars(description = "Number of topics to request (default 5)")]
    pub count: Option<u32>,
}

// ── Notes params ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SaveNotesParams {
    #[schemars(description = "Topic name (defaults to 'Untitled Analysis' when blank)")]
    pub topic_name: Option<String>,
    #[schemars(description = "Study notes text; blank text is skipped, not stored")]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListNotesParams {
    #[schemars(description = "Maximum number of notes to return (default 20)")]
    pub limit: Option<usize>,
}
