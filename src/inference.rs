//! Inference client: the transport seam to the remote extraction service
//!
//! Defines the client trait and response types for invoking a named
//! extraction task. Two implementations:
//! - `SubprocessClient`: spawns a configured command per call, input on stdin (production)
//! - `MockClient`: returns preconfigured responses and records calls (testing)
//!
//! The pipeline never looks past this trait: every extraction task is just a
//! task name plus a JSON payload, and whatever comes back is validated by the
//! task itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Result of invoking a remote extraction task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeResponse {
    /// Per-agent results, in pipeline order
    pub results: Vec<AgentResult>,
    /// Overall execution status
    pub status: String,
    /// Execution metadata (timing, usage)
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl InvokeResponse {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }

    pub fn is_failed(&self) -> bool {
        self.status == "failed"
    }

    pub fn has_errors(&self) -> bool {
        self.status == "completed_with_errors"
    }

    /// Response text of the last agent that produced one.
    ///
    /// Convention: the last agent in the pipeline produces the structured output.
    pub fn final_text(&self) -> Option<&str> {
        self.results
            .iter()
            .filter_map(|r| r.response.as_deref())
            .filter(|text| !text.trim().is_empty())
            .last()
    }

    /// First agent-level error message, if any agent reported one.
    pub fn first_agent_error(&self) -> Option<&str> {
        self.results.iter().find_map(|r| r.error.as_deref())
    }
}

/// Result from a single agent in a task pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    /// Agent name
    #[serde(default)]
    pub agent: String,
    /// The agent's response text or JSON
    #[serde(default)]
    pub response: Option<String>,
    /// Agent status
    #[serde(default)]
    pub status: Option<String>,
    /// Error message if the agent failed
    #[serde(default)]
    pub error: Option<String>,
}

impl AgentResult {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

/// Errors from inference client operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InferenceError {
    #[error("inference service not available: {0}")]
    Unavailable(String),
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("invocation failed: {0}")]
    InvocationFailed(String),
    #[error("response parse error: {0}")]
    ParseError(String),
}

/// Client trait for invoking remote extraction tasks.
///
/// Abstracts over transport (subprocess, HTTP, mock) so extraction tasks
/// don't depend on how the inference service is reached.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Check if the inference service is reachable.
    async fn is_available(&self) -> bool;

    /// Invoke a task with a JSON input payload.
    async fn invoke(&self, task_name: &str, input_json: &str)
        -> Result<InvokeResponse, InferenceError>;
}

/// Extract a JSON value from model response text.
///
/// Models sometimes wrap JSON in markdown code fences or add explanation text.
/// Tries, in order:
/// 1. Direct parse (response is pure JSON)
/// 2. Extract from ```json ... ``` or ``` ... ``` fenced block
/// 3. Find the first `{` to last `}` span and parse that
///
/// A bare `null` parses as `Value::Null` so callers can tell "no output"
/// apart from "unparseable output".
pub fn extract_json(text: &str) -> Option<serde_json::Value> {
    let trimmed = text.trim();

    if let Ok(v) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if v.is_object() || v.is_null() {
            return Some(v);
        }
    }

    let fenced = if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        after.find("```").map(|end| &after[..end])
    } else if let Some(start) = trimmed.find("```\n") {
        let after = &trimmed[start + 4..];
        after.find("```").map(|end| &after[..end])
    } else {
        None
    };

    if let Some(block) = fenced {
        if let Ok(v) = serde_json::from_str::<serde_json::Value>(block.trim()) {
            if v.is_object() {
                return Some(v);
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(v) = serde_json::from_str::<serde_json::Value>(&trimmed[start..=end]) {
                if v.is_object() {
                    return Some(v);
                }
            }
        }
    }

    None
}

/// Wrap plain text as a completed single-agent response.
pub fn text_response(agent: &str, text: impl Into<String>) -> InvokeResponse {
    InvokeResponse {
        results: vec![AgentResult {
            agent: agent.to_string(),
            response: Some(text.into()),
            status: Some("success".to_string()),
            error: None,
        }],
        status: "completed".to_string(),
        metadata: serde_json::Value::Null,
    }
}

/// Helper to construct an InvokeResponse whose final agent returns `body` as JSON text.
pub fn json_response(body: &serde_json::Value) -> InvokeResponse {
    text_response("extractor", body.to_string())
}

// ---------------------------------------------------------------------------
// SubprocessClient
// ---------------------------------------------------------------------------

/// Placeholder substituted with the task name in subprocess arguments.
pub const TASK_PLACEHOLDER: &str = "{task}";

/// Production client: runs one process per invocation.
///
/// The input JSON is written to stdin. Stdout is parsed as an `InvokeResponse`
/// when it has that shape, otherwise it is treated as the raw text of a single
/// agent.
pub struct SubprocessClient {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl SubprocessClient {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn args_for(&self, task_name: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace(TASK_PLACEHOLDER, task_name))
            .collect()
    }

    fn parse_stdout(stdout: &str) -> InvokeResponse {
        match serde_json::from_str::<InvokeResponse>(stdout.trim()) {
            Ok(response) => response,
            Err(_) => text_response("stdout", stdout),
        }
    }
}

#[async_trait]
impl InferenceClient for SubprocessClient {
    async fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn invoke(
        &self,
        task_name: &str,
        input_json: &str,
    ) -> Result<InvokeResponse, InferenceError> {
        let mut command = Command::new(&self.program);
        command
            .args(self.args_for(task_name))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            InferenceError::Unavailable(format!("failed to start {}: {}", self.program, e))
        })?;

        // Stdin is written while stdout and stderr drain. A child that closes
        // its stdin early is judged by its exit status.
        let stdin = child.stdin.take();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(input_json.as_bytes()).await {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            }
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        let output =
            output.map_err(|e| InferenceError::InvocationFailed(format!("wait: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InferenceError::InvocationFailed(format!(
                "task '{}' exited with {}: {}",
                task_name,
                output.status,
                stderr.trim()
            )));
        }

        fed.map_err(|e| InferenceError::InvocationFailed(format!("stdin write: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Self::parse_stdout(&stdout))
    }
}

// ---------------------------------------------------------------------------
// MockClient
// ---------------------------------------------------------------------------

/// A single recorded invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub task_name: String,
    pub input_json: String,
}

/// Mock client for testing. Returns preconfigured responses.
pub struct MockClient {
    available: bool,
    responses: HashMap<String, Result<InvokeResponse, InferenceError>>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<Invocation>>,
}

impl MockClient {
    /// Create a mock client that reports as available.
    pub fn available() -> Self {
        Self {
            available: true,
            responses: HashMap::new(),
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock client that reports as unavailable.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::available()
        }
    }

    /// Register a response for a specific task name.
    pub fn with_response(mut self, task_name: impl Into<String>, response: InvokeResponse) -> Self {
        self.responses.insert(task_name.into(), Ok(response));
        self
    }

    /// Register a JSON body the task's final agent returns.
    pub fn with_json(self, task_name: impl Into<String>, body: serde_json::Value) -> Self {
        self.with_response(task_name, json_response(&body))
    }

    /// Register raw response text for a task.
    pub fn with_text(self, task_name: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_response(task_name, text_response("extractor", text))
    }

    /// Register a failure for a specific task name.
    pub fn with_failure(mut self, task_name: impl Into<String>, error: InferenceError) -> Self {
        self.responses.insert(task_name.into(), Err(error));
        self
    }

    /// Delay the reply for a task, to reorder completion in tests.
    pub fn with_delay(mut self, task_name: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(task_name.into(), delay);
        self
    }

    /// All invocations received so far, in arrival order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of invocations of one task.
    pub fn call_count(&self, task_name: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.task_name == task_name)
            .count()
    }
}

#[async_trait]
impl InferenceClient for MockClient {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn invoke(
        &self,
        task_name: &str,
        input_json: &str,
    ) -> Result<InvokeResponse, InferenceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Invocation {
                task_name: task_name.to_string(),
                input_json: input_json.to_string(),
            });
        }

        if let Some(delay) = self.delays.get(task_name) {
            tokio::time::sleep(*delay).await;
        }

        if !self.available {
            return Err(InferenceError::Unavailable(
                "mock client configured as unavailable".to_string(),
            ));
        }

        match self.responses.get(task_name) {
            Some(result) => result.clone(),
            None => Err(InferenceError::TaskNotFound(format!(
                "no mock response for task '{}'",
                task_name
            ))),
        }
    }
}
