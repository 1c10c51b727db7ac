//! YAML configuration
//!
//! Every section is optional; a missing file section falls back to defaults.
//!
//! ```yaml
//! inference:
//!   program: llm-orc
//!   args: ["invoke", "{task}", "--input", "-", "--output-format", "json"]
//!   working_dir: /path/to/ensembles
//! tasks:
//!   topic_summary: my-summary-ensemble
//! quiz:
//!   default_count: 5
//! storage:
//!   db_path: /var/lib/studyforge/notes.db
//! ```

use crate::analysis::DEFAULT_QUIZ_COUNT;
use crate::inference::{InferenceClient, SubprocessClient};
use crate::tasks::TaskKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub inference: InferenceConfig,
    pub tasks: TaskNames,
    pub quiz: QuizConfig,
    pub storage: StorageConfig,
}

/// How to reach the inference service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub program: String,
    /// Arguments; `{task}` is replaced by the remote task name
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            program: "llm-orc".to_string(),
            args: ["invoke", "{task}", "--input", "-", "--output-format", "json"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            working_dir: None,
        }
    }
}

/// Remote task name overrides. Unset entries use the kind's own name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskNames {
    pub topic_summary: Option<String>,
    pub code_analysis: Option<String>,
    pub study_notes: Option<String>,
    pub quiz_topics: Option<String>,
    pub concept_map: Option<String>,
}

impl TaskNames {
    pub fn name_for(&self, kind: TaskKind) -> String {
        let configured = match kind {
            TaskKind::TopicSummary => &self.topic_summary,
            TaskKind::CodeAnalysis => &self.code_analysis,
            TaskKind::StudyNotes => &self.study_notes,
            TaskKind::QuizTopics => &self.quiz_topics,
            TaskKind::ConceptMap => &self.concept_map,
        };
        configured
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(kind.as_str())
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    pub default_count: u32,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            default_count: DEFAULT_QUIZ_COUNT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: Option<PathBuf>,
}

impl Config {
    /// Load from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Load from `path` if given, otherwise defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Configured database path, or the per-user default
    pub fn db_path(&self) -> PathBuf {
        self.storage.db_path.clone().unwrap_or_else(default_db_path)
    }

    /// Build the subprocess client described by the `inference` section
    pub fn build_client(&self) -> Arc<dyn InferenceClient> {
        let mut client =
            SubprocessClient::new(self.inference.program.clone(), self.inference.args.clone());
        if let Some(dir) = &self.inference.working_dir {
            client = client.with_working_dir(dir.clone());
        }
        Arc::new(client)
    }
}

/// Default database path (~/.local/share/studyforge/notes.db)
pub fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("studyforge").join("notes.db")
}
