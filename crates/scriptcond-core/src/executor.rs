//! Script execution capability.
//!
//! The condition never embeds an engine. Anything that can run a script
//! against JSON keys and data implements [`ScriptExecutor`] and is handed to
//! the condition at construction. Implementations are expected to be
//! deterministic for fixed inputs; validation depends on it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ConditionError, ExecutionError};

/// Engine that runs a script against JSON keys and data.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    /// Executes `script` with `keys` and `data` given as JSON text.
    async fn execute(
        &self,
        script: &str,
        keys: &str,
        data: &str,
    ) -> Result<ScriptOutput, ExecutionError>;
}

/// Logs as reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptLogs {
    /// One entry per log line.
    Lines(Vec<String>),
    /// JSON text, or free text when the engine does not emit JSON.
    Text(String),
}

impl ScriptLogs {
    /// Logs as a JSON value. Non-JSON text becomes a JSON string.
    pub fn to_value(&self) -> Value {
        match self {
            ScriptLogs::Lines(lines) => {
                Value::Array(lines.iter().cloned().map(Value::String).collect())
            }
            ScriptLogs::Text(text) if text.trim().is_empty() => Value::Array(Vec::new()),
            ScriptLogs::Text(text) => serde_json::from_str(text)
                .unwrap_or_else(|_| Value::String(text.clone())),
        }
    }
}

impl Default for ScriptLogs {
    fn default() -> Self {
        ScriptLogs::Lines(Vec::new())
    }
}

/// Raw engine output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptOutput {
    /// Result as JSON text.
    pub result: String,
    /// Engine logs.
    #[serde(default)]
    pub logs: ScriptLogs,
}

impl ScriptOutput {
    /// Builds an output from a result value and log lines.
    pub fn from_value(result: &Value, logs: Vec<String>) -> Self {
        Self {
            result: result.to_string(),
            logs: ScriptLogs::Lines(logs),
        }
    }

    /// Parses the result text into an [`ExecutionResult`].
    pub fn into_execution(self) -> Result<ExecutionResult, ConditionError> {
        let result = serde_json::from_str(&self.result)
            .map_err(|err| ConditionError::parse("script result is not JSON", err))?;
        Ok(ExecutionResult {
            result,
            logs: self.logs.to_value(),
        })
    }
}

/// Parsed execution outcome folded into a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Script result.
    pub result: Value,
    /// Script logs.
    pub logs: Value,
}
