//! Process-backed script executor.
//!
//! Script, data and keys are written to a temporary directory and handed to
//! the engine binary through its argument list. Stdout is the result text,
//! stderr lines are the logs.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::config::ExecutorConfig;
use crate::errors::ExecutionError;
use crate::executor::{ScriptExecutor, ScriptLogs, ScriptOutput};

const SCRIPT_FILE: &str = "script.zen";
const DATA_FILE: &str = "data.json";
const KEYS_FILE: &str = "keys.json";

/// Runs scripts through an external engine binary such as `zenroom`.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    config: ExecutorConfig,
}

impl CommandExecutor {
    /// Creates an executor from its configuration.
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Executor configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    fn expand_args(&self, dir: &Path) -> Vec<String> {
        let script = dir.join(SCRIPT_FILE);
        let data = dir.join(DATA_FILE);
        let keys = dir.join(KEYS_FILE);
        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{script}", &script.to_string_lossy())
                    .replace("{data}", &data.to_string_lossy())
                    .replace("{keys}", &keys.to_string_lossy())
            })
            .collect()
    }
}

#[async_trait]
impl ScriptExecutor for CommandExecutor {
    #[instrument(skip_all, fields(program = %self.config.program.display()))]
    async fn execute(
        &self,
        script: &str,
        keys: &str,
        data: &str,
    ) -> Result<ScriptOutput, ExecutionError> {
        let dir = tempfile::tempdir()
            .map_err(|e| ExecutionError::with_source("failed to create work directory", e))?;
        for (name, contents) in [(SCRIPT_FILE, script), (DATA_FILE, data), (KEYS_FILE, keys)] {
            tokio::fs::write(dir.path().join(name), contents)
                .await
                .map_err(|e| ExecutionError::with_source(format!("failed to write {name}"), e))?;
        }

        let args = self.expand_args(dir.path());
        debug!(?args, "spawning script engine");

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&args)
            .current_dir(dir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            ExecutionError::with_source(
                format!("failed to spawn {}", self.config.program.display()),
                e,
            )
        })?;

        let output = match self.config.timeout() {
            Some(limit) => timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| timed_out(limit))?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| ExecutionError::with_source("failed to collect engine output", e))?;

        let logs: Vec<String> = String::from_utf8_lossy(&output.stderr)
            .lines()
            .map(str::to_string)
            .collect();

        if !output.status.success() {
            warn!(status = %output.status, "script engine failed");
            let detail = logs
                .iter()
                .rev()
                .find(|line| !line.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| "no diagnostics".to_string());
            return Err(ExecutionError::new(format!(
                "engine exited with {}: {}",
                output.status, detail
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| ExecutionError::with_source("engine output is not UTF-8", e))?;
        info!(result_bytes = stdout.len(), log_lines = logs.len(), "script executed");
        Ok(ScriptOutput {
            result: stdout,
            logs: ScriptLogs::Lines(logs),
        })
    }
}

fn timed_out(limit: Duration) -> ExecutionError {
    warn!(timeout_ms = limit.as_millis() as u64, "script engine timed out");
    ExecutionError::new(format!("engine timed out after {}ms", limit.as_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[cfg(unix)]
    #[test]
    fn placeholders_expand_to_work_files() {
        let executor = CommandExecutor::new(ExecutorConfig::default());
        let args = executor.expand_args(Path::new("/work"));
        assert_eq!(
            args,
            vec![
                "-z",
                "/work/script.zen",
                "-a",
                "/work/data.json",
                "-k",
                "/work/keys.json"
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn literal_arguments_pass_through() {
        let executor = CommandExecutor::new(ExecutorConfig {
            program: PathBuf::from("sh"),
            args: vec!["-c".into(), "cat {data}".into()],
            timeout_ms: 0,
        });
        assert_eq!(
            executor.expand_args(Path::new("/w")),
            vec!["-c", "cat /w/data.json"]
        );
    }
}
