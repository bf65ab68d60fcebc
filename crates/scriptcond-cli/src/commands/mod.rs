pub mod canonicalize;
pub mod fingerprint;
pub mod payload;
pub mod sign;
pub mod validate;

use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use scriptcond_canonical::{CanonicalizationError, ValidationError};
use scriptcond_core::{
    CommandExecutor, ConditionError, ConfigError, ScriptableCondition, ScriptcondConfig,
};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Condition(#[from] ConditionError),
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
    #[error("invalid fingerprint: {0}")]
    Fingerprint(#[from] ValidationError),
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("fingerprint mismatch: published {expected}, computed {computed}")]
    FingerprintMismatch { expected: String, computed: String },
}

pub type CliResult = Result<(), CliError>;

/// Loads the configuration file, or defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<ScriptcondConfig, CliError> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            Ok(ScriptcondConfig::from_file(path)?)
        }
        None => Ok(ScriptcondConfig::default()),
    }
}

/// Builds a condition from a descriptor file, wired to the configured engine.
pub fn load_condition(
    config: &ScriptcondConfig,
    path: &Path,
) -> Result<ScriptableCondition, CliError> {
    let descriptor = read_json(&path.display().to_string())?;
    let executor = Arc::new(CommandExecutor::new(config.executor.clone()));
    let mut condition = ScriptableCondition::with_config(executor, config.verification.clone());
    condition.apply_descriptor(&descriptor)?;
    Ok(condition)
}

/// Reads text from a file, or stdin for `-`.
pub fn read_text(source: &str) -> Result<String, CliError> {
    let result = if source == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).map(|_| buffer)
    } else {
        std::fs::read_to_string(source)
    };
    result.map_err(|e| CliError::Read {
        path: source_name(source),
        source: e,
    })
}

/// Reads and parses JSON from a file, or stdin for `-`.
pub fn read_json(source: &str) -> Result<Value, CliError> {
    let text = read_text(source)?;
    serde_json::from_str(&text).map_err(|e| CliError::Json {
        path: source_name(source),
        source: e,
    })
}

fn source_name(source: &str) -> String {
    if source == "-" {
        "stdin".to_string()
    } else {
        source.to_string()
    }
}
