//! Configuration parsing.
//!
//! A TOML file selects the script engine and the result comparison strategy.
//! Every section is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use scriptcond_canonical::ProfileId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptcondConfig {
    /// Script engine settings.
    #[serde(default)]
    pub executor: ExecutorConfig,
    /// Verification settings.
    #[serde(default)]
    pub verification: ConditionConfig,
}

impl ScriptcondConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid, the executor program is
    /// empty, or the profile id does not match its pattern.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.executor.program.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "executor.program must not be empty".to_string(),
            ));
        }
        ProfileId::parse(self.verification.profile.to_string())
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        Ok(())
    }
}

/// Settings for the process-backed script engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Engine binary.
    #[serde(default = "default_program")]
    pub program: PathBuf,
    /// Arguments; `{script}`, `{data}` and `{keys}` are replaced by file paths.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Kill the engine after this many milliseconds. `0` disables the limit.
    #[serde(default)]
    pub timeout_ms: u64,
}

impl ExecutorConfig {
    /// Timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            timeout_ms: 0,
        }
    }
}

fn default_program() -> PathBuf {
    PathBuf::from("zenroom")
}

fn default_args() -> Vec<String> {
    ["-z", "{script}", "-a", "{data}", "-k", "{keys}"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

/// How a fresh result is compared with the recorded one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonStrategy {
    /// Compare RFC 8785 canonical bytes.
    #[default]
    Canonical,
    /// Compare parsed JSON values.
    Structural,
}

/// Verification settings resolved when a condition is constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionConfig {
    /// Result comparison strategy.
    #[serde(default)]
    pub comparison: ComparisonStrategy,
    /// Canonicalization profile stamped on canonical forms.
    #[serde(default)]
    pub profile: ProfileId,
}

impl Default for ConditionConfig {
    fn default() -> Self {
        Self {
            comparison: ComparisonStrategy::Canonical,
            profile: ProfileId::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error.
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error.
    #[error("validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ScriptcondConfig::from_toml("").unwrap();
        assert_eq!(config, ScriptcondConfig::default());
        assert_eq!(config.executor.program, PathBuf::from("zenroom"));
        assert_eq!(config.executor.timeout(), None);
        assert_eq!(
            config.verification.comparison,
            ComparisonStrategy::Canonical
        );
    }

    #[test]
    fn parses_all_sections() {
        let config = ScriptcondConfig::from_toml(
            r#"
            [executor]
            program = "/usr/local/bin/zenroom"
            args = ["-z", "{script}"]
            timeout_ms = 2500

            [verification]
            comparison = "structural"
            profile = "custom-profile-0001"
            "#,
        )
        .unwrap();
        assert_eq!(config.executor.args, vec!["-z", "{script}"]);
        assert_eq!(
            config.executor.timeout(),
            Some(Duration::from_millis(2500))
        );
        assert_eq!(
            config.verification.comparison,
            ComparisonStrategy::Structural
        );
        assert_eq!(config.verification.profile.as_ref(), "custom-profile-0001");
    }

    #[test]
    fn rejects_unknown_strategy_and_bad_profile() {
        assert!(matches!(
            ScriptcondConfig::from_toml("[verification]\ncomparison = \"native\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ScriptcondConfig::from_toml("[verification]\nprofile = \"short\""),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            ScriptcondConfig::from_toml("[executor]\nprogram = \"\""),
            Err(ConfigError::Validation(_))
        ));
    }
}
