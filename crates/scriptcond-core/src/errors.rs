use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Errors raised by scriptable condition operations.
#[derive(Error, Debug)]
pub enum ConditionError {
    /// Malformed configuration input, e.g. a script that is not a string.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Required state is absent, e.g. fingerprinting without a script.
    #[error("missing data: {0}")]
    MissingData(String),
    /// Malformed wire bytes, JSON text, or DER.
    #[error("parse error: {0}")]
    Parse(String),
    /// Failure reported by the script executor, passed through unmodified.
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    /// Canonicalization of a result failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] scriptcond_canonical::CanonicalizationError),
}

impl ConditionError {
    pub(crate) fn parse(context: &str, err: impl fmt::Display) -> Self {
        ConditionError::Parse(format!("{}: {}", context, err))
    }
}

/// Opaque failure from a script executor.
///
/// The message and source are whatever the engine reported; the condition
/// never rewrites or retries them.
#[derive(Debug)]
pub struct ExecutionError {
    message: String,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl ExecutionError {
    /// Creates an execution error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an execution error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Message reported by the executor.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "script execution failed: {}", self.message)
    }
}

impl StdError for ExecutionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn StdError + 'static))
    }
}
