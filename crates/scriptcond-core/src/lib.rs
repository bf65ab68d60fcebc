//! Scriptable condition type for crypto-conditions (`zenroom-sha-256`).
//!
//! This crate provides:
//! - [`ScriptableCondition`]: script/data/keys state, fingerprint contents,
//!   wire payload, and the sign/validate protocol
//! - The [`ScriptExecutor`] capability and a process-backed [`CommandExecutor`]
//! - The [`Message`] envelope and the data merge rule used by sign/validate
//! - DER encodings for fingerprint contents, conditions and fulfillments
//!
//! Core invariants:
//! - Fingerprint contents depend on the script alone; data and keys never
//!   change the condition identifier
//! - Validation fails (`Ok(false)`) whenever the message carries no recorded result
//! - Cost is a flat constant
//! - Validation assumes the executor is deterministic for fixed inputs
//!
#![deny(missing_docs)]

/// Process-backed script executor.
pub mod command;
/// The scriptable condition.
pub mod condition;
/// TOML configuration.
pub mod config;
/// Minimal DER encoding helpers.
pub mod der;
/// Error types.
pub mod errors;
/// Script executor capability.
pub mod executor;
/// Message envelope and merge rule.
pub mod message;
/// Condition type identity.
pub mod types;

pub use command::CommandExecutor;
pub use condition::{Asn1JsonPayload, ScriptableCondition, WireObject, CONSTANT_COST};
pub use config::{
    ComparisonStrategy, ConditionConfig, ConfigError, ExecutorConfig, ScriptcondConfig,
};
pub use errors::{ConditionError, ExecutionError};
pub use executor::{ExecutionResult, ScriptExecutor, ScriptLogs, ScriptOutput};
pub use message::{merge_data, Message};
pub use types::{ConditionType, TypeCategory};
