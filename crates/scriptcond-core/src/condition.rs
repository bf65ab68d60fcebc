//! Scriptable condition: a condition fulfilled by re-running a script.
//!
//! The fingerprint covers the script only, so one published condition can be
//! fulfilled many times with different data. Signing runs a script over the
//! merged data and records its output in the message; validation runs the
//! bound script again and compares canonical results.

use std::fmt;
use std::sync::Arc;

use scriptcond_canonical::{Canonicalizer, Digest, DigestAlg};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};

use crate::config::{ComparisonStrategy, ConditionConfig};
use crate::der;
use crate::errors::ConditionError;
use crate::executor::{ExecutionResult, ScriptExecutor};
use crate::message::{merge_data, Message};
use crate::types::{ConditionType, TypeCategory};

/// Flat cost of fulfilling a scriptable condition.
pub const CONSTANT_COST: u64 = 131072;

/// Wire payload with `data` and `keys` as opaque JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asn1JsonPayload {
    /// Script source.
    pub script: String,
    /// Data as JSON text (`"{}"` when unset).
    pub data: String,
    /// Keys as JSON text (`"{}"` when unset).
    pub keys: String,
}

/// Raw wire fields as UTF-8 bytes, before any parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireObject {
    /// UTF-8 script bytes.
    pub script: Vec<u8>,
    /// UTF-8 JSON text of the data.
    pub data: Vec<u8>,
    /// UTF-8 JSON text of the keys.
    pub keys: Vec<u8>,
}

impl From<&Asn1JsonPayload> for WireObject {
    fn from(payload: &Asn1JsonPayload) -> Self {
        Self {
            script: payload.script.as_bytes().to_vec(),
            data: payload.data.as_bytes().to_vec(),
            keys: payload.keys.as_bytes().to_vec(),
        }
    }
}

/// Condition bound to a script, with optional data and keys.
pub struct ScriptableCondition {
    script: Option<String>,
    data: Option<Value>,
    keys: Option<Value>,
    executor: Arc<dyn ScriptExecutor>,
    canonicalizer: Canonicalizer,
    comparison: ComparisonStrategy,
}

impl fmt::Debug for ScriptableCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptableCondition")
            .field("script", &self.script)
            .field("data", &self.data)
            .field("keys", &self.keys)
            .field("comparison", &self.comparison)
            .finish_non_exhaustive()
    }
}

impl ScriptableCondition {
    /// Creates an empty condition using the default verification settings.
    pub fn new(executor: Arc<dyn ScriptExecutor>) -> Self {
        Self::with_config(executor, ConditionConfig::default())
    }

    /// Creates an empty condition with explicit verification settings.
    pub fn with_config(executor: Arc<dyn ScriptExecutor>, config: ConditionConfig) -> Self {
        Self {
            script: None,
            data: None,
            keys: None,
            executor,
            canonicalizer: Canonicalizer::new(config.profile),
            comparison: config.comparison,
        }
    }

    /// Binds the script. Changing it after the condition has been published
    /// invalidates the published identifier.
    pub fn set_script(&mut self, script: impl Into<String>) {
        self.script = Some(script.into());
    }

    /// Binds the script from a JSON value, which must be a string.
    pub fn set_script_value(&mut self, script: &Value) -> Result<(), ConditionError> {
        match script {
            Value::String(s) => {
                self.set_script(s.clone());
                Ok(())
            }
            _ => Err(ConditionError::Validation(
                "the script must be a string".to_string(),
            )),
        }
    }

    /// Bound script, if any.
    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    /// Replaces the condition data.
    pub fn set_data(&mut self, data: Value) {
        self.data = Some(data);
    }

    /// Condition data, if any.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Clears the condition data.
    pub fn clear_data(&mut self) {
        self.data = None;
    }

    /// Replaces the condition keys.
    pub fn set_keys(&mut self, keys: Value) {
        self.keys = Some(keys);
    }

    /// Condition keys, if any.
    pub fn keys(&self) -> Option<&Value> {
        self.keys.as_ref()
    }

    /// Clears the condition keys.
    pub fn clear_keys(&mut self) {
        self.keys = None;
    }

    /// Comparison strategy chosen at construction.
    pub fn comparison(&self) -> ComparisonStrategy {
        self.comparison
    }

    /// Applies a `{ script?, data?, keys? }` descriptor.
    pub fn apply_descriptor(&mut self, descriptor: &Value) -> Result<(), ConditionError> {
        let fields = descriptor.as_object().ok_or_else(|| {
            ConditionError::Validation("condition descriptor must be a JSON object".to_string())
        })?;
        if let Some(script) = fields.get("script") {
            self.set_script_value(script)?;
        }
        if let Some(data) = fields.get("data") {
            self.set_data(data.clone());
        }
        if let Some(keys) = fields.get("keys") {
            self.set_keys(keys.clone());
        }
        Ok(())
    }

    /// Rebuilds script, data and keys from wire bytes.
    pub fn parse_json(&mut self, wire: &WireObject) -> Result<(), ConditionError> {
        let script = std::str::from_utf8(&wire.script)
            .map_err(|err| ConditionError::parse("script is not UTF-8", err))?;
        let data = parse_json_text("data", &wire.data)?;
        let keys = parse_json_text("keys", &wire.keys)?;

        self.set_script(script);
        self.set_data(data);
        self.set_keys(keys);
        Ok(())
    }

    /// DER `SEQUENCE { script [0] UTF8String }` over the script alone.
    pub fn get_fingerprint_contents(&self) -> Result<Vec<u8>, ConditionError> {
        let script = self.require_script()?;
        let mut body = Vec::with_capacity(script.len() + 4);
        der::encode_tlv(der::context(0), script.as_bytes(), &mut body);
        let mut out = Vec::with_capacity(body.len() + 4);
        der::encode_tlv(der::TAG_SEQUENCE, &body, &mut out);
        Ok(out)
    }

    /// Wire payload with `data` and `keys` serialized to JSON text.
    pub fn get_asn1_json_payload(&self) -> Result<Asn1JsonPayload, ConditionError> {
        Ok(Asn1JsonPayload {
            script: self.require_script()?.to_string(),
            data: json_text(self.data.as_ref()),
            keys: json_text(self.keys.as_ref()),
        })
    }

    /// Always [`CONSTANT_COST`], whatever the script or data size.
    pub fn calculate_cost(&self) -> u64 {
        CONSTANT_COST
    }

    /// Binary fulfillment: `[5] { script [0], data [1], keys [2] }`.
    pub fn to_fulfillment_der(&self) -> Result<Vec<u8>, ConditionError> {
        let payload = self.get_asn1_json_payload()?;
        let mut body = Vec::new();
        der::encode_tlv(der::context(0), payload.script.as_bytes(), &mut body);
        der::encode_tlv(der::context(1), payload.data.as_bytes(), &mut body);
        der::encode_tlv(der::context(2), payload.keys.as_bytes(), &mut body);
        let mut out = Vec::with_capacity(body.len() + 6);
        der::encode_tlv(der::context_constructed(Self::TYPE_ID), &body, &mut out);
        Ok(out)
    }

    /// Rebuilds the condition from a binary fulfillment.
    pub fn parse_fulfillment_der(&mut self, bytes: &[u8]) -> Result<(), ConditionError> {
        let mut outer = der::DerReader::new(bytes);
        let body = outer.read(der::context_constructed(Self::TYPE_ID))?;
        outer.finish()?;

        let mut fields = der::DerReader::new(body);
        let wire = WireObject {
            script: fields.read(der::context(0))?.to_vec(),
            data: fields.read(der::context(1))?.to_vec(),
            keys: fields.read(der::context(2))?.to_vec(),
        };
        fields.finish()?;
        self.parse_json(&wire)
    }

    /// Reads a binary condition `[5] { fingerprint [0], cost [1] }` and
    /// returns its fingerprint. The cost must be [`CONSTANT_COST`].
    pub fn parse_condition_binary(bytes: &[u8]) -> Result<Digest, ConditionError> {
        let mut outer = der::DerReader::new(bytes);
        let body = outer.read(der::context_constructed(Self::TYPE_ID))?;
        outer.finish()?;

        let mut fields = der::DerReader::new(body);
        let fingerprint = Digest::from_bytes(DigestAlg::Sha256, fields.read(der::context(0))?)
            .map_err(|err| ConditionError::Parse(format!("fingerprint: {err}")))?;
        let cost = der::decode_unsigned(fields.read(der::context(1))?)?;
        fields.finish()?;

        if cost != CONSTANT_COST {
            return Err(ConditionError::Validation(format!(
                "cost {cost} does not match {}",
                CONSTANT_COST
            )));
        }
        Ok(fingerprint)
    }

    /// Runs `condition_script` over the merged data and returns the message
    /// with `metadata.data` and `metadata.logs` filled in.
    pub async fn sign(
        &self,
        message: &str,
        condition_script: &str,
        keyring: &Value,
    ) -> Result<String, ConditionError> {
        let mut message = Message::parse(message)?;
        self.sign_message(&mut message, condition_script, keyring).await?;
        message.to_json_string()
    }

    /// Typed form of [`sign`](Self::sign). The message is only written once
    /// the script has succeeded.
    #[instrument(skip_all, fields(script_bytes = condition_script.len()))]
    pub async fn sign_message(
        &self,
        message: &mut Message,
        condition_script: &str,
        keyring: &Value,
    ) -> Result<ExecutionResult, ConditionError> {
        let merged = merge_data(self.data.as_ref(), message.asset_data());
        let keys = json!({ "keyring": keyring });
        debug!(members = merged.len(), "signing with merged data");

        let execution = self
            .executor
            .execute(
                condition_script,
                &keys.to_string(),
                &Value::Object(merged).to_string(),
            )
            .await?
            .into_execution()?;

        message.record_execution(&execution);
        info!("message signed");
        Ok(execution)
    }

    /// Re-runs the bound script and checks the result recorded in the message.
    pub async fn validate(&self, message: &str) -> Result<bool, ConditionError> {
        let message = Message::parse(message)?;
        self.validate_message(&message).await
    }

    /// Typed form of [`validate`](Self::validate).
    ///
    /// `Ok(false)` means the message was checked and does not hold; errors
    /// mean it could not be checked.
    #[instrument(skip_all)]
    pub async fn validate_message(&self, message: &Message) -> Result<bool, ConditionError> {
        let script = self.require_script()?;
        let Some(recorded) = message.recorded_result() else {
            info!("no recorded result; message is not valid");
            return Ok(false);
        };

        let mut merged: Map<String, Value> = merge_data(self.data.as_ref(), message.asset_data());
        merged.insert("result".to_string(), recorded.clone());
        let keys = json_text(self.keys.as_ref());

        let execution = self
            .executor
            .execute(script, &keys, &Value::Object(merged).to_string())
            .await?
            .into_execution()?;

        let valid = self.results_match(&execution.result, recorded)?;
        info!(valid, "message validated");
        Ok(valid)
    }

    fn results_match(&self, fresh: &Value, recorded: &Value) -> Result<bool, ConditionError> {
        match self.comparison {
            ComparisonStrategy::Canonical => {
                debug!(profile = %self.canonicalizer.profile(), "comparing canonical results");
                Ok(self.canonicalizer.equivalent(fresh, recorded)?)
            }
            ComparisonStrategy::Structural => Ok(fresh == recorded),
        }
    }

    fn require_script(&self) -> Result<&str, ConditionError> {
        self.script
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConditionError::MissingData("requires a script".to_string()))
    }
}

impl ConditionType for ScriptableCondition {
    const TYPE_ID: u8 = 5;
    const TYPE_NAME: &'static str = "zenroom-sha-256";
    const TYPE_ASN1_CONDITION: &'static str = "zenroomSha256Condition";
    const TYPE_ASN1_FULFILLMENT: &'static str = "zenroomSha256Fulfillment";
    const TYPE_CATEGORY: TypeCategory = TypeCategory::Simple;

    fn fingerprint_contents(&self) -> Result<Vec<u8>, ConditionError> {
        self.get_fingerprint_contents()
    }

    fn calculate_cost(&self) -> u64 {
        CONSTANT_COST
    }
}

fn json_text(value: Option<&Value>) -> String {
    value.map_or_else(|| "{}".to_string(), Value::to_string)
}

fn parse_json_text(field: &str, bytes: &[u8]) -> Result<Value, ConditionError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|err| ConditionError::parse(&format!("{field} is not UTF-8"), err))?;
    serde_json::from_str(text)
        .map_err(|err| ConditionError::parse(&format!("{field} is not JSON"), err))
}
