//! Message envelope exchanged by `sign` and `validate`.
//!
//! Shape: `{ asset?: { data }, metadata?: { data?, logs?, result? } }`.
//! Members this crate does not know about are preserved.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::ConditionError;
use crate::executor::ExecutionResult;

/// A JSON object message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(Map<String, Value>);

impl Message {
    /// Parses message JSON text. The top level must be an object.
    pub fn parse(text: &str) -> Result<Self, ConditionError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|err| ConditionError::parse("message is not JSON", err))?;
        Self::from_value(value)
    }

    /// Wraps an already parsed value. The value must be an object.
    pub fn from_value(value: Value) -> Result<Self, ConditionError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ConditionError::Parse(format!(
                "message must be a JSON object, got {}",
                kind(&other)
            ))),
        }
    }

    /// `asset.data`, if the asset is an object carrying one.
    pub fn asset_data(&self) -> Option<&Value> {
        self.0.get("asset")?.as_object()?.get("data")
    }

    /// `metadata.result`, unless absent, null, or empty.
    pub fn recorded_result(&self) -> Option<&Value> {
        self.metadata()?.get("result").filter(|v| !is_empty(v))
    }

    /// The metadata object, if present.
    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.0.get("metadata")?.as_object()
    }

    /// Sets `metadata.result`, creating metadata when needed.
    pub fn set_recorded_result(&mut self, result: Value) {
        self.update_metadata(|metadata| {
            metadata.insert("result".to_string(), result);
        });
    }

    /// Writes `metadata.data` and `metadata.logs`, keeping other metadata members.
    pub fn record_execution(&mut self, execution: &ExecutionResult) {
        self.update_metadata(|metadata| {
            metadata.insert("data".to_string(), execution.result.clone());
            metadata.insert("logs".to_string(), execution.logs.clone());
        });
    }

    /// Compact JSON text.
    pub fn to_json_string(&self) -> Result<String, ConditionError> {
        serde_json::to_string(&self.0)
            .map_err(|err| ConditionError::parse("message serialization failed", err))
    }

    /// Underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the message into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    fn update_metadata(&mut self, update: impl FnOnce(&mut Map<String, Value>)) {
        let slot = self
            .0
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            debug!(found = kind(slot), "replacing non-object metadata");
            *slot = Value::Object(Map::new());
        }
        if let Value::Object(map) = slot {
            update(map);
        }
    }
}

/// Shallow merge of the condition's own data with the message's asset data.
///
/// Object members of `base` come first; members of `overlay` override them.
/// Contributions that are not objects are skipped.
pub fn merge_data(base: Option<&Value>, overlay: Option<&Value>) -> Map<String, Value> {
    let mut merged = Map::new();
    for (source, part) in [("condition", base), ("asset", overlay)] {
        match part {
            Some(Value::Object(map)) => {
                merged.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Some(other) => {
                debug!(source, found = kind(other), "skipping non-object data in merge");
            }
            None => {}
        }
    }
    merged
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn asset_data_tolerates_missing_and_malformed_assets() {
        let msg = Message::parse(r#"{"asset":{"data":{"x":1}}}"#).unwrap();
        assert_eq!(msg.asset_data(), Some(&json!({"x": 1})));

        assert_eq!(Message::parse("{}").unwrap().asset_data(), None);
        assert_eq!(Message::parse(r#"{"asset":7}"#).unwrap().asset_data(), None);
        assert_eq!(Message::parse(r#"{"asset":{}}"#).unwrap().asset_data(), None);
    }

    #[test]
    fn non_object_messages_are_rejected() {
        assert!(matches!(
            Message::parse("[1,2]"),
            Err(ConditionError::Parse(_))
        ));
        assert!(matches!(
            Message::parse("{oops"),
            Err(ConditionError::Parse(_))
        ));
    }

    #[test]
    fn empty_recorded_results_count_as_absent() {
        for metadata in [
            json!({}),
            json!({"result": null}),
            json!({"result": {}}),
            json!({"result": []}),
            json!({"result": ""}),
        ] {
            let msg = Message::from_value(json!({ "metadata": metadata })).unwrap();
            assert_eq!(msg.recorded_result(), None);
        }
        let msg = Message::from_value(json!({"metadata": {"result": 0}})).unwrap();
        assert_eq!(msg.recorded_result(), Some(&json!(0)));
    }

    #[test]
    fn record_execution_merges_into_existing_metadata() {
        let mut msg =
            Message::parse(r#"{"id":"tx1","metadata":{"result":{"x":1},"data":"old"}}"#).unwrap();
        msg.record_execution(&ExecutionResult {
            result: json!({"x": 2}),
            logs: json!(["[*] done"]),
        });
        assert_eq!(
            msg.into_value(),
            json!({
                "id": "tx1",
                "metadata": {"result": {"x": 1}, "data": {"x": 2}, "logs": ["[*] done"]}
            })
        );
    }

    #[test]
    fn record_execution_replaces_non_object_metadata() {
        let mut msg = Message::parse(r#"{"metadata":"junk"}"#).unwrap();
        msg.record_execution(&ExecutionResult {
            result: json!(true),
            logs: json!([]),
        });
        assert_eq!(
            msg.metadata().cloned().map(Value::Object),
            Some(json!({"data": true, "logs": []}))
        );
    }

    #[test]
    fn set_recorded_result_creates_or_replaces_metadata() {
        let mut msg = Message::default();
        msg.set_recorded_result(json!({"x": 1}));
        assert_eq!(msg.recorded_result(), Some(&json!({"x": 1})));

        let mut msg = Message::parse(r#"{"metadata":[1,2]}"#).unwrap();
        msg.set_recorded_result(json!("ok"));
        assert_eq!(msg.into_value(), json!({"metadata": {"result": "ok"}}));
    }

    #[test]
    fn merge_prefers_asset_members() {
        let merged = merge_data(
            Some(&json!({"a": 1, "b": 1})),
            Some(&json!({"b": 2, "c": 3})),
        );
        assert_eq!(Value::Object(merged), json!({"a": 1, "b": 2, "c": 3}));
    }

    #[test]
    fn merge_skips_non_objects() {
        assert_eq!(
            Value::Object(merge_data(Some(&json!([1])), Some(&json!({"x": 1})))),
            json!({"x": 1})
        );
        assert!(merge_data(None, Some(&json!("text"))).is_empty());
    }
}
