//! Payload command implementation.

use std::path::Path;

use serde_json::json;

use super::{load_condition, load_config, CliResult};
use crate::output::format_json;

pub fn run(config: Option<&Path>, condition: &Path, der: bool) -> CliResult {
    let config = load_config(config)?;
    let condition = load_condition(&config, condition)?;
    let payload = condition.get_asn1_json_payload()?;

    let mut value = json!({
        "script": payload.script,
        "data": payload.data,
        "keys": payload.keys,
    });
    if der {
        value["der"] = json!(hex::encode(condition.to_fulfillment_der()?));
    }
    println!("{}", format_json(&value));
    Ok(())
}
