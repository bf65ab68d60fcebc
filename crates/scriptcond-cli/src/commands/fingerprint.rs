//! Fingerprint command implementation.

use std::path::Path;

use scriptcond_canonical::Digest;
use scriptcond_core::{ConditionType, ScriptableCondition};
use serde_json::json;
use tracing::info;

use super::{load_condition, load_config, CliError, CliResult};
use crate::output::{format_json, print_rows};

/// Published value the computed fingerprint must match.
pub enum Expected<'a> {
    /// `sha-256;<b64>` or bare base64url.
    Digest(&'a str),
    /// Hex of a binary condition.
    Binary(&'a str),
}

pub fn run(
    config: Option<&Path>,
    condition: &Path,
    json_output: bool,
    expected: Option<Expected<'_>>,
) -> CliResult {
    let config = load_config(config)?;
    let condition = load_condition(&config, condition)?;

    let contents = condition.get_fingerprint_contents()?;
    let fingerprint = condition.fingerprint()?;
    let uri = condition.condition_uri()?;
    let binary = hex::encode(condition.condition_binary()?);

    if json_output {
        println!(
            "{}",
            format_json(&json!({
                "type_id": ScriptableCondition::TYPE_ID,
                "type_name": ScriptableCondition::type_name()?,
                "fingerprint_contents": hex::encode(&contents),
                "fingerprint": fingerprint,
                "cost": condition.calculate_cost(),
                "uri": uri,
                "condition": binary,
            }))
        );
    } else {
        print_rows(&[
            ("TYPE", ScriptableCondition::type_name()?.to_string()),
            ("CONTENTS", hex::encode(&contents)),
            ("FINGERPRINT", fingerprint.to_string()),
            ("COST", condition.calculate_cost().to_string()),
            ("URI", uri),
            ("CONDITION", binary),
        ]);
    }

    if let Some(expected) = expected {
        let published = match expected {
            Expected::Digest(text) => Digest::parse(text)?,
            Expected::Binary(text) => {
                ScriptableCondition::parse_condition_binary(&hex::decode(text.trim())?)?
            }
        };
        if published != fingerprint {
            return Err(CliError::FingerprintMismatch {
                expected: published.to_string(),
                computed: fingerprint.to_string(),
            });
        }
        info!("fingerprint matches the published condition");
    }
    Ok(())
}
