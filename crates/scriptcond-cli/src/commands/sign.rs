//! Sign command implementation.

use std::path::Path;

use serde_json::json;
use tracing::info;

use super::{load_condition, load_config, read_json, read_text, CliResult};

pub async fn run(
    config: Option<&Path>,
    condition: &Path,
    script: &Path,
    keyring: Option<&Path>,
    message: &str,
) -> CliResult {
    let config = load_config(config)?;
    let condition = load_condition(&config, condition)?;
    let script = read_text(&script.display().to_string())?;
    let keyring = match keyring {
        Some(path) => read_json(&path.display().to_string())?,
        None => json!({}),
    };
    let message = read_text(message)?;

    info!(program = %config.executor.program.display(), "signing message");
    let signed = condition.sign(&message, &script, &keyring).await?;
    println!("{}", signed);
    Ok(())
}
