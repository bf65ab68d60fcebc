//! Validate command implementation.

use std::path::Path;

use super::{load_condition, load_config, read_text, CliResult};

pub async fn run(
    config: Option<&Path>,
    condition: &Path,
    message: &str,
    strict: bool,
) -> CliResult {
    let config = load_config(config)?;
    let condition = load_condition(&config, condition)?;
    let message = read_text(message)?;

    let valid = condition.validate(&message).await?;
    println!("{}", if valid { "valid" } else { "invalid" });

    if strict && !valid {
        std::process::exit(1);
    }
    Ok(())
}
