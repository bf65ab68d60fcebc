//! Canonicalize command implementation.

use std::path::Path;

use scriptcond_canonical::Canonicalizer;

use super::{load_config, read_json, CliResult};

pub fn run(config: Option<&Path>, input: Option<String>) -> CliResult {
    let config = load_config(config)?;
    let canonicalizer = Canonicalizer::new(config.verification.profile);

    let value = read_json(input.as_deref().unwrap_or("-"))?;
    let form = canonicalizer.canonicalize(&value)?;

    println!("{}", form.as_str());
    Ok(())
}
