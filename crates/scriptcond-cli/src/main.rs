//! Scriptcond CLI - fingerprint, sign and validate scriptable conditions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{canonicalize, fingerprint, payload, sign, validate};

#[derive(Parser)]
#[command(name = "scriptcond")]
#[command(version, about = "Scriptable crypto-condition fingerprinting, signing and validation")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show fingerprint contents, fingerprint and condition URI
    Fingerprint {
        /// Condition descriptor JSON (`{"script": ..., "data": ..., "keys": ...}`)
        condition: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Fail unless the fingerprint equals this digest (`sha-256;<b64>` or bare base64url)
        #[arg(long, conflicts_with = "expect_binary")]
        expect: Option<String>,
        /// Fail unless the fingerprint equals the one in this hex binary condition
        #[arg(long)]
        expect_binary: Option<String>,
    },
    /// Show the wire payload of a condition
    Payload {
        /// Condition descriptor JSON
        condition: PathBuf,
        /// Also print the DER fulfillment as hex
        #[arg(long)]
        der: bool,
    },
    /// Run a script over a message and record its output
    Sign {
        /// Condition descriptor JSON
        #[arg(long)]
        condition: PathBuf,
        /// Script to run
        #[arg(long)]
        script: PathBuf,
        /// Keyring JSON (default: `{}`)
        #[arg(long)]
        keyring: Option<PathBuf>,
        /// Message JSON (`-` for stdin)
        #[arg(long, default_value = "-")]
        message: String,
    },
    /// Re-run the condition script and check the recorded result
    Validate {
        /// Condition descriptor JSON
        #[arg(long)]
        condition: PathBuf,
        /// Message JSON (`-` for stdin)
        #[arg(long, default_value = "-")]
        message: String,
        /// Exit with error code if the message is not valid
        #[arg(long)]
        strict: bool,
    },
    /// Show canonical bytes for input JSON
    Canonicalize {
        /// Input JSON file (or stdin if not provided)
        input: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Fingerprint {
            condition,
            json,
            expect,
            expect_binary,
        } => {
            let expected = expect
                .as_deref()
                .map(fingerprint::Expected::Digest)
                .or(expect_binary.as_deref().map(fingerprint::Expected::Binary));
            fingerprint::run(config, &condition, json, expected)
        }
        Commands::Payload { condition, der } => payload::run(config, &condition, der),
        Commands::Sign {
            condition,
            script,
            keyring,
            message,
        } => sign::run(config, &condition, &script, keyring.as_deref(), &message).await,
        Commands::Validate {
            condition,
            message,
            strict,
        } => validate::run(config, &condition, &message, strict).await,
        Commands::Canonicalize { input } => canonicalize::run(config, input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
