//! Settlement Engine CLI
//!
//! Command-line interface for running username registrations and payments
//! from a CSV script.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- script.csv > balances.csv
//! cargo run -- --asset 0x00000000000000000000000000000000000000c0 script.csv
//! cargo run -- --fee-bps 25 --registration-fee 1 --events events.jsonl script.csv
//! RUST_LOG=debug cargo run -- --no-native script.csv
//! ```
//!
//! The program builds a fresh identity registry and settlement engine over an
//! in-memory ledger, applies every operation in the script, and writes the
//! final balances to stdout. Logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success (rejected operations do not change the exit code)
//! - 1: Error (invalid settings, script not found or unreadable, output failure)

use rust_settlement_engine::cli;
use rust_settlement_engine::runner::ScriptRunner;
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = cli::parse_args();

    let runner = match args.to_settings().and_then(ScriptRunner::new) {
        Ok(runner) => runner,
        Err(e) => {
            tracing::error!(code = e.code(), error = %e, "Invalid settings");
            process::exit(1);
        }
    };

    // Balances go to stdout
    let mut output = std::io::stdout();
    if let Err(e) = runner.run(&args.script, &mut output) {
        tracing::error!(code = e.code(), error = %e, "Script run failed");
        process::exit(1);
    }
}
