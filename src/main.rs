//! Ledger Engine CLI
//!
//! Replays ledger commands from a CSV file against a fresh in-memory ledger.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv > accounts.csv
//! cargo run -- --accounts seed.csv commands.csv > accounts.csv
//! cargo run -- --strategy sync --accounts seed.csv commands.csv > accounts.csv
//! cargo run -- --strategy async --batch-size 2000 --workers 8 --timeout-ms 1000 commands.csv
//! cargo run -- --accounts seed.csv --transactions-out tx.csv commands.csv
//! ```
//!
//! The final accounts are written to stdout as CSV. Logs go to stderr and are
//! filtered with `RUST_LOG` (default `ledger_engine=info`).
//!
//! # Exit Codes
//!
//! - 0: Success (rejected rows are logged, not fatal)
//! - 1: Error (file not found, file not readable, output not writable, etc.)

use ledger_engine::cli;
use ledger_engine::strategy;
use ledger_engine::LedgerError;
use std::fs::File;
use std::io::BufWriter;
use std::process;
use tracing::{error, info};

fn main() {
    let args = cli::parse_args();
    cli::init_tracing();

    if let Err(e) = run(&args) {
        error!(error = %e, "replay failed");
        process::exit(1);
    }
}

fn run(args: &cli::CliArgs) -> Result<(), LedgerError> {
    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, config)
    };

    let outcome = strategy.process(&args.to_replay_input())?;

    let mut output = std::io::stdout().lock();
    outcome.write_accounts(&mut output)?;

    if let Some(path) = &args.transactions_out {
        let mut file = BufWriter::new(File::create(path)?);
        outcome.write_transactions(&mut file)?;
        info!(path = %path.display(), "transactions written");
    }

    if outcome.rejected > 0 {
        info!(rejected = outcome.rejected, "some rows were rejected");
    }
    Ok(())
}
