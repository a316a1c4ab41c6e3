use crate::strategy::{BatchConfig, ReplayInput};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Replay ledger commands against an in-memory ledger
#[derive(Parser, Debug)]
#[command(name = "ledger-engine")]
#[command(
    about = "Replay deposit/withdraw/transfer commands and print the final accounts",
    long_about = None
)]
pub struct CliArgs {
    /// Command CSV file path
    #[arg(value_name = "INPUT", help = "Path to the command CSV file")]
    pub input_file: PathBuf,

    /// Account seed CSV loaded before the first command
    #[arg(
        long = "accounts",
        value_name = "FILE",
        help = "Account seed CSV (number,holder,balance,currency,status)"
    )]
    pub accounts_file: Option<PathBuf>,

    /// Replay strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Replay strategy: 'sync' for single-threaded or 'async' for batched parallel"
    )]
    pub strategy: StrategyType,

    /// Number of commands per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of runtime worker threads (async mode only)
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// Per-operation timeout in milliseconds (async mode only)
    #[arg(
        long = "timeout-ms",
        value_name = "MILLIS",
        help = "Upper bound on a single ledger operation (default: 5000)"
    )]
    pub timeout_ms: Option<u64>,

    /// Where to write the final transactions CSV
    #[arg(
        long = "transactions-out",
        value_name = "FILE",
        help = "Also write transactions (reference,type,status,amount,currency,processed)"
    )]
    pub transactions_out: Option<PathBuf>,
}

/// Available replay strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing options take their defaults; zero values are replaced by the
    /// defaults with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_none() && self.workers.is_none() && self.timeout_ms.is_none() {
            return BatchConfig::default();
        }

        let default = BatchConfig::default();
        BatchConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.workers.unwrap_or(default.worker_threads),
            self.timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(default.operation_timeout),
        )
    }

    /// Files to replay
    pub fn to_replay_input(&self) -> ReplayInput {
        let input = ReplayInput::new(&self.input_file);
        match &self.accounts_file {
            Some(accounts) => input.with_accounts(accounts),
            None => input,
        }
    }
}
