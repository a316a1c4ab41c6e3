//! Replay strategy module
//!
//! This module defines the Strategy pattern for complete replay pipelines:
//! seed accounts, read the command CSV, run every command through the
//! ledger engine and report the final state. Different implementations
//! (synchronous, asynchronous batch) can be selected at runtime and produce
//! identical results.

use crate::cli::StrategyType;
use crate::core::{InMemoryStore, LedgerEngine};
use crate::io::csv_format::{write_accounts_csv, write_transactions_csv};
use crate::types::{Account, LedgerError, Transaction};
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Files a replay reads
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayInput {
    /// Command CSV
    pub commands: PathBuf,
    /// Optional account seed CSV, loaded before the first command
    pub accounts: Option<PathBuf>,
}

impl ReplayInput {
    pub fn new(commands: impl Into<PathBuf>) -> Self {
        Self {
            commands: commands.into(),
            accounts: None,
        }
    }

    pub fn with_accounts(mut self, accounts: impl Into<PathBuf>) -> Self {
        self.accounts = Some(accounts.into());
        self
    }

    pub fn commands(&self) -> &Path {
        &self.commands
    }
}

/// Final ledger state after a replay
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    /// Every account, ordered by number
    pub accounts: Vec<Account>,
    /// Every transaction, oldest first
    pub transactions: Vec<Transaction>,
    /// Rows that could not be parsed or were rejected by the engine
    pub rejected: usize,
}

impl ReplayOutcome {
    pub(crate) fn from_engine(engine: &LedgerEngine<InMemoryStore>, rejected: usize) -> Self {
        Self {
            accounts: engine.store().all_accounts(),
            transactions: engine.store().all_transactions(),
            rejected,
        }
    }

    pub fn write_accounts(&self, output: &mut dyn Write) -> Result<(), LedgerError> {
        write_accounts_csv(&self.accounts, output)
    }

    pub fn write_transactions(&self, output: &mut dyn Write) -> Result<(), LedgerError> {
        write_transactions_csv(&self.transactions, output)
    }
}

/// Trait for complete replay pipelines
///
/// Implementations must be thread-safe (Send + Sync) to allow use in
/// concurrent contexts.
pub trait ProcessingStrategy: Send + Sync {
    /// Replay `input` against a fresh in-memory ledger
    ///
    /// # Errors
    ///
    /// Only file-level failures (missing or unreadable input, runtime
    /// start-up) are returned. Rejected rows are logged and counted in
    /// [`ReplayOutcome::rejected`].
    fn process(&self, input: &ReplayInput) -> Result<ReplayOutcome, LedgerError>;
}

/// Factory function to create a replay strategy
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config))
        }
    }
}
