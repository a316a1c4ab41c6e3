//! Asynchronous batch replay strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. Commands are read in batches and each batch is
//! split into groups that share no account or reference; groups run in
//! parallel on a tokio runtime.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, worker_threads, operation_timeout)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (conflict partitioning + tokio tasks)
//!     └── AsyncLedgerEngine (blocking pool + timeouts)
//!         └── LedgerEngine<InMemoryStore>
//! ```
//!
//! Batches are processed one after another, so a command never overtakes an
//! earlier command of the file that touches the same account or reference.

use crate::core::{AsyncLedgerEngine, BatchProcessor, InMemoryStore, LedgerEngine};
use crate::io::async_reader::AsyncReader;
use crate::io::sync_reader::read_account_seeds;
use crate::strategy::{ProcessingStrategy, ReplayInput, ReplayOutcome};
use crate::types::LedgerError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq)]
pub struct BatchConfig {
    /// Number of commands read per batch
    ///
    /// Default: 1000
    pub batch_size: usize,

    /// Number of tokio worker threads
    ///
    /// Default: number of CPU cores
    pub worker_threads: usize,

    /// Upper bound on a single ledger operation
    ///
    /// Default: 5 seconds
    pub operation_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            worker_threads: num_cpus::get(),
            operation_timeout: Duration::from_secs(5),
        }
    }
}

impl BatchConfig {
    /// Create a configuration, replacing zero values by the defaults
    ///
    /// Each replaced value is logged as a warning.
    pub fn new(batch_size: usize, worker_threads: usize, operation_timeout: Duration) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let worker_threads = if worker_threads == 0 {
            warn!(
                worker_threads,
                default = default.worker_threads,
                "invalid worker_threads, using default"
            );
            default.worker_threads
        } else {
            worker_threads
        };

        let operation_timeout = if operation_timeout.is_zero() {
            warn!(
                default_ms = default.operation_timeout.as_millis() as u64,
                "invalid operation_timeout, using default"
            );
            default.operation_timeout
        } else {
            operation_timeout
        };

        Self {
            batch_size,
            worker_threads,
            operation_timeout,
        }
    }
}

/// Asynchronous batch replay strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input: &ReplayInput) -> Result<ReplayOutcome, LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.worker_threads)
            .enable_time()
            .build()?;

        let engine = Arc::new(LedgerEngine::new(Arc::new(InMemoryStore::new())));
        let facade = AsyncLedgerEngine::new(Arc::clone(&engine), self.config.operation_timeout);

        let rejected = runtime.block_on(async {
            let mut rejected = 0;

            if let Some(accounts) = &input.accounts {
                for seed in read_account_seeds(accounts)? {
                    let number = seed.number.clone();
                    if let Err(e) = facade.seed_account(seed).await {
                        warn!(number = %number, error = %e, "account seed rejected");
                        rejected += 1;
                    }
                }
            }

            let processor = BatchProcessor::new(facade.clone());
            let mut reader = AsyncReader::open(input.commands()).await?;

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for result in processor.process_batch(batch).await {
                    if let Err(e) = result.result {
                        warn!(
                            command = result.command.name(),
                            reference = result.command.reference(),
                            error = %e,
                            "row rejected"
                        );
                        rejected += 1;
                    }
                }
            }

            rejected += reader.skipped();
            Ok::<usize, LedgerError>(rejected)
        })?;

        let outcome = ReplayOutcome::from_engine(&engine, rejected);
        info!(
            accounts = outcome.accounts.len(),
            transactions = outcome.transactions.len(),
            rejected,
            workers = self.config.worker_threads,
            "async replay finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::all_valid(500, 4, 100, 500, 4, 100)]
    #[case::zero_batch_size(0, 4, 100, 1000, 4, 100)]
    #[case::zero_timeout(500, 4, 0, 500, 4, 5000)]
    fn test_batch_config_new(
        #[case] batch_size: usize,
        #[case] workers: usize,
        #[case] timeout_ms: u64,
        #[case] expected_batch_size: usize,
        #[case] expected_workers: usize,
        #[case] expected_timeout_ms: u64,
    ) {
        let config = BatchConfig::new(batch_size, workers, Duration::from_millis(timeout_ms));

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.worker_threads, expected_workers);
        assert_eq!(config.operation_timeout, Duration::from_millis(expected_timeout_ms));
    }

    #[test]
    fn test_batch_config_zero_workers_uses_cpu_count() {
        let config = BatchConfig::new(10, 0, Duration::from_secs(1));
        assert_eq!(config.worker_threads, num_cpus::get());
    }

    #[test]
    fn test_async_replay_missing_input() {
        let strategy = AsyncProcessingStrategy::new(BatchConfig::new(10, 2, Duration::from_secs(1)));
        assert!(matches!(
            strategy.process(&ReplayInput::new("does-not-exist.csv")),
            Err(LedgerError::FileNotFound { .. })
        ));
    }
}
