//! Synchronous replay strategy
//!
//! Single-threaded replay: seeds the accounts, then streams the command CSV
//! through `SyncReader` and executes every command in file order on one
//! `LedgerEngine`.

use crate::core::{InMemoryStore, LedgerEngine, OperationContext};
use crate::io::sync_reader::{read_account_seeds, SyncReader};
use crate::strategy::{ProcessingStrategy, ReplayInput, ReplayOutcome};
use crate::types::LedgerError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Synchronous replay strategy
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input: &ReplayInput) -> Result<ReplayOutcome, LedgerError> {
        let engine = LedgerEngine::new(Arc::new(InMemoryStore::new()));
        let mut rejected = 0;

        if let Some(accounts) = &input.accounts {
            for seed in read_account_seeds(accounts)? {
                if let Err(e) = engine.seed_account(&seed) {
                    warn!(number = %seed.number, error = %e, "account seed rejected");
                    rejected += 1;
                }
            }
        }

        let mut reader = SyncReader::new(input.commands())?;
        let ctx = OperationContext::background();

        while let Some(row) = reader.next() {
            let line = reader.line();
            match row.and_then(|command| engine.execute(&command, &ctx)) {
                Ok(transaction) => debug!(
                    line,
                    reference = ?transaction.reference(),
                    status = %transaction.status(),
                    "row applied"
                ),
                Err(e) => {
                    warn!(line, error = %e, "row rejected");
                    rejected += 1;
                }
            }
        }

        let outcome = ReplayOutcome::from_engine(&engine, rejected);
        info!(
            accounts = outcome.accounts.len(),
            transactions = outcome.transactions.len(),
            rejected,
            "sync replay finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Currency, Money, TransactionStatus};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_replay_withdraw_scenarios() {
        let accounts = create_temp_csv(
            "number,holder,balance,currency,status\n\
             ACC-001,Alice,100.00,USD,active\n\
             ACC-002,Bob,10.00,USD,active\n",
        );
        let commands = create_temp_csv(
            "command,reference,type,from,to,amount,currency,description\n\
             create,W1,withdraw,ACC-001,,30.00,USD,atm\n\
             process,W1\n\
             create,W2,withdraw,ACC-002,,20.00,USD,atm\n\
             process,W2\n",
        );
        let input = ReplayInput::new(commands.path()).with_accounts(accounts.path());

        let outcome = SyncProcessingStrategy.process(&input).unwrap();

        assert_eq!(outcome.accounts[0].balance(), Money::new(7000, Currency::Usd));
        assert_eq!(outcome.accounts[1].balance(), Money::new(1000, Currency::Usd));
        assert_eq!(outcome.transactions[0].status(), TransactionStatus::Completed);
        assert_eq!(outcome.transactions[1].status(), TransactionStatus::Failed);
        assert_eq!(outcome.rejected, 1);
    }

    #[test]
    fn test_sync_replay_missing_input() {
        let input = ReplayInput::new("does-not-exist.csv");
        assert!(matches!(
            SyncProcessingStrategy.process(&input),
            Err(LedgerError::FileNotFound { .. })
        ));
    }
}
