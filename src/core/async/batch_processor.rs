//! Batch processing with conflict-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which runs a batch of
//! replayed commands concurrently while producing exactly the result of
//! running them one after another.
//!
//! # Design
//!
//! Two commands conflict when they share an account or a transaction
//! reference. The batch is split into groups closed under that relation
//! (union-find over account numbers and references). Groups run as separate
//! tokio tasks; the commands of one group run in file order. A `process` or
//! `cancel` row for a reference created in an earlier batch is tied to that
//! transaction's accounts through the store.

use std::collections::HashMap;

use tracing::error;

use super::AsyncLedgerEngine;
use crate::core::traits::LedgerStore;
use crate::types::{LedgerCommand, LedgerError, Transaction};

/// Result of executing a single command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The command that was executed
    pub command: LedgerCommand,

    /// The transaction after the command, or why it was rejected
    pub result: Result<Transaction, LedgerError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PartitionKey {
    Account(String),
    Reference(String),
}

/// Concurrent batch executor
#[derive(Debug)]
pub struct BatchProcessor<S> {
    engine: AsyncLedgerEngine<S>,
}

impl<S> Clone for BatchProcessor<S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<S: LedgerStore + 'static> BatchProcessor<S> {
    pub fn new(engine: AsyncLedgerEngine<S>) -> Self {
        Self { engine }
    }

    /// Split a batch into independent groups
    ///
    /// Groups are ordered by their first command and keep file order
    /// internally.
    pub fn partition(&self, batch: Vec<LedgerCommand>) -> Vec<Vec<LedgerCommand>> {
        let mut parents: Vec<usize> = (0..batch.len()).collect();
        let mut owners: HashMap<PartitionKey, usize> = HashMap::new();

        for (row, command) in batch.iter().enumerate() {
            for key in self.keys(command) {
                match owners.get(&key) {
                    Some(&owner) => union(&mut parents, row, owner),
                    None => {
                        owners.insert(key, row);
                    }
                }
            }
        }

        let mut groups: Vec<Vec<LedgerCommand>> = Vec::new();
        let mut group_of_root: HashMap<usize, usize> = HashMap::new();
        for (row, command) in batch.into_iter().enumerate() {
            let root = find(&mut parents, row);
            let index = *group_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[index].push(command);
        }

        groups
    }

    /// Execute one group in order
    pub async fn process_group(&self, commands: Vec<LedgerCommand>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(commands.len());

        for command in commands {
            let result = self.engine.execute(command.clone()).await;
            results.push(ProcessingResult { command, result });
        }

        results
    }

    /// Execute a batch, independent groups in parallel
    pub async fn process_batch(&self, batch: Vec<LedgerCommand>) -> Vec<ProcessingResult> {
        let groups = self.partition(batch);

        let mut tasks = Vec::with_capacity(groups.len());
        for group in groups {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_group(group).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(group_results) => results.extend(group_results),
                Err(e) => error!(error = %e, "batch group task panicked"),
            }
        }

        results
    }

    fn keys(&self, command: &LedgerCommand) -> Vec<PartitionKey> {
        let mut keys = vec![PartitionKey::Reference(command.reference().to_string())];
        keys.extend(
            command
                .account_numbers()
                .into_iter()
                .map(|number| PartitionKey::Account(number.to_string())),
        );

        if !matches!(command, LedgerCommand::Create { .. }) {
            let engine = self.engine.engine();
            if let Ok(transaction) = engine.get_transaction_by_reference(command.reference()) {
                for id in transaction.account_ids() {
                    if let Ok(account) = engine.get_account(id) {
                        keys.push(PartitionKey::Account(account.number().to_string()));
                    }
                }
            }
        }

        keys
    }
}

fn find(parents: &mut [usize], mut row: usize) -> usize {
    while parents[row] != row {
        parents[row] = parents[parents[row]];
        row = parents[row];
    }
    row
}

fn union(parents: &mut [usize], a: usize, b: usize) {
    let root_a = find(parents, a);
    let root_b = find(parents, b);
    if root_a != root_b {
        parents[root_a.max(root_b)] = root_a.min(root_b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::LedgerEngine;
    use crate::core::store::InMemoryStore;
    use crate::types::{Currency, Money, TransactionStatus, TransactionType};
    use std::sync::Arc;
    use std::time::Duration;

    fn usd(amount: i64) -> Money {
        Money::new(amount, Currency::Usd)
    }

    fn processor_with(accounts: &[(&str, i64)]) -> BatchProcessor<InMemoryStore> {
        let engine = Arc::new(LedgerEngine::new(Arc::new(InMemoryStore::new())));
        for (number, balance) in accounts {
            engine.open_account(number, "holder", usd(*balance)).unwrap();
        }
        BatchProcessor::new(AsyncLedgerEngine::new(engine, Duration::from_secs(5)))
    }

    fn create(
        reference: &str,
        tx_type: TransactionType,
        from: &str,
        to: &str,
        amount: i64,
    ) -> LedgerCommand {
        let account = |number: &str| (!number.is_empty()).then(|| number.to_string());
        LedgerCommand::Create {
            reference: reference.to_string(),
            tx_type,
            from: account(from),
            to: account(to),
            amount: usd(amount),
            description: String::new(),
        }
    }

    fn process(reference: &str) -> LedgerCommand {
        LedgerCommand::Process {
            reference: reference.to_string(),
        }
    }

    fn references(group: &[LedgerCommand]) -> Vec<&str> {
        group.iter().map(LedgerCommand::reference).collect()
    }

    #[test]
    fn test_partition_empty_batch() {
        let processor = processor_with(&[]);
        assert!(processor.partition(vec![]).is_empty());
    }

    #[test]
    fn test_partition_separates_unrelated_accounts() {
        let processor = processor_with(&[("A", 100), ("B", 100)]);

        let groups = processor.partition(vec![
            create("D1", TransactionType::Deposit, "", "A", 10),
            create("D2", TransactionType::Deposit, "", "B", 10),
            process("D1"),
            process("D2"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(references(&groups[0]), vec!["D1", "D1"]);
        assert_eq!(references(&groups[1]), vec!["D2", "D2"]);
    }

    #[test]
    fn test_partition_transfer_joins_groups() {
        let processor = processor_with(&[("A", 100), ("B", 100), ("C", 100)]);

        let groups = processor.partition(vec![
            create("W1", TransactionType::Withdraw, "A", "", 10),
            create("W2", TransactionType::Withdraw, "B", "", 10),
            create("W3", TransactionType::Withdraw, "C", "", 10),
            create("T1", TransactionType::Transfer, "A", "B", 10),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(references(&groups[0]), vec!["W1", "W2", "T1"]);
        assert_eq!(references(&groups[1]), vec!["W3"]);
    }

    #[tokio::test]
    async fn test_partition_resolves_earlier_references() {
        let processor = processor_with(&[("A", 100), ("B", 100)]);
        processor
            .process_batch(vec![create("W1", TransactionType::Withdraw, "A", "", 10)])
            .await;

        let groups = processor.partition(vec![
            create("D1", TransactionType::Deposit, "", "A", 10),
            create("D2", TransactionType::Deposit, "", "B", 10),
            process("W1"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(references(&groups[0]), vec!["D1", "W1"]);
    }

    #[tokio::test]
    async fn test_process_batch_matches_sequential_order() {
        let processor = processor_with(&[("A", 1000), ("B", 0), ("C", 500)]);

        let results = processor
            .process_batch(vec![
                create("T1", TransactionType::Transfer, "A", "B", 600),
                create("T2", TransactionType::Transfer, "A", "B", 600),
                create("W1", TransactionType::Withdraw, "C", "", 200),
                process("T1"),
                process("T2"),
                process("W1"),
            ])
            .await;

        assert_eq!(results.len(), 6);
        let status_of = |reference: &str| {
            results
                .iter()
                .filter(|r| r.command.reference() == reference)
                .last()
                .and_then(|r| r.result.as_ref().ok().map(|tx| tx.status()))
        };
        assert_eq!(status_of("T1"), Some(TransactionStatus::Completed));
        assert_eq!(status_of("T2"), None);
        assert_eq!(status_of("W1"), Some(TransactionStatus::Completed));

        let engine = processor.engine.engine();
        assert_eq!(engine.get_account_by_number("A").unwrap().balance(), usd(400));
        assert_eq!(engine.get_account_by_number("B").unwrap().balance(), usd(600));
        assert_eq!(engine.get_account_by_number("C").unwrap().balance(), usd(300));
        assert_eq!(
            engine.get_transaction_by_reference("T2").unwrap().status(),
            TransactionStatus::Failed
        );
    }
}
