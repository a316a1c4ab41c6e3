//! Concurrency integration tests
//!
//! Many threads drive one `LedgerEngine` at once. The engine must never
//! overdraw an account, must apply each transaction at most once, and must
//! never let a reader observe half of a transfer.

use ledger_engine::types::{Currency, LedgerError, Money, TransactionStatus};
use ledger_engine::{InMemoryStore, LedgerEngine, NewTransaction};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn usd(amount: i64) -> Money {
    Money::new(amount, Currency::Usd)
}

fn engine() -> Arc<LedgerEngine<InMemoryStore>> {
    Arc::new(LedgerEngine::new(Arc::new(InMemoryStore::new())))
}

#[test]
fn test_concurrent_withdrawals_never_overdraw() {
    let engine = engine();
    let account = engine.open_account("ACC-001", "Alice", usd(1000)).unwrap();

    // 50 withdrawals of 1.00 against a 10.00 balance
    let ids: Vec<_> = (0..50)
        .map(|i| {
            engine
                .create_transaction(
                    NewTransaction::withdraw(account.id(), usd(100), "atm")
                        .with_reference(format!("W{}", i)),
                )
                .unwrap()
                .id()
        })
        .collect();

    thread::scope(|scope| {
        for id in &ids {
            let engine = &engine;
            scope.spawn(move || engine.process_transaction(*id));
        }
    });

    let completed = ids
        .iter()
        .filter(|id| engine.get_transaction(**id).unwrap().status() == TransactionStatus::Completed)
        .count();
    let failed = ids
        .iter()
        .filter(|id| engine.get_transaction(**id).unwrap().status() == TransactionStatus::Failed)
        .count();

    assert_eq!(completed, 10);
    assert_eq!(failed, 40);
    assert_eq!(engine.get_account(account.id()).unwrap().balance(), usd(0));
}

#[test]
fn test_double_processing_applies_once() {
    let engine = engine();
    let account = engine.open_account("ACC-001", "Alice", usd(0)).unwrap();
    let transaction = engine
        .create_transaction(NewTransaction::deposit(account.id(), usd(500), "salary"))
        .unwrap();

    let results: Vec<Result<_, LedgerError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = &engine;
                let id = transaction.id();
                scope.spawn(move || engine.process_transaction(id))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, LedgerError::InvalidState { .. })));
    assert_eq!(engine.get_account(account.id()).unwrap().balance(), usd(500));
}

#[test]
fn test_opposite_transfers_do_not_deadlock() {
    let engine = engine();
    let a = engine.open_account("ACC-001", "Alice", usd(100_000)).unwrap();
    let b = engine.open_account("ACC-002", "Bob", usd(100_000)).unwrap();

    let mut ids = Vec::new();
    for i in 0..100 {
        let (from, to) = if i % 2 == 0 { (a.id(), b.id()) } else { (b.id(), a.id()) };
        let transaction = engine
            .create_transaction(NewTransaction::transfer(from, to, usd(100 + i), "swap"))
            .unwrap();
        ids.push(transaction.id());
    }

    thread::scope(|scope| {
        for id in &ids {
            let engine = &engine;
            scope.spawn(move || engine.process_transaction(*id).unwrap());
        }
    });

    let total = engine.get_account(a.id()).unwrap().balance().amount()
        + engine.get_account(b.id()).unwrap().balance().amount();
    assert_eq!(total, 200_000);
    assert!(ids
        .iter()
        .all(|id| engine.get_transaction(*id).unwrap().status() == TransactionStatus::Completed));
}

#[test]
fn test_readers_never_see_half_a_transfer() {
    let engine = engine();
    let a = engine.open_account("ACC-001", "Alice", usd(50_000)).unwrap();
    let b = engine.open_account("ACC-002", "Bob", usd(50_000)).unwrap();
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        let reader = scope.spawn(|| {
            let mut observations = 0;
            while !done.load(Ordering::Acquire) {
                let total: i64 = engine
                    .store()
                    .all_accounts()
                    .iter()
                    .map(|account| account.balance().amount())
                    .sum();
                assert_eq!(total, 100_000);
                observations += 1;
            }
            observations
        });

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let engine = &engine;
                let (from, to) = if w % 2 == 0 { (a.id(), b.id()) } else { (b.id(), a.id()) };
                scope.spawn(move || {
                    for _ in 0..200 {
                        let transaction = engine
                            .create_transaction(NewTransaction::transfer(from, to, usd(7), "tick"))
                            .unwrap();
                        engine.process_transaction(transaction.id()).unwrap();
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }
        done.store(true, Ordering::Release);
        assert!(reader.join().unwrap() > 0);
    });
}
