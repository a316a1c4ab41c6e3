//! Ledger Engine Library
//! # Overview
//!
//! This library provides an in-memory single-entry account ledger: accounts
//! with integer minor-unit balances, transactions with a
//! pending → completed/failed/cancelled lifecycle, and a processor that
//! applies balance changes atomically under per-account locks. A CSV replay
//! tool drives the ledger through a sync or an async strategy.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Money, Account, Transaction, commands)
//! - [`cli`] - CLI arguments parsing and log setup
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Transaction creation, processing and cancellation
//!   - [`core::accounts`] - Account administration
//!   - [`core::store`] - In-memory repositories with atomic commits
//!   - [`core::locks`] - Per-key locks acquired in a fixed order
//! - [`io`] - CSV command and seed readers, CSV output
//! - [`strategy`] - Sync and async replay pipelines
//!
//! # Transaction Types
//!
//! - **Deposit**: Credit the destination account
//! - **Withdraw**: Debit the source account (requires sufficient balance)
//! - **Transfer**: Debit the source and credit the destination as one unit
//!
//! # Transaction Status
//!
//! A transaction is created `pending`. Processing moves it to `completed`
//! (balances changed) or `failed` (balances untouched). Only a pending
//! transaction can be `cancelled`. Completed, failed and cancelled are final.

pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    AsyncLedgerEngine, InMemoryStore, LedgerEngine, LedgerStore, NewTransaction, OperationContext,
};
pub use io::{write_accounts_csv, write_transactions_csv};
pub use types::{
    Account, AccountId, AccountStatus, Currency, LedgerError, Money, Transaction, TransactionId,
    TransactionStatus, TransactionType,
};
