//! Core business logic module
//!
//! This module contains the ledger processing components:
//! - `traits` - Persistence port implemented by storage adapters
//! - `store` - In-memory storage adapter
//! - `context` - Per-operation deadline and cancellation
//! - `locks` - Keyed mutual exclusion over accounts and transactions
//! - `engine` - Transaction creation, processing and cancellation
//! - `accounts` - Account administration
//! - `commands` - Execution of replayed commands
//! - `async` - Async facade and batch execution

pub mod accounts;
pub mod r#async;
pub mod commands;
pub mod context;
pub mod engine;
pub mod locks;
pub mod store;
pub mod traits;

pub use context::OperationContext;
pub use engine::{LedgerEngine, NewTransaction};
pub use locks::KeyedLocks;
pub use r#async::{AsyncLedgerEngine, BatchProcessor, ProcessingResult};
pub use store::InMemoryStore;
pub use traits::{AccountRepository, Changeset, LedgerStore, TransactionRepository};
