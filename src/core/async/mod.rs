//! Asynchronous access to the ledger engine
//!
//! The ledger engine itself is synchronous: every operation is a blocking
//! call against the persistence port. This module lets async callers use it
//! without blocking runtime workers.
//!
//! - **AsyncLedgerEngine**: runs each operation on tokio's blocking pool,
//!   bounded by a timeout that cancels the operation's context on expiry
//! - **BatchProcessor**: executes a batch of replayed commands as parallel
//!   groups that share no account or reference

pub mod batch_processor;
pub mod engine;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use engine::AsyncLedgerEngine;
