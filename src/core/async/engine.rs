//! Async facade over the ledger engine
//!
//! This module provides `AsyncLedgerEngine`, which runs the blocking
//! `LedgerEngine` operations on tokio's blocking pool so async callers never
//! stall a runtime worker on a lock or a persistence call.
//!
//! # Timeouts
//!
//! Every operation gets a fresh `OperationContext` whose deadline is the
//! configured timeout. If the timeout fires first, the facade cancels the
//! context's token and waits for the blocking task: it either notices the
//! cancellation at its next check and stops before committing (`Cancelled`
//! or `Timeout`), or it was already committing and its result is returned.
//!
//! # Thread Safety
//!
//! The facade is cheap to clone (one `Arc`) and can be shared across tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::context::OperationContext;
use crate::core::engine::{LedgerEngine, NewTransaction};
use crate::core::traits::LedgerStore;
use crate::types::{Account, AccountSeed, LedgerCommand, LedgerError, Transaction, TransactionId};

/// Async, timeout-bounded access to a [`LedgerEngine`]
#[derive(Debug)]
pub struct AsyncLedgerEngine<S> {
    engine: Arc<LedgerEngine<S>>,
    timeout: Duration,
}

impl<S> Clone for AsyncLedgerEngine<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            timeout: self.timeout,
        }
    }
}

impl<S: LedgerStore + 'static> AsyncLedgerEngine<S> {
    /// Wrap `engine`, bounding every operation by `timeout`
    pub fn new(engine: Arc<LedgerEngine<S>>, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    /// The wrapped synchronous engine
    pub fn engine(&self) -> &Arc<LedgerEngine<S>> {
        &self.engine
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn create_transaction(
        &self,
        request: NewTransaction,
    ) -> Result<Transaction, LedgerError> {
        self.run("create transaction", move |engine, ctx| {
            engine.create_transaction_with(request, ctx)
        })
        .await
    }

    pub async fn process_transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.run("process transaction", move |engine, ctx| {
            engine.process_transaction_with(id, ctx)
        })
        .await
    }

    pub async fn cancel_transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.run("cancel transaction", move |engine, ctx| {
            engine.cancel_transaction_with(id, ctx)
        })
        .await
    }

    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.run("get transaction", move |engine, _| engine.get_transaction(id))
            .await
    }

    pub async fn seed_account(&self, seed: AccountSeed) -> Result<Account, LedgerError> {
        self.run("seed account", move |engine, _| engine.seed_account(&seed))
            .await
    }

    /// Run one replayed command
    pub async fn execute(&self, command: LedgerCommand) -> Result<Transaction, LedgerError> {
        self.run("execute command", move |engine, ctx| {
            engine.execute(&command, ctx)
        })
        .await
    }

    /// Run `operation` on the blocking pool under this facade's timeout
    async fn run<R, F>(&self, operation: &'static str, f: F) -> Result<R, LedgerError>
    where
        R: Send + 'static,
        F: FnOnce(&LedgerEngine<S>, &OperationContext) -> Result<R, LedgerError> + Send + 'static,
    {
        let token = CancellationToken::new();
        let ctx = OperationContext::with_timeout(self.timeout).with_cancellation(token.clone());
        let engine = Arc::clone(&self.engine);

        let mut task = tokio::task::spawn_blocking(move || f(&engine, &ctx));

        let joined = match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                // A task already inside the commit still finishes; report what it did
                token.cancel();
                warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "operation timed out, waiting for it to stop"
                );
                task.await
            }
        };

        joined.unwrap_or_else(|join_error| {
            Err(LedgerError::TaskFailed {
                operation: operation.to_string(),
                message: join_error.to_string(),
            })
        })
    }
}
