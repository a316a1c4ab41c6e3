//! Transaction processing engine
//!
//! This module provides the `LedgerEngine`, which orchestrates transaction
//! creation, processing and cancellation against a [`LedgerStore`].
//!
//! The engine enforces business rules such as:
//! - Only pending transactions are processed or cancelled
//! - Transfers debit the source before crediting the destination
//! - Account changes and the transaction status are committed together
//! - Business rejections are recorded as `Failed`, infrastructure errors
//!   leave the transaction `Pending`

use crate::core::context::OperationContext;
use crate::core::locks::KeyedLocks;
use crate::core::traits::{Changeset, LedgerStore};
use crate::types::{
    Account, AccountId, LedgerError, Money, Page, PageRequest, Transaction, TransactionId,
    TransactionType,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Request to create a pending transaction
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub tx_type: TransactionType,
    pub amount: Money,
    pub from_account_id: Option<AccountId>,
    pub to_account_id: Option<AccountId>,
    pub description: String,
    pub reference: Option<String>,
}

impl NewTransaction {
    pub fn deposit(to: AccountId, amount: Money, description: impl Into<String>) -> Self {
        Self {
            tx_type: TransactionType::Deposit,
            amount,
            from_account_id: None,
            to_account_id: Some(to),
            description: description.into(),
            reference: None,
        }
    }

    pub fn withdraw(from: AccountId, amount: Money, description: impl Into<String>) -> Self {
        Self {
            tx_type: TransactionType::Withdraw,
            amount,
            from_account_id: Some(from),
            to_account_id: None,
            description: description.into(),
            reference: None,
        }
    }

    pub fn transfer(
        from: AccountId,
        to: AccountId,
        amount: Money,
        description: impl Into<String>,
    ) -> Self {
        Self {
            tx_type: TransactionType::Transfer,
            amount,
            from_account_id: Some(from),
            to_account_id: Some(to),
            description: description.into(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Build the pending transaction, checking the account ids fit the type
    fn build(self) -> Result<Transaction, LedgerError> {
        if !self.amount.is_positive() {
            return Err(LedgerError::validation(format!(
                "transaction amount must be positive, got {}",
                self.amount
            )));
        }

        let mut transaction = match (self.tx_type, self.from_account_id, self.to_account_id) {
            (TransactionType::Deposit, None, Some(to)) => {
                Transaction::deposit(to, self.amount, self.description)
            }
            (TransactionType::Deposit, _, _) => {
                return Err(LedgerError::validation(
                    "deposit requires to_account_id and no from_account_id",
                ))
            }
            (TransactionType::Withdraw, Some(from), None) => {
                Transaction::withdraw(from, self.amount, self.description)
            }
            (TransactionType::Withdraw, _, _) => {
                return Err(LedgerError::validation(
                    "withdrawal requires from_account_id and no to_account_id",
                ))
            }
            (TransactionType::Transfer, Some(from), Some(to)) if from == to => {
                return Err(LedgerError::validation(
                    "transfer source and destination must differ",
                ))
            }
            (TransactionType::Transfer, Some(from), Some(to)) => {
                Transaction::transfer(from, to, self.amount, self.description)
            }
            (TransactionType::Transfer, _, _) => {
                return Err(LedgerError::validation(
                    "both from_account_id and to_account_id are required for transfer",
                ))
            }
        };

        if let Some(reference) = self.reference {
            let reference = reference.trim();
            if reference.is_empty() {
                return Err(LedgerError::validation("reference must not be blank"));
            }
            transaction.set_reference(reference);
        }

        Ok(transaction)
    }
}

/// Transaction processing engine
///
/// Holds the persistence port plus two in-process lock maps: one keyed by
/// account id, held across the read-modify-commit cycle of every balance
/// change, and one keyed by transaction id, so the same transaction cannot
/// be processed (or processed and cancelled) concurrently.
#[derive(Debug)]
pub struct LedgerEngine<S> {
    pub(crate) store: Arc<S>,
    pub(crate) account_locks: KeyedLocks<AccountId>,
    transaction_locks: KeyedLocks<TransactionId>,
}

impl<S: LedgerStore> LedgerEngine<S> {
    /// Create an engine over `store`
    pub fn new(store: Arc<S>) -> Self {
        LedgerEngine {
            store,
            account_locks: KeyedLocks::new(),
            transaction_locks: KeyedLocks::new(),
        }
    }

    /// The persistence port this engine writes through
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Create a pending transaction
    ///
    /// # Errors
    ///
    /// - `Validation` if the amount is not positive, the account ids do not
    ///   fit the type, or a transfer names the same account twice
    /// - `DuplicateReference` if the reference is already taken
    pub fn create_transaction(&self, request: NewTransaction) -> Result<Transaction, LedgerError> {
        self.create_transaction_with(request, &OperationContext::background())
    }

    pub fn create_transaction_with(
        &self,
        request: NewTransaction,
        ctx: &OperationContext,
    ) -> Result<Transaction, LedgerError> {
        let transaction = request.build()?;

        ctx.check("create transaction")?;
        self.store.create_transaction(&transaction)?;

        debug!(
            transaction = %transaction.id(),
            tx_type = %transaction.tx_type(),
            amount = %transaction.amount(),
            "transaction created"
        );
        Ok(transaction)
    }

    /// Apply a pending transaction to its account(s)
    ///
    /// Deposits credit the destination, withdrawals debit the source and
    /// transfers debit the source then credit the destination. On success
    /// the accounts and the `Completed` transaction are committed as one
    /// unit and the updated transaction is returned.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the transaction does not exist
    /// - `InvalidState` if the transaction is not pending (nothing changes)
    /// - `NotFound`, `AccountNotActive`, `InsufficientFunds`,
    ///   `CurrencyMismatch`, `ArithmeticOverflow`: the transaction is
    ///   stored as `Failed` and the underlying error is returned
    /// - `Timeout`, `Cancelled`, `Persistence`: nothing is committed and
    ///   the transaction stays pending
    pub fn process_transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.process_transaction_with(id, &OperationContext::background())
    }

    pub fn process_transaction_with(
        &self,
        id: TransactionId,
        ctx: &OperationContext,
    ) -> Result<Transaction, LedgerError> {
        let processed = self.transaction_locks.with_locked(&[id], ctx, || {
            ctx.check("load transaction")?;
            let transaction = self.store.get_transaction_by_id(id)?;

            if !transaction.is_pending() {
                return Err(LedgerError::invalid_state(
                    "transaction is not in pending status",
                ));
            }

            let account_ids = transaction.account_ids();
            self.account_locks.with_locked(&account_ids, ctx, || {
                match self.apply(&transaction, ctx) {
                    Ok(accounts) => self.commit_completed(transaction, accounts, ctx),
                    Err(err) if err.is_retryable() => Err(err),
                    Err(err) => {
                        self.commit_failed(transaction, &err, ctx)?;
                        Err(err)
                    }
                }
            })
        });

        // Anything but a retryable error leaves the transaction terminal or absent
        if !matches!(&processed, Err(err) if err.is_retryable()) {
            self.transaction_locks.remove(&id);
        }

        processed
    }

    /// Cancel a pending transaction
    ///
    /// Balances are never touched and `processed_at` stays unset.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the transaction does not exist
    /// - `InvalidState` if the transaction is not pending
    pub fn cancel_transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.cancel_transaction_with(id, &OperationContext::background())
    }

    pub fn cancel_transaction_with(
        &self,
        id: TransactionId,
        ctx: &OperationContext,
    ) -> Result<Transaction, LedgerError> {
        let cancelled = self.transaction_locks.with_locked(&[id], ctx, || {
            ctx.check("load transaction")?;
            let mut transaction = self.store.get_transaction_by_id(id)?;

            if !transaction.is_pending() {
                return Err(LedgerError::invalid_state(
                    "only pending transactions can be cancelled",
                ));
            }

            transaction.cancel()?;

            ctx.check("commit")?;
            self.store.commit(Changeset {
                accounts: Vec::new(),
                transaction: transaction.clone(),
            })?;

            info!(transaction = %id, "transaction cancelled");
            Ok(transaction)
        })?;

        self.transaction_locks.remove(&id);
        Ok(cancelled)
    }

    pub fn get_transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.store.get_transaction_by_id(id)
    }

    pub fn get_transaction_by_reference(&self, reference: &str) -> Result<Transaction, LedgerError> {
        self.store.find_transaction_by_reference(reference)
    }

    /// Every transaction, oldest first, one page at a time
    pub fn list_transactions(&self, page: PageRequest) -> Result<Page<Transaction>, LedgerError> {
        self.store.list_transactions(page)
    }

    /// Transactions touching `account`, newest first
    ///
    /// # Errors
    ///
    /// `NotFound` if the account does not exist.
    pub fn account_transactions(
        &self,
        account: AccountId,
        page: PageRequest,
    ) -> Result<Page<Transaction>, LedgerError> {
        self.store.get_account_by_id(account)?;
        self.store.list_account_transactions(account, page)
    }

    /// Load the implicated accounts and mutate them in memory
    ///
    /// Must run while the account locks are held. Nothing is written.
    fn apply(
        &self,
        transaction: &Transaction,
        ctx: &OperationContext,
    ) -> Result<Vec<Account>, LedgerError> {
        let amount = transaction.amount();

        match transaction.tx_type() {
            TransactionType::Deposit => {
                let mut to = self.load_account(transaction.to_account_id(), "destination", ctx)?;
                to.credit(amount)?;
                Ok(vec![to])
            }
            TransactionType::Withdraw => {
                let mut from = self.load_account(transaction.from_account_id(), "source", ctx)?;
                from.debit(amount)?;
                Ok(vec![from])
            }
            TransactionType::Transfer => {
                // Two copies of one account would commit the credit over the debit
                if transaction.from_account_id().is_some()
                    && transaction.from_account_id() == transaction.to_account_id()
                {
                    return Err(LedgerError::validation(
                        "transfer source and destination must differ",
                    ));
                }
                let mut from = self.load_account(transaction.from_account_id(), "source", ctx)?;
                let mut to = self.load_account(transaction.to_account_id(), "destination", ctx)?;
                from.debit(amount)?;
                to.credit(amount)?;
                Ok(vec![from, to])
            }
        }
    }

    fn load_account(
        &self,
        id: Option<AccountId>,
        role: &str,
        ctx: &OperationContext,
    ) -> Result<Account, LedgerError> {
        let id = id.ok_or_else(|| {
            LedgerError::validation(format!("transaction has no {} account", role))
        })?;

        ctx.check("load account")?;
        self.store.get_account_by_id(id)
    }

    fn commit_completed(
        &self,
        mut transaction: Transaction,
        accounts: Vec<Account>,
        ctx: &OperationContext,
    ) -> Result<Transaction, LedgerError> {
        transaction.complete()?;

        ctx.check("commit")?;
        self.store.commit(Changeset {
            accounts,
            transaction: transaction.clone(),
        })?;

        info!(
            transaction = %transaction.id(),
            tx_type = %transaction.tx_type(),
            amount = %transaction.amount(),
            "transaction completed"
        );
        Ok(transaction)
    }

    fn commit_failed(
        &self,
        mut transaction: Transaction,
        cause: &LedgerError,
        ctx: &OperationContext,
    ) -> Result<(), LedgerError> {
        transaction.fail()?;

        ctx.check("commit")?;
        self.store.commit(Changeset {
            accounts: Vec::new(),
            transaction: transaction.clone(),
        })?;

        warn!(
            transaction = %transaction.id(),
            tx_type = %transaction.tx_type(),
            error = %cause,
            "transaction failed"
        );
        Ok(())
    }
}
