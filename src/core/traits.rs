//! Persistence port for accounts and transactions
//!
//! The ledger core never owns durable state. It borrows accounts and
//! transactions through these traits for the duration of one operation and
//! hands the results back through [`LedgerStore::commit`]. A storage adapter
//! (relational database, in-memory map, ...) implements them.

use crate::types::{
    Account, AccountId, LedgerError, Page, PageRequest, Transaction, TransactionId,
};

/// Read/write access to accounts
pub trait AccountRepository: Send + Sync {
    /// Insert a new account
    ///
    /// Fails with `DuplicateAccountNumber` if the number is taken.
    fn create_account(&self, account: &Account) -> Result<(), LedgerError>;

    /// Load an account by id, `NotFound` if absent
    fn get_account_by_id(&self, id: AccountId) -> Result<Account, LedgerError>;

    /// Load an account by its unique number, `NotFound` if absent
    fn find_account_by_number(&self, number: &str) -> Result<Account, LedgerError>;

    /// Replace a stored account, `NotFound` if absent
    fn update_account(&self, account: &Account) -> Result<(), LedgerError>;

    /// Remove an account, `NotFound` if absent
    fn delete_account(&self, id: AccountId) -> Result<(), LedgerError>;

    /// Accounts ordered by number
    fn list_accounts(&self, page: PageRequest) -> Result<Page<Account>, LedgerError>;
}

/// Read/write access to transactions
pub trait TransactionRepository: Send + Sync {
    /// Insert a new transaction
    ///
    /// Fails with `DuplicateReference` if its reference is taken.
    fn create_transaction(&self, transaction: &Transaction) -> Result<(), LedgerError>;

    /// Load a transaction by id, `NotFound` if absent
    fn get_transaction_by_id(&self, id: TransactionId) -> Result<Transaction, LedgerError>;

    /// Load a transaction by its unique reference, `NotFound` if absent
    fn find_transaction_by_reference(&self, reference: &str) -> Result<Transaction, LedgerError>;

    /// Replace a stored transaction, `NotFound` if absent
    fn update_transaction(&self, transaction: &Transaction) -> Result<(), LedgerError>;

    /// Transactions touching `account`, newest first
    fn list_account_transactions(
        &self,
        account: AccountId,
        page: PageRequest,
    ) -> Result<Page<Transaction>, LedgerError>;

    /// Every transaction, oldest first
    fn list_transactions(&self, page: PageRequest) -> Result<Page<Transaction>, LedgerError>;
}

/// Everything written by one processing step
#[derive(Debug, Clone)]
pub struct Changeset {
    /// Accounts whose balances changed (may be empty)
    pub accounts: Vec<Account>,
    /// The transaction in its new state
    pub transaction: Transaction,
}

/// Full persistence port used by the ledger engine
pub trait LedgerStore: AccountRepository + TransactionRepository {
    /// Write a changeset as one unit
    ///
    /// Either every account and the transaction are stored, or nothing is.
    /// Readers never observe a partially applied changeset.
    fn commit(&self, changes: Changeset) -> Result<(), LedgerError>;
}
