//! In-memory persistence adapter
//!
//! `InMemoryStore` implements the full persistence port on top of two
//! hash maps guarded by a single `RwLock`. A commit takes the write lock
//! once for every account and the transaction, so concurrent readers see
//! either the state before the commit or after it, never in between.
//!
//! It backs the replay CLI and the test suites; a relational adapter would
//! implement the same traits with a database transaction per commit.

use crate::core::traits::{AccountRepository, Changeset, LedgerStore, TransactionRepository};
use crate::types::{
    Account, AccountId, LedgerError, Page, PageRequest, Transaction, TransactionId,
};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<AccountId, Account>,
    transactions: HashMap<TransactionId, Transaction>,
}

impl Tables {
    fn number_taken(&self, number: &str, except: Option<AccountId>) -> bool {
        self.accounts
            .values()
            .any(|account| account.number() == number && Some(account.id()) != except)
    }

    fn reference_taken(&self, reference: &str, except: Option<TransactionId>) -> bool {
        self.transactions
            .values()
            .any(|tx| tx.reference() == Some(reference) && Some(tx.id()) != except)
    }
}

/// Thread-safe in-memory ledger storage
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored account, ordered by number
    pub fn all_accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.tables.read().accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.number().cmp(b.number()));
        accounts
    }

    /// Every stored transaction, oldest first
    pub fn all_transactions(&self) -> Vec<Transaction> {
        let mut transactions: Vec<Transaction> =
            self.tables.read().transactions.values().cloned().collect();
        transactions.sort_by_key(|tx| tx.created_at());
        transactions
    }
}

impl AccountRepository for InMemoryStore {
    fn create_account(&self, account: &Account) -> Result<(), LedgerError> {
        let mut tables = self.tables.write();

        if tables.number_taken(account.number(), None) {
            return Err(LedgerError::DuplicateAccountNumber {
                number: account.number().to_string(),
            });
        }
        if tables.accounts.contains_key(&account.id()) {
            return Err(LedgerError::persistence(format!(
                "account id {} already stored",
                account.id()
            )));
        }

        tables.accounts.insert(account.id(), account.clone());
        Ok(())
    }

    fn get_account_by_id(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.tables
            .read()
            .accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    fn find_account_by_number(&self, number: &str) -> Result<Account, LedgerError> {
        self.tables
            .read()
            .accounts
            .values()
            .find(|account| account.number() == number)
            .cloned()
            .ok_or_else(|| LedgerError::account_not_found(number))
    }

    fn update_account(&self, account: &Account) -> Result<(), LedgerError> {
        let mut tables = self.tables.write();

        if !tables.accounts.contains_key(&account.id()) {
            return Err(LedgerError::account_not_found(account.id()));
        }
        if tables.number_taken(account.number(), Some(account.id())) {
            return Err(LedgerError::DuplicateAccountNumber {
                number: account.number().to_string(),
            });
        }

        tables.accounts.insert(account.id(), account.clone());
        Ok(())
    }

    fn delete_account(&self, id: AccountId) -> Result<(), LedgerError> {
        self.tables
            .write()
            .accounts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    fn list_accounts(&self, page: PageRequest) -> Result<Page<Account>, LedgerError> {
        Ok(page.paginate(self.all_accounts()))
    }
}

impl TransactionRepository for InMemoryStore {
    fn create_transaction(&self, transaction: &Transaction) -> Result<(), LedgerError> {
        let mut tables = self.tables.write();

        if let Some(reference) = transaction.reference() {
            if tables.reference_taken(reference, None) {
                return Err(LedgerError::DuplicateReference {
                    reference: reference.to_string(),
                });
            }
        }
        if tables.transactions.contains_key(&transaction.id()) {
            return Err(LedgerError::persistence(format!(
                "transaction id {} already stored",
                transaction.id()
            )));
        }

        tables
            .transactions
            .insert(transaction.id(), transaction.clone());
        Ok(())
    }

    fn get_transaction_by_id(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.tables
            .read()
            .transactions
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::transaction_not_found(id))
    }

    fn find_transaction_by_reference(&self, reference: &str) -> Result<Transaction, LedgerError> {
        self.tables
            .read()
            .transactions
            .values()
            .find(|tx| tx.reference() == Some(reference))
            .cloned()
            .ok_or_else(|| LedgerError::transaction_not_found(reference))
    }

    fn update_transaction(&self, transaction: &Transaction) -> Result<(), LedgerError> {
        let mut tables = self.tables.write();

        if !tables.transactions.contains_key(&transaction.id()) {
            return Err(LedgerError::transaction_not_found(transaction.id()));
        }
        if let Some(reference) = transaction.reference() {
            if tables.reference_taken(reference, Some(transaction.id())) {
                return Err(LedgerError::DuplicateReference {
                    reference: reference.to_string(),
                });
            }
        }

        tables
            .transactions
            .insert(transaction.id(), transaction.clone());
        Ok(())
    }

    fn list_account_transactions(
        &self,
        account: AccountId,
        page: PageRequest,
    ) -> Result<Page<Transaction>, LedgerError> {
        let mut transactions: Vec<Transaction> = self
            .tables
            .read()
            .transactions
            .values()
            .filter(|tx| tx.involves(account))
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        Ok(page.paginate(transactions))
    }

    fn list_transactions(&self, page: PageRequest) -> Result<Page<Transaction>, LedgerError> {
        Ok(page.paginate(self.all_transactions()))
    }
}

impl LedgerStore for InMemoryStore {
    fn commit(&self, changes: Changeset) -> Result<(), LedgerError> {
        let mut tables = self.tables.write();

        // Validate everything before the first write
        for account in &changes.accounts {
            if !tables.accounts.contains_key(&account.id()) {
                return Err(LedgerError::account_not_found(account.id()));
            }
        }
        if !tables.transactions.contains_key(&changes.transaction.id()) {
            return Err(LedgerError::transaction_not_found(changes.transaction.id()));
        }

        for account in changes.accounts {
            tables.accounts.insert(account.id(), account);
        }
        tables
            .transactions
            .insert(changes.transaction.id(), changes.transaction);

        Ok(())
    }
}
