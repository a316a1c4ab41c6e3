//! Account administration
//!
//! Opening, renaming, status changes and removal of accounts. Every change
//! to an existing account runs under that account's lock, so it cannot
//! interleave with a balance change committed by transaction processing.

use crate::core::context::OperationContext;
use crate::core::engine::LedgerEngine;
use crate::core::traits::LedgerStore;
use crate::types::{Account, AccountId, LedgerError, Money, Page, PageRequest};
use tracing::info;

impl<S: LedgerStore> LedgerEngine<S> {
    /// Open a new active account
    ///
    /// # Errors
    ///
    /// - `Validation` if the number or holder name is blank, or the initial
    ///   balance is negative
    /// - `DuplicateAccountNumber` if the number is already taken
    pub fn open_account(
        &self,
        number: &str,
        holder_name: &str,
        initial_balance: Money,
    ) -> Result<Account, LedgerError> {
        let number = number.trim();
        let holder_name = holder_name.trim();

        if number.is_empty() {
            return Err(LedgerError::validation("account number must not be blank"));
        }
        if holder_name.is_empty() {
            return Err(LedgerError::validation("holder name must not be blank"));
        }
        if initial_balance.is_negative() {
            return Err(LedgerError::validation(format!(
                "initial balance must not be negative, got {}",
                initial_balance
            )));
        }

        let account = Account::new(number, holder_name, initial_balance);
        self.store.create_account(&account)?;

        info!(
            account = %account.id(),
            number = account.number(),
            balance = %account.balance(),
            "account opened"
        );
        Ok(account)
    }

    pub fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.store.get_account_by_id(id)
    }

    pub fn get_account_by_number(&self, number: &str) -> Result<Account, LedgerError> {
        self.store.find_account_by_number(number)
    }

    /// Accounts ordered by number
    pub fn list_accounts(&self, page: PageRequest) -> Result<Page<Account>, LedgerError> {
        self.store.list_accounts(page)
    }

    /// Change the holder name
    ///
    /// # Errors
    ///
    /// `Validation` if the new name is blank, `NotFound` if the account is gone.
    pub fn rename_account(&self, id: AccountId, holder_name: &str) -> Result<Account, LedgerError> {
        let holder_name = holder_name.trim();
        if holder_name.is_empty() {
            return Err(LedgerError::validation("holder name must not be blank"));
        }

        self.modify_account(id, |account| account.rename(holder_name))
    }

    pub fn block_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.modify_account(id, Account::block)
    }

    pub fn activate_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.modify_account(id, Account::activate)
    }

    pub fn deactivate_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.modify_account(id, Account::deactivate)
    }

    /// Remove an account
    ///
    /// Transactions that reference it remain; processing one of them later
    /// fails with `NotFound`.
    pub fn delete_account(&self, id: AccountId) -> Result<(), LedgerError> {
        self.account_locks
            .with_locked(&[id], &OperationContext::background(), || {
                self.store.delete_account(id)
            })?;
        self.account_locks.remove(&id);

        info!(account = %id, "account deleted");
        Ok(())
    }

    fn modify_account(
        &self,
        id: AccountId,
        change: impl FnOnce(&mut Account),
    ) -> Result<Account, LedgerError> {
        let account = self
            .account_locks
            .with_locked(&[id], &OperationContext::background(), || {
                let mut account = self.store.get_account_by_id(id)?;
                change(&mut account);
                self.store.update_account(&account)?;
                Ok(account)
            })?;

        info!(
            account = %id,
            status = %account.status(),
            holder = account.holder_name(),
            "account updated"
        );
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::InMemoryStore;
    use crate::types::{AccountStatus, Currency};
    use rstest::rstest;
    use std::sync::Arc;

    fn usd(amount: i64) -> Money {
        Money::new(amount, Currency::Usd)
    }

    fn engine() -> LedgerEngine<InMemoryStore> {
        LedgerEngine::new(Arc::new(InMemoryStore::new()))
    }

    #[test]
    fn test_open_account() {
        let engine = engine();

        let account = engine.open_account(" ACC-001 ", "Alice", usd(500)).unwrap();

        assert_eq!(account.number(), "ACC-001");
        assert_eq!(account.status(), AccountStatus::Active);
        assert_eq!(engine.get_account(account.id()).unwrap(), account);
        assert_eq!(engine.get_account_by_number("ACC-001").unwrap(), account);
    }

    #[rstest]
    #[case::blank_number("", "Alice", 0)]
    #[case::blank_holder("ACC-001", "   ", 0)]
    #[case::negative_balance("ACC-001", "Alice", -1)]
    fn test_open_account_validation(
        #[case] number: &str,
        #[case] holder: &str,
        #[case] balance: i64,
    ) {
        let engine = engine();
        assert!(matches!(
            engine.open_account(number, holder, usd(balance)),
            Err(LedgerError::Validation { .. })
        ));
    }

    #[test]
    fn test_open_account_duplicate_number() {
        let engine = engine();
        engine.open_account("ACC-001", "Alice", usd(0)).unwrap();

        assert!(matches!(
            engine.open_account("ACC-001", "Bob", usd(0)),
            Err(LedgerError::DuplicateAccountNumber { .. })
        ));
    }

    #[test]
    fn test_status_changes() {
        let engine = engine();
        let account = engine.open_account("ACC-001", "Alice", usd(0)).unwrap();

        let blocked = engine.block_account(account.id()).unwrap();
        assert_eq!(blocked.status(), AccountStatus::Blocked);
        assert!(blocked.updated_at() > account.updated_at());

        let inactive = engine.deactivate_account(account.id()).unwrap();
        assert_eq!(inactive.status(), AccountStatus::Inactive);

        let active = engine.activate_account(account.id()).unwrap();
        assert_eq!(active.status(), AccountStatus::Active);
        assert_eq!(engine.get_account(account.id()).unwrap(), active);
    }

    #[test]
    fn test_rename_account() {
        let engine = engine();
        let account = engine.open_account("ACC-001", "Alice", usd(0)).unwrap();

        let renamed = engine.rename_account(account.id(), "Alice Smith").unwrap();
        assert_eq!(renamed.holder_name(), "Alice Smith");

        assert!(matches!(
            engine.rename_account(account.id(), ""),
            Err(LedgerError::Validation { .. })
        ));
    }

    #[test]
    fn test_delete_account() {
        let engine = engine();
        let account = engine.open_account("ACC-001", "Alice", usd(0)).unwrap();

        engine.delete_account(account.id()).unwrap();

        assert!(matches!(
            engine.get_account(account.id()),
            Err(LedgerError::NotFound { .. })
        ));
        assert!(matches!(
            engine.delete_account(account.id()),
            Err(LedgerError::NotFound { .. })
        ));
        assert!(matches!(
            engine.block_account(account.id()),
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[test]
    fn test_list_accounts_paginates() {
        let engine = engine();
        for number in ["ACC-003", "ACC-001", "ACC-002"] {
            engine.open_account(number, "holder", usd(0)).unwrap();
        }

        let page = engine.list_accounts(PageRequest::new(2, 2)).unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].number(), "ACC-003");
    }
}
