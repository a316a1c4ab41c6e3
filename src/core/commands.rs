//! Executing replayed commands
//!
//! Resolves account numbers and transaction references to ids, then runs
//! the matching engine operation.

use crate::core::context::OperationContext;
use crate::core::engine::{LedgerEngine, NewTransaction};
use crate::core::traits::LedgerStore;
use crate::types::{
    Account, AccountId, AccountSeed, AccountStatus, LedgerCommand, LedgerError, Transaction,
};

impl<S: LedgerStore> LedgerEngine<S> {
    /// Open a seeded account and move it into its seeded status
    pub fn seed_account(&self, seed: &AccountSeed) -> Result<Account, LedgerError> {
        let account = self.open_account(&seed.number, &seed.holder_name, seed.balance)?;

        match seed.status {
            AccountStatus::Active => Ok(account),
            AccountStatus::Inactive => self.deactivate_account(account.id()),
            AccountStatus::Blocked => self.block_account(account.id()),
        }
    }

    /// Run one command
    ///
    /// Returns the transaction as it stands after the command.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown account number or reference, otherwise
    /// whatever the underlying create/process/cancel operation returns.
    pub fn execute(
        &self,
        command: &LedgerCommand,
        ctx: &OperationContext,
    ) -> Result<Transaction, LedgerError> {
        match command {
            LedgerCommand::Create {
                reference,
                tx_type,
                from,
                to,
                amount,
                description,
            } => {
                let request = NewTransaction {
                    tx_type: *tx_type,
                    amount: *amount,
                    from_account_id: self.resolve_number(from.as_deref())?,
                    to_account_id: self.resolve_number(to.as_deref())?,
                    description: description.clone(),
                    reference: Some(reference.clone()),
                };
                self.create_transaction_with(request, ctx)
            }
            LedgerCommand::Process { reference } => {
                let transaction = self.get_transaction_by_reference(reference)?;
                self.process_transaction_with(transaction.id(), ctx)
            }
            LedgerCommand::Cancel { reference } => {
                let transaction = self.get_transaction_by_reference(reference)?;
                self.cancel_transaction_with(transaction.id(), ctx)
            }
        }
    }

    fn resolve_number(&self, number: Option<&str>) -> Result<Option<AccountId>, LedgerError> {
        number
            .map(|number| self.get_account_by_number(number).map(|account| account.id()))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::InMemoryStore;
    use crate::types::{Currency, Money, TransactionStatus, TransactionType};
    use rstest::rstest;
    use std::sync::Arc;

    fn usd(amount: i64) -> Money {
        Money::new(amount, Currency::Usd)
    }

    fn seed(number: &str, balance: i64, status: AccountStatus) -> AccountSeed {
        AccountSeed {
            number: number.to_string(),
            holder_name: format!("holder {}", number),
            balance: usd(balance),
            status,
        }
    }

    fn create(
        reference: &str,
        tx_type: TransactionType,
        from: Option<&str>,
        to: Option<&str>,
        amount: i64,
    ) -> LedgerCommand {
        LedgerCommand::Create {
            reference: reference.to_string(),
            tx_type,
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            amount: usd(amount),
            description: String::new(),
        }
    }

    fn process(reference: &str) -> LedgerCommand {
        LedgerCommand::Process {
            reference: reference.to_string(),
        }
    }

    #[rstest]
    #[case(AccountStatus::Active)]
    #[case(AccountStatus::Inactive)]
    #[case(AccountStatus::Blocked)]
    fn test_seed_account_applies_status(#[case] status: AccountStatus) {
        let engine = LedgerEngine::new(Arc::new(InMemoryStore::new()));

        let account = engine.seed_account(&seed("A", 100, status)).unwrap();

        assert_eq!(account.status(), status);
        assert_eq!(account.balance(), usd(100));
    }

    #[test]
    fn test_execute_create_then_process_transfer() {
        let engine = LedgerEngine::new(Arc::new(InMemoryStore::new()));
        engine.seed_account(&seed("A", 1000, AccountStatus::Active)).unwrap();
        engine.seed_account(&seed("B", 0, AccountStatus::Active)).unwrap();
        let ctx = OperationContext::background();

        let created = engine
            .execute(&create("T1", TransactionType::Transfer, Some("A"), Some("B"), 400), &ctx)
            .unwrap();
        assert_eq!(created.status(), TransactionStatus::Pending);
        assert_eq!(created.reference(), Some("T1"));

        let processed = engine.execute(&process("T1"), &ctx).unwrap();
        assert_eq!(processed.status(), TransactionStatus::Completed);
        assert_eq!(engine.get_account_by_number("A").unwrap().balance(), usd(600));
        assert_eq!(engine.get_account_by_number("B").unwrap().balance(), usd(400));
    }

    #[test]
    fn test_execute_unknown_account_number() {
        let engine = LedgerEngine::new(Arc::new(InMemoryStore::new()));
        let ctx = OperationContext::background();

        let err = engine
            .execute(&create("T1", TransactionType::Deposit, None, Some("ZZ"), 100), &ctx)
            .unwrap_err();

        assert!(matches!(err, LedgerError::NotFound { entity: "account", .. }));
        assert!(engine.get_transaction_by_reference("T1").is_err());
    }

    #[test]
    fn test_execute_cancel_unknown_reference() {
        let engine = LedgerEngine::new(Arc::new(InMemoryStore::new()));
        let cancel = LedgerCommand::Cancel {
            reference: "nope".to_string(),
        };

        assert!(matches!(
            engine.execute(&cancel, &OperationContext::background()),
            Err(LedgerError::NotFound { entity: "transaction", .. })
        ));
    }
}
