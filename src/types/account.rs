//! Account-related types for the ledger engine
//!
//! This module defines the Account entity, its identifier and status, and
//! the balance operations gated by that status.

use super::error::LedgerError;
use super::money::Money;
use super::touch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Creates a new random `AccountId`
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an `AccountId` from an existing UUID
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Account lifecycle status
///
/// Only `Active` accounts accept debits and credits. Any status can be
/// reached from any other through the explicit transition methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
    Blocked,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Inactive => write!(f, "inactive"),
            AccountStatus::Blocked => write!(f, "blocked"),
        }
    }
}

impl FromStr for AccountStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            "blocked" => Ok(AccountStatus::Blocked),
            other => Err(LedgerError::validation(format!(
                "unknown account status '{}'",
                other
            ))),
        }
    }
}

/// A bank account
///
/// The balance is only reachable through [`Account::debit`] and
/// [`Account::credit`], which enforce the status gate, the currency of the
/// account and the no-overdraft rule. Every mutation refreshes
/// `updated_at` to a strictly later instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    number: String,
    holder_name: String,
    balance: Money,
    status: AccountStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Account {
    /// Open a new active account
    ///
    /// The currency of `initial_balance` becomes the account currency.
    pub fn new(
        number: impl Into<String>,
        holder_name: impl Into<String>,
        initial_balance: Money,
    ) -> Self {
        let now = Utc::now();
        Account {
            id: AccountId::new(),
            number: number.into(),
            holder_name: holder_name.into(),
            balance: initial_balance,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn holder_name(&self) -> &str {
        &self.holder_name
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Remove funds from the account
    ///
    /// # Errors
    ///
    /// Checked in this order, leaving the balance untouched on failure:
    /// - `AccountNotActive` if the account is not active
    /// - `CurrencyMismatch` if `amount` is not in the account currency
    /// - `Validation` if `amount` is negative
    /// - `InsufficientFunds` if the balance is smaller than `amount`
    pub fn debit(&mut self, amount: Money) -> Result<(), LedgerError> {
        self.ensure_can_transact(amount, "debit")?;

        if self.balance.amount() < amount.amount() {
            return Err(LedgerError::insufficient_funds(
                &self.number,
                self.balance,
                amount,
            ));
        }

        self.balance = self.balance.subtract(amount)?;
        self.touch();
        Ok(())
    }

    /// Add funds to the account
    ///
    /// # Errors
    ///
    /// - `AccountNotActive` if the account is not active
    /// - `CurrencyMismatch` if `amount` is not in the account currency
    /// - `Validation` if `amount` is negative
    /// - `ArithmeticOverflow` if the balance would leave the i64 range
    pub fn credit(&mut self, amount: Money) -> Result<(), LedgerError> {
        self.ensure_can_transact(amount, "credit")?;

        self.balance = self.balance.add(amount)?;
        self.touch();
        Ok(())
    }

    pub fn block(&mut self) {
        self.status = AccountStatus::Blocked;
        self.touch();
    }

    pub fn activate(&mut self) {
        self.status = AccountStatus::Active;
        self.touch();
    }

    pub fn deactivate(&mut self) {
        self.status = AccountStatus::Inactive;
        self.touch();
    }

    /// Change the account holder name
    pub fn rename(&mut self, holder_name: impl Into<String>) {
        self.holder_name = holder_name.into();
        self.touch();
    }

    fn ensure_can_transact(&self, amount: Money, operation: &str) -> Result<(), LedgerError> {
        if !self.is_active() {
            return Err(LedgerError::account_not_active(&self.number, self.status));
        }

        if amount.currency() != self.balance.currency() {
            return Err(LedgerError::currency_mismatch(
                operation,
                self.balance.currency(),
                amount.currency(),
            ));
        }

        if amount.is_negative() {
            return Err(LedgerError::validation(format!(
                "{} amount must not be negative, got {}",
                operation, amount
            )));
        }

        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = touch(self.updated_at);
    }
}
