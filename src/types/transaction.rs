//! Transaction-related types for the ledger engine
//!
//! This module defines the Transaction entity and its state machine. A
//! transaction is created `Pending` and moves exactly once into one of the
//! terminal states `Completed`, `Failed` or `Cancelled`.

use super::account::AccountId;
use super::error::LedgerError;
use super::money::Money;
use super::touch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Creates a new random `TransactionId`
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `TransactionId` from an existing UUID
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Transaction types supported by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Credit funds to the destination account
    ///
    /// Requires `to_account_id`; `from_account_id` stays unset.
    Deposit,

    /// Debit funds from the source account
    ///
    /// Requires `from_account_id`; `to_account_id` stays unset.
    Withdraw,

    /// Move funds from the source account to the destination account
    ///
    /// Requires both account ids. The debit is always attempted first.
    Transfer,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Deposit => write!(f, "deposit"),
            TransactionType::Withdraw => write!(f, "withdraw"),
            TransactionType::Transfer => write!(f, "transfer"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deposit" => Ok(TransactionType::Deposit),
            "withdraw" | "withdrawal" => Ok(TransactionType::Withdraw),
            "transfer" => Ok(TransactionType::Transfer),
            _ => Err(LedgerError::invalid_type(s.trim())),
        }
    }
}

/// Transaction lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    /// Whether no further transition is allowed
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Completed => write!(f, "completed"),
            TransactionStatus::Failed => write!(f, "failed"),
            TransactionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// An intended money movement
///
/// Construct through [`Transaction::deposit`], [`Transaction::withdraw`] or
/// [`Transaction::transfer`] so the account ids always match the type.
/// The transition methods refuse to leave a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    tx_type: TransactionType,
    status: TransactionStatus,
    amount: Money,
    from_account_id: Option<AccountId>,
    to_account_id: Option<AccountId>,
    description: String,
    reference: Option<String>,
    processed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Pending transaction with no accounts attached
    pub(crate) fn new(tx_type: TransactionType, amount: Money, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Transaction {
            id: TransactionId::new(),
            tx_type,
            status: TransactionStatus::Pending,
            amount,
            from_account_id: None,
            to_account_id: None,
            description: description.into(),
            reference: None,
            processed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pending deposit into `to`
    pub fn deposit(to: AccountId, amount: Money, description: impl Into<String>) -> Self {
        let mut tx = Self::new(TransactionType::Deposit, amount, description);
        tx.to_account_id = Some(to);
        tx
    }

    /// Pending withdrawal from `from`
    pub fn withdraw(from: AccountId, amount: Money, description: impl Into<String>) -> Self {
        let mut tx = Self::new(TransactionType::Withdraw, amount, description);
        tx.from_account_id = Some(from);
        tx
    }

    /// Pending transfer from `from` to `to`
    pub fn transfer(
        from: AccountId,
        to: AccountId,
        amount: Money,
        description: impl Into<String>,
    ) -> Self {
        let mut tx = Self::new(TransactionType::Transfer, amount, description);
        tx.from_account_id = Some(from);
        tx.to_account_id = Some(to);
        tx
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn tx_type(&self) -> TransactionType {
        self.tx_type
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn from_account_id(&self) -> Option<AccountId> {
        self.from_account_id
    }

    pub fn to_account_id(&self) -> Option<AccountId> {
        self.to_account_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }

    /// Every account this transaction touches, source first
    pub fn account_ids(&self) -> Vec<AccountId> {
        self.from_account_id
            .into_iter()
            .chain(self.to_account_id)
            .collect()
    }

    /// Whether `account` is the source or destination
    pub fn involves(&self, account: AccountId) -> bool {
        self.from_account_id == Some(account) || self.to_account_id == Some(account)
    }

    /// Mark the transaction as applied
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the transaction is pending.
    pub fn complete(&mut self) -> Result<(), LedgerError> {
        self.transition(TransactionStatus::Completed)?;
        self.processed_at = Some(self.updated_at);
        Ok(())
    }

    /// Mark the transaction as rejected during processing
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the transaction is pending.
    pub fn fail(&mut self) -> Result<(), LedgerError> {
        self.transition(TransactionStatus::Failed)?;
        self.processed_at = Some(self.updated_at);
        Ok(())
    }

    /// Withdraw the transaction before processing
    ///
    /// `processed_at` is left unset.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the transaction is pending.
    pub fn cancel(&mut self) -> Result<(), LedgerError> {
        self.transition(TransactionStatus::Cancelled)
    }

    pub fn set_reference(&mut self, reference: impl Into<String>) {
        self.reference = Some(reference.into());
        self.updated_at = touch(self.updated_at);
    }

    fn transition(&mut self, next: TransactionStatus) -> Result<(), LedgerError> {
        if self.status.is_terminal() {
            return Err(LedgerError::invalid_state(format!(
                "transaction {} is already {}, cannot become {}",
                self.id, self.status, next
            )));
        }

        self.status = next;
        self.updated_at = touch(self.updated_at);
        Ok(())
    }
}
