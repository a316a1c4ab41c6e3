//! Error types for the ledger engine
//!
//! This module defines every error that can surface from the ledger core,
//! the persistence port and the replay tooling.
//!
//! # Error Categories
//!
//! - **Lookup/Validation Errors**: missing entities, malformed requests, illegal state transitions
//! - **Balance Errors**: inactive accounts, insufficient funds, currency mismatches, overflow
//! - **Infrastructure Errors**: persistence failures, deadlines, cancellation
//! - **File Errors**: CSV replay input that cannot be read or parsed
//!
//! Infrastructure errors are retryable: the transaction they interrupted is
//! left pending. Balance errors are final: the transaction is marked failed.

use super::money::{Currency, Money};
use thiserror::Error;

/// Main error type for the ledger engine
///
/// Each variant carries enough context for a caller to tell "retry later"
/// apart from "never retry" apart from "already handled".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// The requested entity does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of entity ("account", "transaction")
        entity: &'static str,
        /// Identifier used for the lookup
        id: String,
    },

    /// The request is malformed (missing account id, bad amount, ...)
    #[error("validation error: {message}")]
    Validation {
        /// Description of the violated rule
        message: String,
    },

    /// Unknown transaction type
    #[error("invalid transaction type '{tx_type}'")]
    InvalidType {
        /// The type string that could not be recognised
        tx_type: String,
    },

    /// Operation attempted outside its required state
    #[error("{message}")]
    InvalidState {
        /// Description of the violated precondition
        message: String,
    },

    /// Debit or credit against an account that is not active
    #[error("account {account} is not active (status: {status})")]
    AccountNotActive {
        /// Account identifier
        account: String,
        /// Current account status
        status: String,
    },

    /// Debit larger than the current balance
    #[error("insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Account identifier
        account: String,
        /// Balance at the time of the debit
        balance: Money,
        /// Requested debit amount
        requested: Money,
    },

    /// Arithmetic between two different currencies
    #[error("currency mismatch in {operation}: expected {expected}, got {actual}")]
    CurrencyMismatch {
        /// Operation that was attempted
        operation: String,
        /// Currency of the left-hand value (or the account)
        expected: Currency,
        /// Currency of the right-hand value
        actual: Currency,
    },

    /// Minor-unit amount would leave the i64 range
    #[error("arithmetic overflow in {operation}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
    },

    /// Account number already in use
    #[error("account number '{number}' already exists")]
    DuplicateAccountNumber {
        /// The conflicting account number
        number: String,
    },

    /// Transaction reference already in use
    #[error("transaction reference '{reference}' already exists")]
    DuplicateReference {
        /// The conflicting reference
        reference: String,
    },

    /// Opaque failure reported by the storage adapter
    #[error("persistence error: {message}")]
    Persistence {
        /// Adapter-provided description
        message: String,
    },

    /// Operation deadline expired before it could commit
    #[error("{operation} timed out")]
    Timeout {
        /// Operation that ran out of time
        operation: String,
    },

    /// Operation was cancelled by its caller
    #[error("{operation} was cancelled")]
    Cancelled {
        /// Operation that was cancelled
        operation: String,
    },

    /// Background task running an operation failed to complete
    #[error("{operation} task failed: {message}")]
    TaskFailed {
        /// Operation the task was running
        operation: String,
        /// Join error description
        message: String,
    },

    /// Replay input file not found
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error while reading or writing replay files
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error in replay input
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Parse {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::Parse {
            line,
            message: error.to_string(),
        }
    }
}

impl From<csv_async::Error> for LedgerError {
    fn from(error: csv_async::Error) -> Self {
        LedgerError::Parse {
            line: None,
            message: error.to_string(),
        }
    }
}

impl LedgerError {
    /// Whether the failure is transient and the operation may be retried
    ///
    /// Retryable failures never mark a transaction as failed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::Persistence { .. }
                | LedgerError::Timeout { .. }
                | LedgerError::Cancelled { .. }
                | LedgerError::TaskFailed { .. }
        )
    }

    /// Create a NotFound error for an account
    pub fn account_not_found(id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity: "account",
            id: id.to_string(),
        }
    }

    /// Create a NotFound error for a transaction
    pub fn transaction_not_found(id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity: "transaction",
            id: id.to_string(),
        }
    }

    /// Create a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation {
            message: message.into(),
        }
    }

    /// Create an InvalidType error
    pub fn invalid_type(tx_type: &str) -> Self {
        LedgerError::InvalidType {
            tx_type: tx_type.to_string(),
        }
    }

    /// Create an InvalidState error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        LedgerError::InvalidState {
            message: message.into(),
        }
    }

    /// Create an AccountNotActive error
    pub fn account_not_active(account: impl ToString, status: impl ToString) -> Self {
        LedgerError::AccountNotActive {
            account: account.to_string(),
            status: status.to_string(),
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: impl ToString, balance: Money, requested: Money) -> Self {
        LedgerError::InsufficientFunds {
            account: account.to_string(),
            balance,
            requested,
        }
    }

    /// Create a CurrencyMismatch error
    pub fn currency_mismatch(operation: &str, expected: Currency, actual: Currency) -> Self {
        LedgerError::CurrencyMismatch {
            operation: operation.to_string(),
            expected,
            actual,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
        }
    }

    /// Create a Persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        LedgerError::Persistence {
            message: message.into(),
        }
    }

    /// Create a Timeout error
    pub fn timeout(operation: &str) -> Self {
        LedgerError::Timeout {
            operation: operation.to_string(),
        }
    }

    /// Create a Cancelled error
    pub fn cancelled(operation: &str) -> Self {
        LedgerError::Cancelled {
            operation: operation.to_string(),
        }
    }
}
