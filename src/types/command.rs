//! Replay input types
//!
//! Domain form of the rows read by the replay tool: ledger commands keyed
//! by a caller-chosen reference, and the accounts a replay starts from.

use super::account::AccountStatus;
use super::money::Money;
use super::transaction::TransactionType;

/// One replayed ledger operation
///
/// Accounts are named by number and transactions by reference, so an input
/// file never has to know generated ids.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerCommand {
    /// Create a pending transaction under `reference`
    Create {
        reference: String,
        tx_type: TransactionType,
        from: Option<String>,
        to: Option<String>,
        amount: Money,
        description: String,
    },
    /// Process the transaction created under `reference`
    Process { reference: String },
    /// Cancel the transaction created under `reference`
    Cancel { reference: String },
}

impl LedgerCommand {
    pub fn reference(&self) -> &str {
        match self {
            LedgerCommand::Create { reference, .. }
            | LedgerCommand::Process { reference }
            | LedgerCommand::Cancel { reference } => reference,
        }
    }

    /// Account numbers named directly by the command
    pub fn account_numbers(&self) -> Vec<&str> {
        match self {
            LedgerCommand::Create { from, to, .. } => {
                from.iter().chain(to.iter()).map(String::as_str).collect()
            }
            LedgerCommand::Process { .. } | LedgerCommand::Cancel { .. } => Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LedgerCommand::Create { .. } => "create",
            LedgerCommand::Process { .. } => "process",
            LedgerCommand::Cancel { .. } => "cancel",
        }
    }
}

/// Account to open before replaying commands
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSeed {
    pub number: String,
    pub holder_name: String,
    pub balance: Money,
    pub status: AccountStatus,
}
