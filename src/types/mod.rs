//! Types module
//!
//! Contains the domain entities used throughout the ledger.
//! This module organizes types into logical submodules:
//! - `money`: Money value type and currencies
//! - `account`: Account entity and status
//! - `transaction`: Transaction entity, types and state machine
//! - `page`: Pagination request/response
//! - `command`: Replay commands and account seeds
//! - `error`: Error types for the ledger engine

pub mod account;
pub mod command;
pub mod error;
pub mod money;
pub mod page;
pub mod transaction;

pub use account::{Account, AccountId, AccountStatus};
pub use command::{AccountSeed, LedgerCommand};
pub use error::LedgerError;
pub use money::{Currency, Money};
pub use page::{Page, PageRequest};
pub use transaction::{Transaction, TransactionId, TransactionStatus, TransactionType};

use chrono::{DateTime, Duration, Utc};

/// Next modification timestamp, strictly later than `previous`
///
/// Wall clock reads can repeat (or step backwards); entity timestamps must not.
pub(crate) fn touch(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::nanoseconds(1)
    }
}
