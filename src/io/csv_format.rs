//! CSV format handling for replay input and ledger output
//!
//! This module centralizes all CSV format concerns, providing:
//! - Raw row structures for deserialization (commands, account seeds)
//! - Conversion from raw rows to domain types
//! - Account and transaction output serialization
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::{
    Account, AccountSeed, AccountStatus, Currency, LedgerCommand, LedgerError, Money,
    Transaction, TransactionType,
};
use serde::Deserialize;
use std::io::Write;

/// Raw command row: `command,reference,type,from,to,amount,currency,description`
///
/// Every field except `command` and `reference` may be empty; which ones
/// are required depends on the command and is checked by
/// [`convert_command_record`].
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CommandCsvRecord {
    pub command: String,
    pub reference: String,
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub description: Option<String>,
}

/// Raw account seed row: `number,holder,balance,currency,status`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SeedCsvRecord {
    pub number: String,
    pub holder: String,
    pub balance: String,
    pub currency: String,
    pub status: Option<String>,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(field: Option<String>, name: &str, reference: &str) -> Result<String, LedgerError> {
    non_empty(field).ok_or_else(|| {
        LedgerError::validation(format!("{} is required for create '{}'", name, reference))
    })
}

/// Convert a raw command row into a [`LedgerCommand`]
///
/// # Errors
///
/// - `InvalidType` if the transaction type is not deposit, withdraw or
///   transfer
/// - `Validation` for an unknown command, a blank reference, or a missing
///   or malformed amount/currency on `create`
pub fn convert_command_record(record: CommandCsvRecord) -> Result<LedgerCommand, LedgerError> {
    let reference = record.reference.trim().to_string();
    if reference.is_empty() {
        return Err(LedgerError::validation("reference must not be blank"));
    }

    match record.command.trim().to_lowercase().as_str() {
        "create" => {
            let tx_type: TransactionType =
                required(record.tx_type, "type", &reference)?.parse()?;
            let currency: Currency = required(record.currency, "currency", &reference)?.parse()?;
            let amount =
                Money::from_major_str(&required(record.amount, "amount", &reference)?, currency)?;

            Ok(LedgerCommand::Create {
                reference,
                tx_type,
                from: non_empty(record.from),
                to: non_empty(record.to),
                amount,
                description: non_empty(record.description).unwrap_or_default(),
            })
        }
        "process" => Ok(LedgerCommand::Process { reference }),
        "cancel" => Ok(LedgerCommand::Cancel { reference }),
        other => Err(LedgerError::validation(format!(
            "unknown command '{}' for '{}'",
            other, reference
        ))),
    }
}

/// Convert a raw seed row into an [`AccountSeed`]
///
/// A missing status means active.
pub fn convert_seed_record(record: SeedCsvRecord) -> Result<AccountSeed, LedgerError> {
    let currency: Currency = record.currency.parse()?;
    let balance = Money::from_major_str(&record.balance, currency)?;
    let status = match non_empty(record.status) {
        Some(status) => status.parse::<AccountStatus>()?,
        None => AccountStatus::Active,
    };

    Ok(AccountSeed {
        number: record.number.trim().to_string(),
        holder_name: record.holder.trim().to_string(),
        balance,
        status,
    })
}

/// Write accounts as CSV, sorted by number
///
/// Columns: `number,holder,balance,currency,status`. Balances are written in
/// major units with two decimals.
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["number", "holder", "balance", "currency", "status"])?;

    let mut sorted_accounts: Vec<&Account> = accounts.iter().collect();
    sorted_accounts.sort_by(|a, b| a.number().cmp(b.number()));

    for account in sorted_accounts {
        writer.write_record(&[
            account.number().to_string(),
            account.holder_name().to_string(),
            account.balance().to_decimal().to_string(),
            account.balance().currency().to_string(),
            account.status().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write transactions as CSV, sorted by reference
///
/// Columns: `reference,type,status,amount,currency,processed`, where
/// `processed` tells whether `processed_at` is set.
pub fn write_transactions_csv(
    transactions: &[Transaction],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["reference", "type", "status", "amount", "currency", "processed"])?;

    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| a.reference().cmp(&b.reference()));

    for transaction in sorted {
        writer.write_record(&[
            transaction.reference().unwrap_or_default().to_string(),
            transaction.tx_type().to_string(),
            transaction.status().to_string(),
            transaction.amount().to_decimal().to_string(),
            transaction.amount().currency().to_string(),
            transaction.processed_at().is_some().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
