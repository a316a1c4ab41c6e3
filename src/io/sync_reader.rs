//! Synchronous CSV readers
//!
//! `SyncReader` streams ledger commands from a CSV file one row at a time;
//! `read_account_seeds` loads the (small) account seed file eagerly.
//! Conversion of raw rows is delegated to the csv_format module.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual row errors are yielded as `Err` items; the caller decides
//!   whether to skip them
//! - `line()` reports the file line of the row last yielded

use crate::io::csv_format::{
    convert_command_record, convert_seed_record, CommandCsvRecord, SeedCsvRecord,
};
use crate::types::{AccountSeed, LedgerCommand, LedgerError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;
use tracing::warn;

/// Open `path`, reporting a missing file as `FileNotFound`
pub(crate) fn open_input(path: &Path) -> Result<File, LedgerError> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LedgerError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => LedgerError::from(e),
    })
}

fn csv_reader(file: File) -> csv::Reader<File> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .buffer_capacity(8 * 1024)
        .from_reader(file)
}

/// Streaming iterator over the commands of a CSV file
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line: u64,
}

impl SyncReader {
    /// Open a command CSV file
    ///
    /// # Errors
    ///
    /// `FileNotFound` if the file does not exist, `Io` if it cannot be opened.
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        Ok(Self {
            reader: csv_reader(open_input(path)?),
            line: 1,
        })
    }

    /// File line of the row last yielded (the header is line 1)
    pub fn line(&self) -> u64 {
        self.line
    }
}

impl Iterator for SyncReader {
    type Item = Result<LedgerCommand, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.reader.deserialize::<CommandCsvRecord>().next()?;
        self.line += 1;

        Some(next.map_err(LedgerError::from).and_then(convert_command_record))
    }
}

/// Load every account seed from `path`
///
/// Rows that fail to parse are logged and skipped.
///
/// # Errors
///
/// `FileNotFound` if the file does not exist, `Io` if it cannot be opened.
pub fn read_account_seeds(path: &Path) -> Result<Vec<AccountSeed>, LedgerError> {
    let mut reader = csv_reader(open_input(path)?);
    let mut seeds = Vec::new();

    for record in reader.deserialize::<SeedCsvRecord>() {
        match record.map_err(LedgerError::from).and_then(convert_seed_record) {
            Ok(seed) => seeds.push(seed),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping account seed"),
        }
    }

    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountStatus, Currency, Money};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    const HEADER: &str = "command,reference,type,from,to,amount,currency,description\n";

    #[test]
    fn test_sync_reader_yields_commands_in_order() {
        let file = create_temp_csv(&format!(
            "{}create,W1,withdraw,ACC-001,,30.00,USD,atm\nprocess,W1,,,,,,\ncancel,W1\n",
            HEADER
        ));

        let commands: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .map(|result| result.unwrap())
            .collect();

        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0].name(), "create");
        assert_eq!(
            commands[1],
            LedgerCommand::Process {
                reference: "W1".to_string()
            }
        );
        assert_eq!(commands[2].name(), "cancel");
    }

    #[test]
    fn test_sync_reader_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"));
        assert!(matches!(result, Err(LedgerError::FileNotFound { .. })));
    }

    #[test]
    fn test_sync_reader_reports_bad_rows_and_continues() {
        let file = create_temp_csv(&format!(
            "{}create,R1,refund,ACC-001,,1.00,USD,\nprocess,W1\n",
            HEADER
        ));
        let mut reader = SyncReader::new(file.path()).unwrap();

        assert!(matches!(
            reader.next(),
            Some(Err(LedgerError::InvalidType { .. }))
        ));
        assert_eq!(reader.line(), 2);
        assert!(matches!(reader.next(), Some(Ok(LedgerCommand::Process { .. }))));
        assert_eq!(reader.line(), 3);
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_sync_reader_header_only() {
        let file = create_temp_csv(HEADER);
        assert_eq!(SyncReader::new(file.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_read_account_seeds_skips_bad_rows() {
        let file = create_temp_csv(
            "number,holder,balance,currency,status\n\
             ACC-001,Alice,100.00,USD,active\n\
             ACC-002,Bob,abc,USD,active\n\
             ACC-003,Carol,5,THB,blocked\n",
        );

        let seeds = read_account_seeds(file.path()).unwrap();

        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].number, "ACC-001");
        assert_eq!(seeds[0].balance, Money::new(10000, Currency::Usd));
        assert_eq!(seeds[1].status, AccountStatus::Blocked);
    }
}
