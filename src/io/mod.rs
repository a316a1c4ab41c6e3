//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV row layouts, row conversion and output serialization
//! - `sync_reader` - Synchronous command reader with iterator interface, seed loader
//! - `async_reader` - Asynchronous command reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_command_record, convert_seed_record, write_accounts_csv, write_transactions_csv,
    CommandCsvRecord, SeedCsvRecord,
};
pub use sync_reader::{read_account_seeds, SyncReader};
