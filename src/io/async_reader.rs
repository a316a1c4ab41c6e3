//! Asynchronous CSV reader with batch interface
//!
//! Streams ledger commands from any `futures` `AsyncRead` in batches, for
//! the async replay strategy.
//!
//! # Architecture
//!
//! ```text
//! tokio File → compat → AsyncReader → batches of LedgerCommands
//!                           ↓
//!                    csv_format module
//!          (CommandCsvRecord, convert_command_record)
//! ```

use crate::io::csv_format::{convert_command_record, CommandCsvRecord};
use crate::types::{LedgerCommand, LedgerError};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use std::path::Path;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::warn;

/// Batch reader over a command CSV stream
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line: u64,
    skipped: usize,
}

impl AsyncReader<Compat<tokio::fs::File>> {
    /// Open a command CSV file with tokio's file API
    ///
    /// # Errors
    ///
    /// `FileNotFound` if the file does not exist, `Io` if it cannot be opened.
    pub async fn open(path: &Path) -> Result<Self, LedgerError> {
        let file = tokio::fs::File::open(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LedgerError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => LedgerError::from(e),
        })?;

        Ok(Self::new(file.compat()))
    }
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line: 1,
            skipped: 0,
        }
    }

    /// Read up to `batch_size` valid commands
    ///
    /// Rows that fail to parse are logged with their line and skipped; they
    /// do not count toward the batch size. An empty batch means end of input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<LedgerCommand> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CommandCsvRecord>();

        while batch.len() < batch_size {
            let Some(record) = records.next().await else {
                break;
            };
            self.line += 1;

            match record.map_err(LedgerError::from).and_then(convert_command_record) {
                Ok(command) => batch.push(command),
                Err(e) => {
                    warn!(line = self.line, error = %e, "skipping command row");
                    self.skipped += 1;
                }
            }
        }

        batch
    }

    /// Rows skipped so far because they could not be parsed
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
