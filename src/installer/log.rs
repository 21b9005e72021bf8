//! Transaction log: a line-delimited, append-only history of every
//! install/remove/update/upgrade attempt. A history, not a control store —
//! readers tolerate and skip malformed lines.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::{instrument, warn};

use crate::Result;
use crate::types::TransactionRecord;

/// Append-only handle to `{log_dir}/transactions.log`.
pub struct TransactionLog {
    path: PathBuf,
}

impl TransactionLog {
    /// What: Open (or create) the transaction log directory.
    ///
    /// Inputs:
    /// - `log_dir`: directory holding `transactions.log`.
    ///
    /// Output: `Ok(TransactionLog)`.
    pub fn open(log_dir: impl AsRef<Path>) -> Result<Self> {
        let log_dir = log_dir.as_ref();
        std::fs::create_dir_all(log_dir)?;
        Ok(Self { path: log_dir.join("transactions.log") })
    }

    /// What: Append one full record to the log, flushing before returning.
    ///
    /// Inputs:
    /// - `record`: the transaction record to persist.
    ///
    /// Output: `Ok(())` once the line is written and flushed.
    ///
    /// Details:
    /// - Every status transition writes a full record rather than patching
    ///   one in place; the log is append-only by construction.
    #[instrument(skip(self, record), fields(id = %record.id, status = ?record.status))]
    pub fn append(&self, record: &TransactionRecord) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }

    /// What: Replay the log, keeping the latest record per transaction id.
    ///
    /// Inputs: none.
    ///
    /// Output:
    /// - `Ok(records)` sorted ascending by `id` (which sorts in timestamp
    ///   order). Lines that fail to parse as JSON are skipped with a
    ///   `tracing::warn!`, not treated as fatal.
    /// - Returns an empty vector if the log file does not yet exist.
    pub fn replay(&self) -> Result<Vec<TransactionRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut latest: HashMap<String, TransactionRecord> = HashMap::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TransactionRecord>(&line) {
                Ok(record) => {
                    latest.insert(record.id.clone(), record);
                }
                Err(err) => {
                    warn!(line = line_no + 1, error = %err, "skipping malformed transaction log line");
                }
            }
        }

        let mut records: Vec<_> = latest.into_values().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    /// What: Replay the log and return only the most recent `limit`
    /// transactions.
    ///
    /// Inputs:
    /// - `limit`: maximum number of transactions to return, most recent
    ///   last.
    ///
    /// Output: `Ok(records)`, at most `limit` entries.
    pub fn tail(&self, limit: usize) -> Result<Vec<TransactionRecord>> {
        let mut records = self.replay()?;
        if records.len() > limit {
            records = records.split_off(records.len() - limit);
        }
        Ok(records)
    }
}
