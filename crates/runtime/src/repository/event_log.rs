//! Append-only JSON-lines event log.
//!
//! One engine event per line:
//! ```text
//! {"sequence":0,"clock_ms":1000,"event":{"HolderApplied":{...}}}
//! {"sequence":1,"clock_ms":1000,"event":{"AuraSlotUpdate":{...}}}
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use spell_core::SpellEvent;

use crate::repository::{RepositoryError, Result};

/// One decoded log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub sequence: u64,
    pub clock_ms: u64,
    pub event: SpellEvent,
}

#[derive(Serialize)]
struct EntryRef<'a> {
    sequence: u64,
    clock_ms: u64,
    event: &'a SpellEvent,
}

/// Writer half of the event log.
pub struct JsonEventLog {
    path: PathBuf,
    writer: BufWriter<File>,
    next_sequence: u64,
}

impl JsonEventLog {
    /// Create a new log file.
    ///
    /// # Errors
    ///
    /// Returns error if the file already exists (prevents accidental overwrites).
    pub fn create(base_dir: impl AsRef<Path>, filename: impl AsRef<str>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        std::fs::create_dir_all(base_dir)?;

        let path = base_dir.join(filename.as_ref());
        if path.exists() {
            return Err(RepositoryError::LogAlreadyExists(
                path.display().to_string(),
            ));
        }

        let file = OpenOptions::new().create_new(true).write(true).open(&path)?;
        tracing::debug!("Created event log: {}", path.display());

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            next_sequence: 0,
        })
    }

    /// Appends one event and returns its sequence number.
    pub fn append(&mut self, clock_ms: u64, event: &SpellEvent) -> Result<u64> {
        let sequence = self.next_sequence;
        let entry = EntryRef {
            sequence,
            clock_ms,
            event,
        };
        serde_json::to_writer(&mut self.writer, &entry).map_err(|source| {
            RepositoryError::Json {
                line: sequence as usize + 1,
                source,
            }
        })?;
        self.writer.write_all(b"\n")?;
        self.next_sequence += 1;
        Ok(sequence)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of events written so far.
    pub fn len(&self) -> u64 {
        self.next_sequence
    }

    pub fn is_empty(&self) -> bool {
        self.next_sequence == 0
    }

    /// Reads every entry of a log file. Blank lines are skipped.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<EventLogEntry>> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let mut entries = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|source| RepositoryError::Json {
                line: index + 1,
                source,
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }
}

impl Drop for JsonEventLog {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::warn!("Failed to flush event log {}: {}", self.path.display(), e);
        }
    }
}
