//! Append-only audit log (JSONL)
//!
//! Records are kept in memory for queries and replay. A file-backed log also
//! appends each batch to disk and flushes before the batch becomes visible.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::AuditResult;
use crate::event::{AuditEvent, AuditRecord};
use crate::hash::{calculate_record_hash, verify_chain, GENESIS_HASH};

/// Destination for committed audit events.
///
/// `append_batch` is all-or-nothing: when it returns an error none of the
/// events are visible through `records`.
pub trait AuditSink {
    fn append_batch(
        &mut self,
        events: Vec<AuditEvent>,
        timestamp: DateTime<Utc>,
    ) -> AuditResult<Vec<AuditRecord>>;

    fn records(&self) -> &[AuditRecord];
}

pub struct AuditLog {
    path: Option<PathBuf>,
    file: Option<File>,
    records: Vec<AuditRecord>,
}

impl AuditLog {
    /// Log kept only in memory (tests, dry runs)
    pub fn in_memory() -> Self {
        Self {
            path: None,
            file: None,
            records: Vec::new(),
        }
    }

    /// Open (or create) a JSONL log, loading and verifying existing records
    pub fn open(path: impl AsRef<Path>) -> AuditResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let records = if path.exists() {
            trim_torn_tail(&path)?;
            Self::read_file(&path)?
        } else {
            Vec::new()
        };
        verify_chain(&records)?;

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        tracing::debug!(path = %path.display(), records = records.len(), "Audit log opened");

        Ok(Self {
            path: Some(path),
            file: Some(file),
            records,
        })
    }

    /// Read every record of a JSONL file without opening it for writing
    pub fn read_file(path: impl AsRef<Path>) -> AuditResult<Vec<AuditRecord>> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }

        Ok(records)
    }

    pub fn events(&self) -> impl Iterator<Item = &AuditEvent> {
        self.records.iter().map(|r| &r.event)
    }

    /// Records with a sequence greater than `sequence`
    pub fn since(&self, sequence: u64) -> &[AuditRecord] {
        let start = (sequence as usize).min(self.records.len());
        &self.records[start..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last_sequence(&self) -> u64 {
        self.records.last().map_or(0, |r| r.sequence)
    }

    pub fn last_hash(&self) -> &str {
        self.records.last().map_or(GENESIS_HASH, |r| r.hash.as_str())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_in_memory(&self) -> bool {
        self.file.is_none()
    }
}

impl AuditSink for AuditLog {
    fn append_batch(
        &mut self,
        events: Vec<AuditEvent>,
        timestamp: DateTime<Utc>,
    ) -> AuditResult<Vec<AuditRecord>> {
        let mut sequence = self.last_sequence();
        let mut prev_hash = self.last_hash().to_string();
        let mut batch = Vec::with_capacity(events.len());
        let mut lines = String::new();

        for event in events {
            sequence += 1;
            let hash = calculate_record_hash(sequence, &prev_hash, &timestamp, &event)?;
            let record = AuditRecord {
                sequence,
                prev_hash,
                hash: hash.clone(),
                timestamp,
                event,
            };
            lines.push_str(&serde_json::to_string(&record)?);
            lines.push('\n');
            prev_hash = hash;
            batch.push(record);
        }

        if let Some(ref mut file) = self.file {
            write_batch(file, lines.as_bytes())?;
        }

        self.records.extend(batch.iter().cloned());
        Ok(batch)
    }

    fn records(&self) -> &[AuditRecord] {
        &self.records
    }
}

/// Where a batch of lines is written; can be cut back after a failed write
trait BatchTarget: Write {
    fn size(&self) -> io::Result<u64>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl BatchTarget for File {
    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Write a whole batch in one go. On failure the target is cut back to its
/// previous length so no fragment is left for the next batch to follow.
fn write_batch<T: BatchTarget>(target: &mut T, bytes: &[u8]) -> io::Result<()> {
    let len = target.size()?;
    let written = target.write_all(bytes).and_then(|()| target.flush());
    if let Err(e) = written {
        if let Err(cut) = target.truncate(len) {
            tracing::error!(error = %cut, len, "Partial audit batch could not be removed");
        }
        return Err(e);
    }
    Ok(())
}

/// Drop an unterminated last line left by a crash mid-write
fn trim_torn_tail(path: &Path) -> io::Result<()> {
    let content = fs::read(path)?;
    let keep = content
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |pos| pos + 1);

    if keep < content.len() {
        tracing::warn!(
            path = %path.display(),
            dropped = content.len() - keep,
            "Discarding unterminated audit line"
        );
        OpenOptions::new().write(true).open(path)?.set_len(keep as u64)?;
    }
    Ok(())
}
