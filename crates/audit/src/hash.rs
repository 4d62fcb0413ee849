//! Hash chain over audit records

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::event::{AuditEvent, AuditRecord};

/// `prev_hash` of the first record
pub const GENESIS_HASH: &str = "GENESIS";

/// SHA-256 over everything in the record except the hash itself
pub fn calculate_record_hash(
    sequence: u64,
    prev_hash: &str,
    timestamp: &DateTime<Utc>,
    event: &AuditEvent,
) -> Result<String, serde_json::Error> {
    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(timestamp.to_rfc3339().as_bytes());
    hasher.update(serde_json::to_string(event)?.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("Broken link at seq {sequence}: expected prev_hash '{expected}', got '{actual}'")]
    BrokenLink {
        sequence: u64,
        expected: String,
        actual: String,
    },

    #[error("Invalid hash at seq {sequence}: expected '{expected}', got '{actual}'")]
    InvalidHash {
        sequence: u64,
        expected: String,
        actual: String,
    },

    #[error("Invalid sequence: expected {expected}, got {actual}")]
    InvalidSequence { expected: u64, actual: u64 },

    #[error("Unhashable event at seq {0}")]
    Unhashable(u64),
}

/// Check links, hashes and sequence contiguity (sequences start at 1)
pub fn verify_chain(records: &[AuditRecord]) -> Result<(), ChainError> {
    let mut prev_hash = GENESIS_HASH.to_string();

    for (i, record) in records.iter().enumerate() {
        let expected_seq = i as u64 + 1;
        if record.sequence != expected_seq {
            return Err(ChainError::InvalidSequence {
                expected: expected_seq,
                actual: record.sequence,
            });
        }

        if record.prev_hash != prev_hash {
            return Err(ChainError::BrokenLink {
                sequence: record.sequence,
                expected: prev_hash,
                actual: record.prev_hash.clone(),
            });
        }

        let calculated =
            calculate_record_hash(record.sequence, &record.prev_hash, &record.timestamp, &record.event)
                .map_err(|_| ChainError::Unhashable(record.sequence))?;
        if record.hash != calculated {
            return Err(ChainError::InvalidHash {
                sequence: record.sequence,
                expected: calculated,
                actual: record.hash.clone(),
            });
        }

        prev_hash = record.hash.clone();
    }

    Ok(())
}
