//! Audit log errors

use thiserror::Error;

use crate::hash::ChainError;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupted audit log: {0}")]
    Corrupted(#[from] ChainError),
}

pub type AuditResult<T> = Result<T, AuditError>;
